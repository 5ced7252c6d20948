use trivia_core::model::UserId;

/// The signed-in player, as handed over by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Viewer {
    user_id: UserId,
    email: String,
}

impl Viewer {
    #[must_use]
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into().trim().to_owned(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }
}
