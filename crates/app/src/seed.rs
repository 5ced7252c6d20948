use serde::Deserialize;
use services::{AdminError, AdminService};
use trivia_core::model::{OptionTag, QuestionDraft};

#[derive(Debug, Deserialize)]
pub struct SeedFile {
    pub categories: Vec<SeedCategory>,
}

#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub questions: Vec<SeedQuestion>,
}

#[derive(Debug, Deserialize)]
pub struct SeedQuestion {
    pub question: String,
    pub a: String,
    pub b: String,
    pub c: String,
    pub d: String,
    pub correct: OptionTag,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories: usize,
    pub questions: usize,
}

impl SeedFile {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Insert every category and question through the admin surface, so seed data
/// gets the same validation as manual edits.
pub async fn import(admin: &mut AdminService, seed: SeedFile) -> Result<SeedReport, AdminError> {
    let mut report = SeedReport::default();
    for entry in seed.categories {
        let category = admin.create_category(&entry.name).await?;
        report.categories += 1;
        for q in entry.questions {
            admin
                .create_question(QuestionDraft {
                    category_id: Some(category.id()),
                    text: q.question,
                    option_a: q.a,
                    option_b: q.b,
                    option_c: q.c,
                    option_d: q.d,
                    correct_option: q.correct,
                })
                .await?;
            report.questions += 1;
        }
        tracing::debug!(category = %category.name(), "seeded category");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::{AppServices, CallPolicy, Clock};
    use storage::repository::Storage;
    use trivia_core::session::SessionSettings;

    fn admin() -> AdminService {
        AppServices::from_storage(
            Storage::in_memory(),
            Clock::default(),
            SessionSettings::default(),
            CallPolicy::default(),
        )
        .admin()
    }

    #[tokio::test]
    async fn demo_seed_imports_cleanly() {
        let seed = SeedFile::from_json(include_str!("../../../demos/seed.json")).unwrap();
        let mut admin = admin();

        let report = import(&mut admin, seed).await.unwrap();

        assert_eq!(report.categories, 3);
        assert_eq!(report.questions, 13);
        assert_eq!(admin.catalog().questions().len(), 13);
    }

    #[tokio::test]
    async fn blank_option_stops_the_import() {
        let raw = r#"{"categories":[{"name":"Bad","questions":[
            {"question":"Q?","a":"1","b":" ","c":"3","d":"4","correct":"a"}
        ]}]}"#;
        let mut admin = admin();
        let err = import(&mut admin, SeedFile::from_json(raw).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AdminError::Question(_)));
    }

    #[test]
    fn unknown_correct_tag_is_a_parse_error() {
        let raw = r#"{"categories":[{"name":"X","questions":[
            {"question":"Q?","a":"1","b":"2","c":"3","d":"4","correct":"e"}
        ]}]}"#;
        assert!(SeedFile::from_json(raw).is_err());
    }
}
