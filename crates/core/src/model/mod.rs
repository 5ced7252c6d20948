mod category;
mod ids;
mod question;
mod score;

pub use ids::{CategoryId, ParseIdError, QuestionId, ScoreId, UserId};

pub use category::{Category, CategoryError, CategoryName};
pub use question::{
    OptionTag, ParseOptionTagError, Question, QuestionDraft, QuestionError, ValidatedQuestion,
};
pub use score::{NewScore, ScoreError, ScoreRecord};
