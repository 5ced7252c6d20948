use std::str::FromStr;

use sqlx::Row;
use sqlx::sqlite::SqliteRow;
use trivia_core::model::{
    Category, CategoryId, CategoryName, OptionTag, Question, QuestionId, ScoreId, ScoreRecord,
    UserId,
};

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

fn i64_to_u32(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

pub(crate) fn category_id_from_i64(v: i64) -> Result<CategoryId, StorageError> {
    Ok(CategoryId::new(i64_to_u64("category_id", v)?))
}

pub(crate) fn question_id_from_i64(v: i64) -> Result<QuestionId, StorageError> {
    Ok(QuestionId::new(i64_to_u64("question_id", v)?))
}

pub(crate) fn score_id_from_i64(v: i64) -> Result<ScoreId, StorageError> {
    Ok(ScoreId::new(i64_to_u64("score_id", v)?))
}

pub(crate) fn map_category_row(row: &SqliteRow) -> Result<Category, StorageError> {
    let id = category_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?;
    let name = CategoryName::new(row.try_get::<String, _>("name").map_err(ser)?).map_err(ser)?;
    Ok(Category::new(id, name))
}

pub(crate) fn map_question_row(row: &SqliteRow) -> Result<Question, StorageError> {
    let correct: String = row.try_get("correct_option").map_err(ser)?;
    let correct = OptionTag::from_str(&correct).map_err(ser)?;

    Question::from_persisted(
        question_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        category_id_from_i64(row.try_get::<i64, _>("category_id").map_err(ser)?)?,
        row.try_get::<String, _>("question").map_err(ser)?,
        [
            row.try_get::<String, _>("option_a").map_err(ser)?,
            row.try_get::<String, _>("option_b").map_err(ser)?,
            row.try_get::<String, _>("option_c").map_err(ser)?,
            row.try_get::<String, _>("option_d").map_err(ser)?,
        ],
        correct,
    )
    .map_err(ser)
}

pub(crate) fn map_score_row(row: &SqliteRow) -> Result<ScoreRecord, StorageError> {
    let user_id = row
        .try_get::<Option<String>, _>("user_id")
        .map_err(ser)?
        .map(|raw| UserId::from_str(&raw).map_err(ser))
        .transpose()?;
    let category_id = row
        .try_get::<Option<i64>, _>("category_id")
        .map_err(ser)?
        .map(category_id_from_i64)
        .transpose()?;

    Ok(ScoreRecord {
        id: score_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        user_id,
        user_email: row.try_get("user_email").map_err(ser)?,
        category_id,
        score: i64_to_u32("score", row.try_get::<i64, _>("score").map_err(ser)?)?,
        total_questions: i64_to_u32(
            "total_questions",
            row.try_get::<i64, _>("total_questions").map_err(ser)?,
        )?,
        created_at: row.try_get("created_at").map_err(ser)?,
    })
}
