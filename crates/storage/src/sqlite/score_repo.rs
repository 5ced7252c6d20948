use trivia_core::model::{NewScore, ScoreRecord};

use super::mapping::{id_to_i64, map_score_row, score_id_from_i64};
use super::{SqliteRepository, map_read_error, map_write_error};
use crate::repository::{ScoreFilter, ScoreRepository, StorageError};

#[async_trait::async_trait]
impl ScoreRepository for SqliteRepository {
    async fn append_score(&self, score: &NewScore) -> Result<ScoreRecord, StorageError> {
        let record = score.clone();
        let email = Some(record.user_email().trim())
            .filter(|email| !email.is_empty())
            .map(str::to_owned);

        let res = sqlx::query(
            r"
            INSERT INTO scores (user_id, user_email, category_id, score, total_questions, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ",
        )
        .bind(record.user_id().to_string())
        .bind(email)
        .bind(id_to_i64("category_id", record.category_id().value())?)
        .bind(i64::from(record.score()))
        .bind(i64::from(record.total_questions()))
        .bind(record.created_at())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        let id = score_id_from_i64(res.last_insert_rowid())?;
        Ok(record.into_record(id))
    }

    async fn list_scores(&self, filter: ScoreFilter) -> Result<Vec<ScoreRecord>, StorageError> {
        let category = filter
            .category_id
            .map(|c| id_to_i64("category_id", c.value()))
            .transpose()?;

        let rows = sqlx::query(
            r"
            SELECT id, user_id, user_email, category_id, score, total_questions, created_at
            FROM scores
            WHERE (?1 IS NULL OR user_id = ?1)
              AND (?2 IS NULL OR category_id = ?2)
            ORDER BY id ASC
            ",
        )
        .bind(filter.user_id.map(|u| u.to_string()))
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(map_read_error)?;

        rows.iter().map(map_score_row).collect()
    }
}
