use trivia_core::model::{CategoryId, OptionTag, Question, QuestionId, ValidatedQuestion};

use super::mapping::{id_to_i64, map_question_row, question_id_from_i64};
use super::{SqliteRepository, map_read_error, map_write_error};
use crate::repository::{QuestionRepository, StorageError};

const SELECT_COLUMNS: &str = r"
    SELECT id, category_id, question, option_a, option_b, option_c, option_d, correct_option
    FROM questions
";

#[async_trait::async_trait]
impl QuestionRepository for SqliteRepository {
    async fn insert_question(&self, question: ValidatedQuestion) -> Result<Question, StorageError> {
        let res = sqlx::query(
            r"
            INSERT INTO questions (category_id, question, option_a, option_b, option_c, option_d, correct_option)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(id_to_i64("category_id", question.category_id.value())?)
        .bind(question.text.as_str())
        .bind(question.option(OptionTag::A))
        .bind(question.option(OptionTag::B))
        .bind(question.option(OptionTag::C))
        .bind(question.option(OptionTag::D))
        .bind(question.correct_option.as_str())
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        let id = question_id_from_i64(res.last_insert_rowid())?;
        Ok(question.assign_id(id))
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let res = sqlx::query(
            r"
            UPDATE questions SET
                category_id = ?1,
                question = ?2,
                option_a = ?3,
                option_b = ?4,
                option_c = ?5,
                option_d = ?6,
                correct_option = ?7
            WHERE id = ?8
            ",
        )
        .bind(id_to_i64("category_id", question.category_id().value())?)
        .bind(question.text())
        .bind(question.option(OptionTag::A))
        .bind(question.option(OptionTag::B))
        .bind(question.option(OptionTag::C))
        .bind(question.option(OptionTag::D))
        .bind(question.correct_option().as_str())
        .bind(id_to_i64("question_id", question.id().value())?)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM questions WHERE id = ?1")
            .bind(id_to_i64("question_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn list_questions(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Question>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} WHERE category_id = ?1 ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .bind(id_to_i64("category_id", category_id.value())?)
            .fetch_all(&self.pool)
            .await
            .map_err(map_read_error)?;

        rows.iter().map(map_question_row).collect()
    }

    async fn list_all_questions(&self) -> Result<Vec<Question>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY id ASC");
        let rows = sqlx::query(&sql)
            .fetch_all(&self.pool)
            .await
            .map_err(map_read_error)?;

        rows.iter().map(map_question_row).collect()
    }
}
