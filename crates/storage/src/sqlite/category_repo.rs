use trivia_core::model::{Category, CategoryId, CategoryName};

use super::mapping::{category_id_from_i64, id_to_i64, map_category_row};
use super::{SqliteRepository, map_read_error, map_write_error};
use crate::repository::{CategoryRepository, StorageError};

#[async_trait::async_trait]
impl CategoryRepository for SqliteRepository {
    async fn insert_category(&self, name: &CategoryName) -> Result<Category, StorageError> {
        let res = sqlx::query("INSERT INTO categories (name) VALUES (?1)")
            .bind(name.as_str())
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        let id = category_id_from_i64(res.last_insert_rowid())?;
        Ok(Category::new(id, name.clone()))
    }

    async fn rename_category(
        &self,
        id: CategoryId,
        name: &CategoryName,
    ) -> Result<Category, StorageError> {
        let res = sqlx::query("UPDATE categories SET name = ?1 WHERE id = ?2")
            .bind(name.as_str())
            .bind(id_to_i64("category_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(Category::new(id, name.clone()))
    }

    async fn delete_category(&self, id: CategoryId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM categories WHERE id = ?1")
            .bind(id_to_i64("category_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn get_category(&self, id: CategoryId) -> Result<Option<Category>, StorageError> {
        let row = sqlx::query("SELECT id, name FROM categories WHERE id = ?1")
            .bind(id_to_i64("category_id", id.value())?)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_read_error)?;

        row.as_ref().map(map_category_row).transpose()
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StorageError> {
        let rows = sqlx::query("SELECT id, name FROM categories ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await
            .map_err(map_read_error)?;

        rows.iter().map(map_category_row).collect()
    }
}
