use async_trait::async_trait;
use quiz_core::model::PoolRecord;

use super::SqliteRepository;
use super::mapping::{conn, label_to_i64, map_statement_row, position_to_i64};
use crate::repository::{StatementSource, StorageError};

impl SqliteRepository {
    /// Replace the whole statement pool with `records`, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the transaction fails; the previous
    /// pool is left intact in that case.
    pub async fn replace_statements(&self, records: &[PoolRecord]) -> Result<usize, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        sqlx::query("DELETE FROM statements")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;

        for (position, record) in records.iter().enumerate() {
            sqlx::query(
                r"
                INSERT INTO statements (id, position, text, is_true)
                VALUES (?1, ?2, ?3, ?4)
                ",
            )
            .bind(record.id.as_str())
            .bind(position_to_i64(position)?)
            .bind(record.text.as_str())
            .bind(label_to_i64(record.is_true))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        tx.commit().await.map_err(conn)?;
        tracing::info!(count = records.len(), "statement pool replaced");
        Ok(records.len())
    }
}

#[async_trait]
impl StatementSource for SqliteRepository {
    async fn fetch_pool(&self) -> Result<Vec<PoolRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, text, is_true
            FROM statements
            ORDER BY position ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        rows.iter().map(map_statement_row).collect()
    }
}
