use async_trait::async_trait;
use chrono::Utc;
use quiz_core::model::Session;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{SnapshotRepository, StorageError};
use crate::snapshot::{self, SNAPSHOT_KEY, SessionRecord};

#[async_trait]
impl SnapshotRepository for SqliteRepository {
    async fn save_snapshot(&self, session: &Session) -> Result<(), StorageError> {
        let saved_at = Utc::now();
        let payload =
            serde_json::to_string(&SessionRecord::from_session(session, saved_at)).map_err(ser)?;

        sqlx::query(
            r"
            INSERT INTO snapshots (name, payload, saved_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(name) DO UPDATE SET
                payload = excluded.payload,
                saved_at = excluded.saved_at
            ",
        )
        .bind(SNAPSHOT_KEY)
        .bind(payload)
        .bind(saved_at)
        .execute(&self.pool)
        .await
        .map_err(conn)?;

        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<Session>, StorageError> {
        let row = sqlx::query("SELECT payload FROM snapshots WHERE name = ?1")
            .bind(SNAPSHOT_KEY)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(None);
        };
        let payload: String = row.try_get("payload").map_err(ser)?;
        snapshot::decode(&payload).map(Some)
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM snapshots WHERE name = ?1")
            .bind(SNAPSHOT_KEY)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
