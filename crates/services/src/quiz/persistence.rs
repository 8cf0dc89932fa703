use std::sync::Arc;

use quiz_core::model::{Session, SessionConfig, SessionPhase};
use storage::repository::{SnapshotRepository, StorageError};

/// Best-effort bridge between the state machine and the snapshot store.
///
/// The snapshot is local convenience state: write failures are logged and
/// dropped, and anything unreadable restores as "no snapshot".
#[derive(Clone)]
pub struct PersistenceGateway {
    snapshots: Arc<dyn SnapshotRepository>,
    config: SessionConfig,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(snapshots: Arc<dyn SnapshotRepository>, config: SessionConfig) -> Self {
        Self { snapshots, config }
    }

    /// Overwrite the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns the underlying `StorageError`.
    pub async fn try_save(&self, session: &Session) -> Result<(), StorageError> {
        self.snapshots.save_snapshot(session).await
    }

    /// Overwrite the stored snapshot, swallowing failures. Returns whether it was written.
    pub async fn save(&self, session: &Session) -> bool {
        match self.try_save(session).await {
            Ok(()) => true,
            Err(err) => {
                tracing::warn!(error = %err, phase = %session.phase(), "failed to save session snapshot");
                false
            }
        }
    }

    /// Previously saved session, if one exists and is usable.
    ///
    /// Corrupt snapshots and snapshots generated under a different ticket count
    /// are discarded.
    pub async fn restore(&self) -> Option<Session> {
        let session = match self.snapshots.load_snapshot().await {
            Ok(Some(session)) => session,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable session snapshot");
                return None;
            }
        };

        let expected = usize::try_from(self.config.ticket_count()).unwrap_or(usize::MAX);
        if session.phase() != SessionPhase::Idle && session.ticket_count() != expected {
            tracing::warn!(
                stored = session.ticket_count(),
                expected,
                "discarding session snapshot built for a different ticket count"
            );
            return None;
        }
        Some(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::SessionBuilder;
    use quiz_core::model::{PoolRecord, TrueQuota};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use storage::repository::InMemoryRepository;

    fn config(tickets: u32) -> SessionConfig {
        SessionConfig::new(tickets, 3, TrueQuota::new(1, 2).unwrap()).unwrap()
    }

    fn started(tickets: u32) -> Session {
        let records: Vec<_> = (0..3)
            .map(|i| PoolRecord::labeled(format!("t{i}"), "true", true))
            .chain((0..3).map(|i| PoolRecord::labeled(format!("f{i}"), "false", false)))
            .collect();
        let built = SessionBuilder::new(config(tickets))
            .build(records, &mut StdRng::seed_from_u64(1))
            .unwrap();
        let mut session = Session::idle(&config(tickets));
        session.start(built).unwrap();
        session
    }

    #[tokio::test]
    async fn restore_returns_saved_session() {
        let repo = InMemoryRepository::new();
        let gateway = PersistenceGateway::new(Arc::new(repo), config(2));
        let session = started(2);

        assert!(gateway.save(&session).await);
        assert_eq!(gateway.restore().await, Some(session));
    }

    #[tokio::test]
    async fn restore_swallows_corrupt_snapshot() {
        let repo = InMemoryRepository::new();
        repo.put_raw_snapshot("not json at all").unwrap();
        let gateway = PersistenceGateway::new(Arc::new(repo), config(2));

        assert_eq!(gateway.restore().await, None);
    }

    #[tokio::test]
    async fn restore_discards_snapshot_with_other_ticket_count() {
        let repo = InMemoryRepository::new();
        PersistenceGateway::new(Arc::new(repo.clone()), config(2))
            .save(&started(2))
            .await;

        let gateway = PersistenceGateway::new(Arc::new(repo), config(5));
        assert_eq!(gateway.restore().await, None);
    }

    #[tokio::test]
    async fn idle_snapshot_survives_config_change() {
        let repo = InMemoryRepository::new();
        let idle = Session::idle(&config(2));
        PersistenceGateway::new(Arc::new(repo.clone()), config(2))
            .save(&idle)
            .await;

        let gateway = PersistenceGateway::new(Arc::new(repo), config(5));
        assert_eq!(gateway.restore().await, Some(idle));
    }
}
