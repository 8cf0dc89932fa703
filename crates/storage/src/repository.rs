use async_trait::async_trait;
use quiz_core::model::{PoolRecord, Session};
use std::sync::{Arc, Mutex};
use thiserror::Error;

use crate::snapshot;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("invalid statement pool: {0}")]
    InvalidPool(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Provider of the raw statement pool.
///
/// Records are returned unvalidated; label checks belong to the session builder.
#[async_trait]
pub trait StatementSource: Send + Sync {
    /// Fetch every candidate statement, in provider order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the pool cannot be read or is structurally malformed.
    async fn fetch_pool(&self) -> Result<Vec<PoolRecord>, StorageError>;
}

/// Durable home of the single resumable session snapshot.
#[async_trait]
pub trait SnapshotRepository: Send + Sync {
    /// Overwrite the stored snapshot with `session`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be encoded or written.
    async fn save_snapshot(&self, session: &Session) -> Result<(), StorageError>;

    /// Load the stored snapshot, `None` if nothing was saved yet.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored data is corrupt or
    /// violates a session invariant, or other storage errors.
    async fn load_snapshot(&self) -> Result<Option<Session>, StorageError>;

    /// Remove the stored snapshot, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the snapshot cannot be removed.
    async fn clear_snapshot(&self) -> Result<(), StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Snapshots are kept in their encoded form so the codec is exercised exactly
/// as with a durable backend.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    statements: Arc<Mutex<Vec<PoolRecord>>>,
    snapshot: Arc<Mutex<Option<String>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_statements(records: Vec<PoolRecord>) -> Self {
        Self {
            statements: Arc::new(Mutex::new(records)),
            snapshot: Arc::new(Mutex::new(None)),
        }
    }

    /// Replace the stored snapshot text verbatim, bypassing the encoder.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn put_raw_snapshot(&self, raw: impl Into<String>) -> Result<(), StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        *guard = Some(raw.into());
        Ok(())
    }

    /// The stored snapshot text, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn raw_snapshot(&self) -> Result<Option<String>, StorageError> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl StatementSource for InMemoryRepository {
    async fn fetch_pool(&self) -> Result<Vec<PoolRecord>, StorageError> {
        let guard = self
            .statements
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl SnapshotRepository for InMemoryRepository {
    async fn save_snapshot(&self, session: &Session) -> Result<(), StorageError> {
        let encoded = snapshot::encode(session)?;
        self.put_raw_snapshot(encoded)
    }

    async fn load_snapshot(&self) -> Result<Option<Session>, StorageError> {
        self.raw_snapshot()?
            .map(|raw| snapshot::decode(&raw))
            .transpose()
    }

    async fn clear_snapshot(&self) -> Result<(), StorageError> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.take();
        Ok(())
    }
}

/// Aggregates the pool source and snapshot store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub statements: Arc<dyn StatementSource>,
    pub snapshots: Arc<dyn SnapshotRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory(records: Vec<PoolRecord>) -> Self {
        let repo = InMemoryRepository::with_statements(records);
        let statements: Arc<dyn StatementSource> = Arc::new(repo.clone());
        let snapshots: Arc<dyn SnapshotRepository> = Arc::new(repo);
        Self {
            statements,
            snapshots,
        }
    }

    /// Swap the statement source, keeping the snapshot store.
    #[must_use]
    pub fn with_statement_source(mut self, statements: Arc<dyn StatementSource>) -> Self {
        self.statements = statements;
        self
    }
}
