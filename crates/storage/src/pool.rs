use std::path::{Path, PathBuf};

use async_trait::async_trait;
use quiz_core::model::{PoolRecord, StatementId};
use serde_json::Value;

use crate::repository::{StatementSource, StorageError};

/// Statement pool stored as a JSON array of `{ "id", "text", "isTrue" }` objects.
///
/// The file is re-read on every fetch so edits are picked up by the next session.
#[derive(Debug, Clone)]
pub struct JsonFilePool {
    path: PathBuf,
}

impl JsonFilePool {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl StatementSource for JsonFilePool {
    async fn fetch_pool(&self) -> Result<Vec<PoolRecord>, StorageError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| StorageError::Io(format!("{}: {e}", self.path.display())))?;
        let records = parse_pool_json(&raw)?;
        tracing::debug!(path = %self.path.display(), count = records.len(), "statement pool loaded");
        Ok(records)
    }
}

/// Parse a JSON statement pool.
///
/// Ids may be strings or integers. A missing or non-string `text` reads as empty.
/// A missing or non-boolean `isTrue` yields an unlabeled record, which the
/// session builder rejects as a configuration error.
///
/// # Errors
///
/// Returns `StorageError::InvalidPool` if the document is not an array of
/// objects with an `id`.
pub fn parse_pool_json(raw: &str) -> Result<Vec<PoolRecord>, StorageError> {
    let document: Value =
        serde_json::from_str(raw).map_err(|e| StorageError::InvalidPool(e.to_string()))?;
    let Value::Array(items) = document else {
        return Err(StorageError::InvalidPool(
            "expected a JSON array of statements".into(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| parse_record(index, item))
        .collect()
}

fn parse_record(index: usize, item: Value) -> Result<PoolRecord, StorageError> {
    let invalid = |what: &str| StorageError::InvalidPool(format!("record #{index}: {what}"));

    let Value::Object(mut fields) = item else {
        return Err(invalid("expected an object"));
    };
    let id = match fields.remove("id") {
        Some(Value::String(id)) => StatementId::new(id),
        Some(Value::Number(id)) => StatementId::new(id.to_string()),
        _ => return Err(invalid("missing string or integer id")),
    };
    let text = match fields.remove("text") {
        Some(Value::String(text)) => text,
        _ => String::new(),
    };
    let is_true = match fields.remove("isTrue") {
        Some(Value::Bool(label)) => Some(label),
        _ => None,
    };

    Ok(PoolRecord { id, text, is_true })
}
