use quiz_core::model::{PoolRecord, StatementId};
use sqlx::Row;

use crate::repository::StorageError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

pub(crate) fn position_to_i64(position: usize) -> Result<i64, StorageError> {
    i64::try_from(position).map_err(|_| StorageError::Serialization("position overflow".into()))
}

pub(crate) fn label_to_i64(label: Option<bool>) -> Option<i64> {
    label.map(i64::from)
}

pub(crate) fn label_from_i64(raw: Option<i64>) -> Result<Option<bool>, StorageError> {
    match raw {
        None => Ok(None),
        Some(0) => Ok(Some(false)),
        Some(1) => Ok(Some(true)),
        Some(other) => Err(StorageError::Serialization(format!(
            "invalid is_true: {other}"
        ))),
    }
}

pub(crate) fn map_statement_row(row: &sqlx::sqlite::SqliteRow) -> Result<PoolRecord, StorageError> {
    let id: String = row.try_get("id").map_err(ser)?;
    let text: String = row.try_get("text").map_err(ser)?;
    let is_true = label_from_i64(row.try_get::<Option<i64>, _>("is_true").map_err(ser)?)?;

    Ok(PoolRecord {
        id: StatementId::new(id),
        text,
        is_true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_round_trips_through_integer() {
        for label in [None, Some(true), Some(false)] {
            assert_eq!(label_from_i64(label_to_i64(label)).unwrap(), label);
        }
        assert!(label_from_i64(Some(2)).is_err());
    }
}
