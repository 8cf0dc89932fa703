use std::collections::HashSet;

use thiserror::Error;

use crate::model::ids::StatementId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum PoolError {
    #[error("statement {id} (record #{index}) has no true/false label")]
    MissingLabel { index: usize, id: StatementId },

    #[error("statement id {id} appears more than once in the pool")]
    DuplicateId { id: StatementId },
}

//
// ─── STATEMENTS ────────────────────────────────────────────────────────────────
//

/// A single true/false statement. Immutable once supplied by the pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    id: StatementId,
    text: String,
    is_true: bool,
}

impl Statement {
    #[must_use]
    pub fn new(id: impl Into<StatementId>, text: impl Into<String>, is_true: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_true,
        }
    }

    #[must_use]
    pub fn id(&self) -> &StatementId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn is_true(&self) -> bool {
        self.is_true
    }
}

/// Raw record as delivered by a pool provider, before label validation.
///
/// `is_true` is `None` when the provider found no boolean label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolRecord {
    pub id: StatementId,
    pub text: String,
    pub is_true: Option<bool>,
}

impl PoolRecord {
    #[must_use]
    pub fn labeled(id: impl Into<StatementId>, text: impl Into<String>, is_true: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_true: Some(is_true),
        }
    }

    #[must_use]
    pub fn unlabeled(id: impl Into<StatementId>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_true: None,
        }
    }
}

//
// ─── POOL ──────────────────────────────────────────────────────────────────────
//

/// Validated candidate set, partitioned by truth label.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatementPool {
    trues: Vec<Statement>,
    falses: Vec<Statement>,
}

impl StatementPool {
    /// Validate raw provider records and partition them.
    ///
    /// Every record must carry a label and ids must be unique across the whole pool.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::MissingLabel` for the first unlabeled record, or
    /// `PoolError::DuplicateId` if an id repeats.
    pub fn from_records(records: impl IntoIterator<Item = PoolRecord>) -> Result<Self, PoolError> {
        let mut seen = HashSet::new();
        let mut pool = Self::default();

        for (index, record) in records.into_iter().enumerate() {
            let Some(is_true) = record.is_true else {
                return Err(PoolError::MissingLabel {
                    index,
                    id: record.id,
                });
            };
            if !seen.insert(record.id.clone()) {
                return Err(PoolError::DuplicateId { id: record.id });
            }

            let statement = Statement::new(record.id, record.text, is_true);
            if is_true {
                pool.trues.push(statement);
            } else {
                pool.falses.push(statement);
            }
        }

        Ok(pool)
    }

    #[must_use]
    pub fn true_statements(&self) -> &[Statement] {
        &self.trues
    }

    #[must_use]
    pub fn false_statements(&self) -> &[Statement] {
        &self.falses
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.trues.len() + self.falses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
