use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a statement as supplied by the pool.
///
/// Pools may use numeric or textual ids; both are normalized to their string form.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatementId(String);

impl StatementId {
    /// Creates a new `StatementId`
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the underlying string value
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for StatementId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for StatementId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for StatementId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl fmt::Debug for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StatementId({})", self.0)
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
