use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("ticket count must be > 0")]
    InvalidTicketCount,

    #[error("ticket size must be > 0")]
    InvalidTicketSize,

    #[error("true quota minimum must be > 0")]
    ZeroMinimum,

    #[error("true quota minimum ({min}) exceeds maximum ({max})")]
    InvertedQuota { min: u32, max: u32 },

    #[error("true quota maximum ({max}) exceeds ticket size ({ticket_size})")]
    QuotaAboveTicketSize { max: u32, ticket_size: u32 },
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Inclusive range from which each ticket's true quota is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrueQuota {
    min: u32,
    max: u32,
}

impl TrueQuota {
    /// # Errors
    ///
    /// Returns `ConfigError::ZeroMinimum` if `min` is zero, or
    /// `ConfigError::InvertedQuota` if `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self, ConfigError> {
        if min == 0 {
            return Err(ConfigError::ZeroMinimum);
        }
        if min > max {
            return Err(ConfigError::InvertedQuota { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> u32 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> u32 {
        self.max
    }
}

/// Shape of a practice session.
///
/// The defaults are 40 tickets of 3 statements with 1 or 2 true statements each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    ticket_count: u32,
    ticket_size: u32,
    true_quota: TrueQuota,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ticket_count: 40,
            ticket_size: 3,
            true_quota: TrueQuota { min: 1, max: 2 },
        }
    }
}

impl SessionConfig {
    /// Creates a custom session configuration.
    ///
    /// # Errors
    ///
    /// Returns error if a count is zero or the quota does not fit in a ticket.
    pub fn new(ticket_count: u32, ticket_size: u32, true_quota: TrueQuota) -> Result<Self, ConfigError> {
        if ticket_count == 0 {
            return Err(ConfigError::InvalidTicketCount);
        }
        if ticket_size == 0 {
            return Err(ConfigError::InvalidTicketSize);
        }
        if true_quota.max > ticket_size {
            return Err(ConfigError::QuotaAboveTicketSize {
                max: true_quota.max,
                ticket_size,
            });
        }
        Ok(Self {
            ticket_count,
            ticket_size,
            true_quota,
        })
    }

    #[must_use]
    pub fn ticket_count(&self) -> u32 {
        self.ticket_count
    }

    #[must_use]
    pub fn ticket_size(&self) -> u32 {
        self.ticket_size
    }

    #[must_use]
    pub fn true_quota(&self) -> TrueQuota {
        self.true_quota
    }

    /// Maximum attainable score, `ticket_count * ticket_size`.
    #[must_use]
    pub fn total_possible(&self) -> u32 {
        self.ticket_count.saturating_mul(self.ticket_size)
    }
}
