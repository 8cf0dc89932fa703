mod config;
mod ids;
mod session;
mod statement;
mod ticket;

pub use config::{ConfigError, SessionConfig, TrueQuota};
pub use ids::StatementId;
pub use session::{
    AdvanceOutcome, Session, SessionPhase, SessionStateError, TransitionError,
};
pub use statement::{PoolError, PoolRecord, Statement, StatementPool};
pub use ticket::{MarkOutcome, RevealOutcome, Ticket, TicketError};
