use std::fmt;
use std::sync::Arc;

use quiz_core::SessionBuilder;
use quiz_core::model::{
    AdvanceOutcome, MarkOutcome, Session, SessionConfig, SessionPhase, TransitionError,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use storage::repository::{SnapshotRepository, StatementSource};

use super::persistence::PersistenceGateway;
use super::view::{ScoreBoard, SessionResult, TicketView};
use crate::error::QuizError;

/// Owns the single practice session and drives it through
/// `idle -> active -> finished`.
///
/// Every accepted operation mutates the session completely and then saves a
/// snapshot. Rejected operations return an error and leave both the session
/// and the snapshot untouched.
pub struct QuizStateMachine {
    builder: SessionBuilder,
    statements: Arc<dyn StatementSource>,
    gateway: PersistenceGateway,
    session: Session,
    rng: StdRng,
}

impl QuizStateMachine {
    /// Create a machine holding a fresh idle session.
    #[must_use]
    pub fn new(
        config: SessionConfig,
        statements: Arc<dyn StatementSource>,
        snapshots: Arc<dyn SnapshotRepository>,
    ) -> Self {
        Self {
            builder: SessionBuilder::new(config),
            statements,
            gateway: PersistenceGateway::new(snapshots, config),
            session: Session::idle(&config),
            rng: StdRng::from_os_rng(),
        }
    }

    /// Create a machine resuming the saved session, falling back to idle.
    pub async fn resume(
        config: SessionConfig,
        statements: Arc<dyn StatementSource>,
        snapshots: Arc<dyn SnapshotRepository>,
    ) -> Self {
        let mut machine = Self::new(config, statements, snapshots);
        match machine.gateway.restore().await {
            Some(session) if session.phase() != SessionPhase::Idle => {
                tracing::info!(
                    phase = %session.phase(),
                    ticket = session.current_ticket_index() + 1,
                    of = session.ticket_count(),
                    "resumed saved session"
                );
                machine.session = session;
            }
            _ => tracing::debug!("no session to resume, starting idle"),
        }
        machine
    }

    /// Use a deterministic random source for ticket generation.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        self.builder.config()
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.session.phase()
    }

    #[must_use]
    pub fn scores(&self) -> ScoreBoard {
        ScoreBoard::from_session(&self.session)
    }

    #[must_use]
    pub fn current_ticket(&self) -> Option<TicketView> {
        TicketView::from_session(&self.session)
    }

    #[must_use]
    pub fn result(&self) -> Option<SessionResult> {
        SessionResult::from_session(&self.session)
    }

    /// Generate a new session and make it active.
    ///
    /// Awaits the statement pool, then builds and installs all tickets in one step.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Transition` while a session is active,
    /// `QuizError::PoolUnavailable` if the pool cannot be fetched, or
    /// `QuizError::Config` if it cannot satisfy the configuration. The session
    /// is unchanged in every error case.
    pub async fn start(&mut self) -> Result<(), QuizError> {
        if self.session.phase() == SessionPhase::Active {
            return Err(TransitionError::WrongPhase {
                operation: "start",
                phase: SessionPhase::Active,
            }
            .into());
        }

        let records = self
            .statements
            .fetch_pool()
            .await
            .map_err(QuizError::PoolUnavailable)?;
        let tickets = self.builder.build(records, &mut self.rng)?;
        self.session.start(tickets)?;

        tracing::info!(
            tickets = self.session.ticket_count(),
            total_possible = self.session.total_possible(),
            "session started"
        );
        self.persist().await;
        Ok(())
    }

    /// Toggle the mark on statement `index` of the current ticket.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Transition` outside the active phase, on a revealed
    /// ticket, for an out-of-range index, or when the quota is already met.
    pub async fn toggle_selection(&mut self, index: usize) -> Result<MarkOutcome, QuizError> {
        let outcome = self.session.toggle_selection(index)?;
        tracing::debug!(
            ticket = self.session.current_ticket_index(),
            index,
            ?outcome,
            "selection toggled"
        );
        self.persist().await;
        Ok(outcome)
    }

    /// Reveal the current ticket, or move past an already revealed one.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::Transition` outside the active phase or when the
    /// current ticket is not ready to be revealed.
    pub async fn advance(&mut self) -> Result<AdvanceOutcome, QuizError> {
        let outcome = self.session.advance()?;
        match outcome {
            AdvanceOutcome::Revealed { score } => tracing::debug!(
                ticket = self.session.current_ticket_index(),
                score,
                running = self.session.running_score(),
                "ticket revealed"
            ),
            AdvanceOutcome::NextTicket { index } => tracing::debug!(ticket = index, "next ticket"),
            AdvanceOutcome::Finished { running_score } => tracing::info!(
                running_score,
                total_possible = self.session.total_possible(),
                "session finished"
            ),
        }
        self.persist().await;
        Ok(outcome)
    }

    /// Drop the current session and return to idle. Allowed in every phase.
    pub async fn reset(&mut self) {
        self.session.reset(self.builder.config());
        tracing::info!("session reset");
        self.persist().await;
    }

    async fn persist(&self) {
        self.gateway.save(&self.session).await;
    }
}

impl fmt::Debug for QuizStateMachine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizStateMachine")
            .field("config", self.builder.config())
            .field("phase", &self.session.phase())
            .field("current", &self.session.current_ticket_index())
            .field("running_score", &self.session.running_score())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
