use std::fmt;

use thiserror::Error;

use crate::model::config::SessionConfig;
use crate::model::ticket::{MarkOutcome, RevealOutcome, Ticket, TicketError};

//
// ─── PHASE ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionPhase {
    #[default]
    Idle,
    Active,
    Finished,
}

impl SessionPhase {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Active => "active",
            Self::Finished => "finished",
        }
    }

    /// Parse the persisted form produced by `as_str`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "idle" => Some(Self::Idle),
            "active" => Some(Self::Active),
            "finished" => Some(Self::Finished),
            _ => None,
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Rejected state-machine operation. The session is unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("cannot {operation} while session is {phase}")]
    WrongPhase {
        operation: &'static str,
        phase: SessionPhase,
    },

    #[error("a session needs at least one ticket")]
    NoTickets,

    #[error(transparent)]
    Ticket(#[from] TicketError),
}

/// Persisted session state that violates a session invariant.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("{phase} session must have tickets")]
    MissingTickets { phase: SessionPhase },

    #[error("idle session must not carry progress")]
    IdleWithProgress,

    #[error("current ticket index {index} out of range for {len} ticket(s)")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("ticket {index} reveal status does not match session progress")]
    ProgressMismatch { index: usize },

    #[error("running score {stored} does not match revealed tickets ({computed})")]
    ScoreMismatch { stored: u32, computed: u32 },

    #[error("total possible {stored} does not match tickets ({computed})")]
    TotalMismatch { stored: u32, computed: u32 },

    #[error("ticket {index}: {source}")]
    Ticket {
        index: usize,
        #[source]
        source: TicketError,
    },
}

/// What a successful `Session::advance` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvanceOutcome {
    /// The current ticket was revealed and its score added to the running score.
    Revealed { score: u32 },
    /// Moved on to the ticket at `index`.
    NextTicket { index: usize },
    /// The last ticket was left; the session is finished.
    Finished { running_score: u32 },
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One practice run: the ordered tickets plus aggregate progress.
///
/// Only the transition methods mutate a session, and each of them either
/// applies completely or returns an error leaving the session untouched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    phase: SessionPhase,
    tickets: Vec<Ticket>,
    current_ticket_index: usize,
    running_score: u32,
    total_possible: u32,
}

impl Session {
    /// Empty session waiting to be started.
    #[must_use]
    pub fn idle(config: &SessionConfig) -> Self {
        Self {
            phase: SessionPhase::Idle,
            tickets: Vec::new(),
            current_ticket_index: 0,
            running_score: 0,
            total_possible: config.total_possible(),
        }
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError` if phase, index, counters and tickets disagree.
    pub fn from_persisted(
        phase: SessionPhase,
        tickets: Vec<Ticket>,
        current_ticket_index: usize,
        running_score: u32,
        total_possible: u32,
    ) -> Result<Self, SessionStateError> {
        let session = Self {
            phase,
            tickets,
            current_ticket_index,
            running_score,
            total_possible,
        };
        session.validate()?;
        Ok(session)
    }

    fn validate(&self) -> Result<(), SessionStateError> {
        let len = self.tickets.len();
        if self.phase == SessionPhase::Idle {
            if len > 0 || self.current_ticket_index != 0 || self.running_score != 0 {
                return Err(SessionStateError::IdleWithProgress);
            }
            return Ok(());
        }

        if len == 0 {
            return Err(SessionStateError::MissingTickets { phase: self.phase });
        }
        if self.current_ticket_index >= len {
            return Err(SessionStateError::IndexOutOfRange {
                index: self.current_ticket_index,
                len,
            });
        }

        for (index, ticket) in self.tickets.iter().enumerate() {
            let expect_revealed = match self.phase {
                SessionPhase::Finished => Some(true),
                _ if index < self.current_ticket_index => Some(true),
                _ if index > self.current_ticket_index => Some(false),
                _ => None,
            };
            if expect_revealed.is_some_and(|expected| expected != ticket.is_revealed()) {
                return Err(SessionStateError::ProgressMismatch { index });
            }
        }
        if self.phase == SessionPhase::Finished && self.current_ticket_index != len - 1 {
            return Err(SessionStateError::IndexOutOfRange {
                index: self.current_ticket_index,
                len,
            });
        }

        let computed = self.revealed_score();
        if computed != self.running_score {
            return Err(SessionStateError::ScoreMismatch {
                stored: self.running_score,
                computed,
            });
        }
        let computed = statement_total(&self.tickets);
        if computed != self.total_possible {
            return Err(SessionStateError::TotalMismatch {
                stored: self.total_possible,
                computed,
            });
        }
        Ok(())
    }

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    #[must_use]
    pub fn ticket_count(&self) -> usize {
        self.tickets.len()
    }

    #[must_use]
    pub fn current_ticket_index(&self) -> usize {
        self.current_ticket_index
    }

    /// The ticket being played, only while the session is active.
    #[must_use]
    pub fn current_ticket(&self) -> Option<&Ticket> {
        match self.phase {
            SessionPhase::Active => self.tickets.get(self.current_ticket_index),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_last_ticket(&self) -> bool {
        self.current_ticket_index + 1 >= self.tickets.len()
    }

    #[must_use]
    pub fn running_score(&self) -> u32 {
        self.running_score
    }

    #[must_use]
    pub fn total_possible(&self) -> u32 {
        self.total_possible
    }

    /// Number of revealed tickets where every statement was judged correctly.
    #[must_use]
    pub fn perfect_ticket_count(&self) -> usize {
        self.tickets
            .iter()
            .filter(|t| t.score().is_some_and(|s| usize::try_from(s).ok() == Some(t.len())))
            .count()
    }

    /// Install freshly generated tickets and enter the active phase.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::WrongPhase` while a session is active, or
    /// `TransitionError::NoTickets` for an empty ticket list.
    pub fn start(&mut self, tickets: Vec<Ticket>) -> Result<(), TransitionError> {
        if self.phase == SessionPhase::Active {
            return Err(TransitionError::WrongPhase {
                operation: "start",
                phase: self.phase,
            });
        }
        if tickets.is_empty() {
            return Err(TransitionError::NoTickets);
        }

        self.total_possible = statement_total(&tickets);
        self.tickets = tickets;
        self.current_ticket_index = 0;
        self.running_score = 0;
        self.phase = SessionPhase::Active;
        Ok(())
    }

    /// Toggle a mark on the current ticket.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::WrongPhase` outside the active phase, or the
    /// ticket's rejection wrapped in `TransitionError::Ticket`.
    pub fn toggle_selection(&mut self, index: usize) -> Result<MarkOutcome, TransitionError> {
        let ticket = self.current_ticket_mut("toggle a selection")?;
        Ok(ticket.mark(index)?)
    }

    /// Reveal the current ticket, or move past it once revealed.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError::WrongPhase` outside the active phase, or
    /// `TicketError::NotReady` (wrapped) when revealing an incomplete ticket.
    pub fn advance(&mut self) -> Result<AdvanceOutcome, TransitionError> {
        let ticket = self.current_ticket_mut("advance")?;

        if !ticket.is_revealed() {
            return match ticket.reveal()? {
                RevealOutcome::Revealed { score } => {
                    self.running_score = self.running_score.saturating_add(score);
                    Ok(AdvanceOutcome::Revealed { score })
                }
                // unreachable for an unrevealed ticket, but never counted twice
                RevealOutcome::AlreadyRevealed { score } => Ok(AdvanceOutcome::Revealed { score }),
            };
        }

        if self.is_last_ticket() {
            self.phase = SessionPhase::Finished;
            return Ok(AdvanceOutcome::Finished {
                running_score: self.running_score,
            });
        }
        self.current_ticket_index += 1;
        Ok(AdvanceOutcome::NextTicket {
            index: self.current_ticket_index,
        })
    }

    /// Return to an empty idle session sized by `config`. Allowed from every phase.
    pub fn reset(&mut self, config: &SessionConfig) {
        self.phase = SessionPhase::Idle;
        self.tickets.clear();
        self.current_ticket_index = 0;
        self.running_score = 0;
        self.total_possible = config.total_possible();
    }

    fn current_ticket_mut(&mut self, operation: &'static str) -> Result<&mut Ticket, TransitionError> {
        let phase = self.phase;
        let wrong_phase = TransitionError::WrongPhase { operation, phase };
        if phase != SessionPhase::Active {
            return Err(wrong_phase);
        }
        self.tickets
            .get_mut(self.current_ticket_index)
            .ok_or(wrong_phase)
    }

    fn revealed_score(&self) -> u32 {
        self.tickets
            .iter()
            .filter_map(Ticket::score)
            .fold(0_u32, u32::saturating_add)
    }
}

fn statement_total(tickets: &[Ticket]) -> u32 {
    let total: usize = tickets.iter().map(Ticket::len).sum();
    u32::try_from(total).unwrap_or(u32::MAX)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
