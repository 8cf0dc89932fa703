use std::collections::HashSet;

use thiserror::Error;

use crate::model::statement::Statement;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TicketError {
    #[error("ticket is already revealed")]
    AlreadyRevealed,

    #[error("selection limit reached: only {required} statement(s) may be marked")]
    QuotaReached { required: u32 },

    #[error("statement index {index} out of range for ticket of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("ticket not ready: {marked} of {required} statement(s) marked")]
    NotReady { marked: u32, required: u32 },

    #[error("invalid persisted ticket: {0}")]
    InvalidPersistedState(String),
}

/// Result of a successful `Ticket::mark` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Marked,
    Unmarked,
}

/// Result of a successful `Ticket::reveal` call.
///
/// Only `Revealed` reports a score that has not been counted before.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Revealed { score: u32 },
    AlreadyRevealed { score: u32 },
}

impl RevealOutcome {
    #[must_use]
    pub fn score(&self) -> u32 {
        match self {
            Self::Revealed { score } | Self::AlreadyRevealed { score } => *score,
        }
    }
}

//
// ─── TICKET ────────────────────────────────────────────────────────────────────
//

/// A group of statements judged together.
///
/// Selections are aligned by index with `statements`. At most `true_required`
/// of them may be marked at any time, and they freeze once the ticket is revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    statements: Vec<Statement>,
    true_required: u32,
    selections: Vec<bool>,
    revealed: bool,
    score: Option<u32>,
}

impl Ticket {
    /// Fresh, unmarked ticket. Callers guarantee unique ids and a fitting quota.
    pub(crate) fn fresh(statements: Vec<Statement>, true_required: u32) -> Self {
        let selections = vec![false; statements.len()];
        Self {
            statements,
            true_required,
            selections,
            revealed: false,
            score: None,
        }
    }

    /// Rehydrate a ticket from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::InvalidPersistedState` if any ticket invariant does not hold,
    /// including a stored score that disagrees with the selections.
    pub fn from_persisted(
        statements: Vec<Statement>,
        true_required: u32,
        selections: Vec<bool>,
        revealed: bool,
        score: Option<u32>,
    ) -> Result<Self, TicketError> {
        let invalid = |msg: &str| TicketError::InvalidPersistedState(msg.to_owned());

        if statements.is_empty() {
            return Err(invalid("ticket has no statements"));
        }
        if selections.len() != statements.len() {
            return Err(invalid("selections do not align with statements"));
        }
        if usize::try_from(true_required).map_or(true, |q| q > statements.len()) {
            return Err(invalid("true quota exceeds ticket size"));
        }
        {
            let mut ids = HashSet::new();
            if !statements.iter().all(|s| ids.insert(s.id())) {
                return Err(invalid("duplicate statement id"));
            }
        }

        let ticket = Self {
            statements,
            true_required,
            selections,
            revealed,
            score,
        };

        if ticket.marked_count() > ticket.true_required {
            return Err(invalid("more statements marked than the quota allows"));
        }
        match (revealed, score) {
            (true, Some(stored)) => {
                if !ticket.is_ready() {
                    return Err(invalid("revealed ticket does not meet its quota"));
                }
                if stored != ticket.compute_score() {
                    return Err(invalid("stored score does not match selections"));
                }
            }
            (true, None) => return Err(invalid("revealed ticket has no score")),
            (false, Some(_)) => return Err(invalid("unrevealed ticket has a score")),
            (false, None) => {}
        }

        Ok(ticket)
    }

    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    #[must_use]
    pub fn selections(&self) -> &[bool] {
        &self.selections
    }

    #[must_use]
    pub fn true_required(&self) -> u32 {
        self.true_required
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    #[must_use]
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    /// `None` until the ticket is revealed.
    #[must_use]
    pub fn score(&self) -> Option<u32> {
        self.score
    }

    #[must_use]
    pub fn marked_count(&self) -> u32 {
        let count = self.selections.iter().filter(|marked| **marked).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// True when exactly `true_required` statements are marked.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.marked_count() == self.true_required
    }

    /// Toggle the mark on the statement at `index`.
    ///
    /// Unmarking is always allowed before reveal; marking is refused once the quota is met.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::AlreadyRevealed`, `TicketError::IndexOutOfRange`, or
    /// `TicketError::QuotaReached`. The ticket is unchanged in every error case.
    pub fn mark(&mut self, index: usize) -> Result<MarkOutcome, TicketError> {
        if self.revealed {
            return Err(TicketError::AlreadyRevealed);
        }
        let len = self.selections.len();
        let marked_count = self.marked_count();
        let Some(slot) = self.selections.get_mut(index) else {
            return Err(TicketError::IndexOutOfRange { index, len });
        };

        if *slot {
            *slot = false;
            return Ok(MarkOutcome::Unmarked);
        }
        if marked_count >= self.true_required {
            return Err(TicketError::QuotaReached {
                required: self.true_required,
            });
        }
        *slot = true;
        Ok(MarkOutcome::Marked)
    }

    /// Freeze selections and compute the score.
    ///
    /// Repeated calls return `RevealOutcome::AlreadyRevealed` with the stored score.
    ///
    /// # Errors
    ///
    /// Returns `TicketError::NotReady` if the ticket is unrevealed and not ready.
    pub fn reveal(&mut self) -> Result<RevealOutcome, TicketError> {
        if let (true, Some(score)) = (self.revealed, self.score) {
            return Ok(RevealOutcome::AlreadyRevealed { score });
        }
        if !self.is_ready() {
            return Err(TicketError::NotReady {
                marked: self.marked_count(),
                required: self.true_required,
            });
        }

        let score = self.compute_score();
        self.score = Some(score);
        self.revealed = true;
        Ok(RevealOutcome::Revealed { score })
    }

    /// Count of statements whose mark agrees with their truth label.
    fn compute_score(&self) -> u32 {
        let correct = self
            .statements
            .iter()
            .zip(&self.selections)
            .filter(|(statement, marked)| **marked == statement.is_true())
            .count();
        u32::try_from(correct).unwrap_or(u32::MAX)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    // [true, false, false] with one true required
    fn one_true_ticket() -> Ticket {
        Ticket::fresh(
            vec![
                Statement::new("t1", "true one", true),
                Statement::new("f1", "false one", false),
                Statement::new("f2", "false two", false),
            ],
            1,
        )
    }

    fn two_true_ticket() -> Ticket {
        Ticket::fresh(
            vec![
                Statement::new("f1", "false one", false),
                Statement::new("t1", "true one", true),
                Statement::new("t2", "true two", true),
            ],
            2,
        )
    }

    #[test]
    fn mark_respects_quota() {
        let mut ticket = one_true_ticket();
        assert_eq!(ticket.mark(1).unwrap(), MarkOutcome::Marked);
        assert_eq!(
            ticket.mark(0).unwrap_err(),
            TicketError::QuotaReached { required: 1 }
        );
        assert_eq!(ticket.selections(), &[false, true, false]);
        assert_eq!(ticket.marked_count(), 1);
    }

    #[test]
    fn unmark_is_always_allowed_before_reveal() {
        let mut ticket = one_true_ticket();
        ticket.mark(2).unwrap();
        assert_eq!(ticket.mark(2).unwrap(), MarkOutcome::Unmarked);
        assert_eq!(ticket.mark(0).unwrap(), MarkOutcome::Marked);
        assert_eq!(ticket.selections(), &[true, false, false]);
    }

    #[test]
    fn marked_count_never_exceeds_quota_for_any_click_sequence() {
        let mut ticket = two_true_ticket();
        for index in [0, 1, 2, 0, 2, 1, 1, 0, 2, 2, 0, 1] {
            let _ = ticket.mark(index);
            assert!(ticket.marked_count() <= ticket.true_required());
        }
    }

    #[test]
    fn mark_out_of_range_is_rejected() {
        let mut ticket = one_true_ticket();
        assert_eq!(
            ticket.mark(3).unwrap_err(),
            TicketError::IndexOutOfRange { index: 3, len: 3 }
        );
    }

    #[test]
    fn reveal_requires_exact_quota() {
        let mut ticket = two_true_ticket();
        ticket.mark(1).unwrap();
        assert!(!ticket.is_ready());
        assert_eq!(
            ticket.reveal().unwrap_err(),
            TicketError::NotReady {
                marked: 1,
                required: 2,
            }
        );
        assert!(!ticket.is_revealed());
        assert_eq!(ticket.score(), None);
    }

    #[test]
    fn reveal_scores_correct_judgements() {
        let mut ticket = two_true_ticket();
        // marks f1 (wrong) and t1 (right); t2 left unmarked (wrong)
        ticket.mark(0).unwrap();
        ticket.mark(1).unwrap();

        assert_eq!(ticket.reveal().unwrap(), RevealOutcome::Revealed { score: 1 });
        assert_eq!(ticket.score(), Some(1));
        assert!(ticket.is_revealed());
    }

    #[test]
    fn perfect_ticket_scores_full_size() {
        let mut ticket = one_true_ticket();
        ticket.mark(0).unwrap();
        assert_eq!(ticket.reveal().unwrap().score(), 3);
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut ticket = one_true_ticket();
        ticket.mark(0).unwrap();
        ticket.reveal().unwrap();

        assert_eq!(
            ticket.reveal().unwrap(),
            RevealOutcome::AlreadyRevealed { score: 3 }
        );
        assert_eq!(ticket.score(), Some(3));
    }

    #[test]
    fn revealed_ticket_rejects_marks() {
        let mut ticket = one_true_ticket();
        ticket.mark(1).unwrap();
        ticket.reveal().unwrap();
        let before = ticket.clone();

        assert_eq!(ticket.mark(1).unwrap_err(), TicketError::AlreadyRevealed);
        assert_eq!(ticket.mark(0).unwrap_err(), TicketError::AlreadyRevealed);
        assert_eq!(ticket, before);
    }

    #[test]
    fn persisted_ticket_round_trips() {
        let mut ticket = two_true_ticket();
        ticket.mark(1).unwrap();
        ticket.mark(2).unwrap();
        ticket.reveal().unwrap();

        let restored = Ticket::from_persisted(
            ticket.statements().to_vec(),
            ticket.true_required(),
            ticket.selections().to_vec(),
            ticket.is_revealed(),
            ticket.score(),
        )
        .unwrap();
        assert_eq!(restored, ticket);
    }

    #[test]
    fn persisted_ticket_rejects_tampered_score() {
        let ticket = one_true_ticket();
        let err = Ticket::from_persisted(
            ticket.statements().to_vec(),
            1,
            vec![true, false, false],
            true,
            Some(2),
        )
        .unwrap_err();
        assert!(matches!(err, TicketError::InvalidPersistedState(_)));
    }

    #[test]
    fn persisted_ticket_rejects_over_marking() {
        let ticket = one_true_ticket();
        let err = Ticket::from_persisted(
            ticket.statements().to_vec(),
            1,
            vec![true, true, false],
            false,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, TicketError::InvalidPersistedState(_)));
    }

    #[test]
    fn persisted_ticket_rejects_misaligned_selections() {
        let ticket = one_true_ticket();
        let err = Ticket::from_persisted(ticket.statements().to_vec(), 1, vec![false], false, None)
            .unwrap_err();
        assert!(matches!(err, TicketError::InvalidPersistedState(_)));
    }
}
