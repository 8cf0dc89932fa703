use quiz_core::model::{Session, SessionPhase, StatementId, Ticket};

/// Running and maximum score, useful for a progress badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreBoard {
    pub running: u32,
    pub total_possible: u32,
}

impl ScoreBoard {
    #[must_use]
    pub fn from_session(session: &Session) -> Self {
        Self {
            running: session.running_score(),
            total_possible: session.total_possible(),
        }
    }
}

/// How the task should be phrased for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prompt {
    /// Exactly one statement is true.
    SelectOne,
    /// More than one statement is true.
    SelectSeveral,
}

/// Per-statement judgement shown after reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Correct,
    ShouldHaveMarked,
    ShouldNotHaveMarked,
}

/// Truth label and judgement, only available once the ticket is revealed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Verdict {
    pub is_true: bool,
    pub feedback: Feedback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementView {
    pub id: StatementId,
    pub text: String,
    pub marked: bool,
    pub verdict: Option<Verdict>,
}

/// Read-only projection of the ticket being played.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketView {
    /// 1-based position in the session.
    pub number: usize,
    pub of: usize,
    pub prompt: Prompt,
    pub statements: Vec<StatementView>,
    pub marked_count: u32,
    pub true_required: u32,
    /// Whether `advance` would currently be accepted.
    pub can_advance: bool,
    pub revealed: bool,
    pub score: Option<u32>,
    pub is_last: bool,
}

impl TicketView {
    /// View of the current ticket, `None` unless the session is active.
    #[must_use]
    pub fn from_session(session: &Session) -> Option<Self> {
        let ticket = session.current_ticket()?;
        Some(Self {
            number: session.current_ticket_index() + 1,
            of: session.ticket_count(),
            prompt: if ticket.true_required() == 1 {
                Prompt::SelectOne
            } else {
                Prompt::SelectSeveral
            },
            statements: statement_views(ticket),
            marked_count: ticket.marked_count(),
            true_required: ticket.true_required(),
            can_advance: ticket.is_revealed() || ticket.is_ready(),
            revealed: ticket.is_revealed(),
            score: ticket.score(),
            is_last: session.is_last_ticket(),
        })
    }
}

fn statement_views(ticket: &Ticket) -> Vec<StatementView> {
    ticket
        .statements()
        .iter()
        .zip(ticket.selections())
        .map(|(statement, &marked)| {
            let verdict = ticket.is_revealed().then(|| {
                let is_true = statement.is_true();
                let feedback = match (is_true, marked) {
                    (true, false) => Feedback::ShouldHaveMarked,
                    (false, true) => Feedback::ShouldNotHaveMarked,
                    _ => Feedback::Correct,
                };
                Verdict { is_true, feedback }
            });
            StatementView {
                id: statement.id().clone(),
                text: statement.text().to_owned(),
                marked,
                verdict,
            }
        })
        .collect()
}

/// Final tally of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionResult {
    pub correct: u32,
    pub total: u32,
    /// `correct / total` as a percentage, rounded half up.
    pub percent: u32,
    pub perfect_tickets: usize,
    pub ticket_count: usize,
}

impl SessionResult {
    /// Result of `session`, `None` unless it is finished.
    #[must_use]
    pub fn from_session(session: &Session) -> Option<Self> {
        if session.phase() != SessionPhase::Finished {
            return None;
        }
        let correct = session.running_score();
        let total = session.total_possible();
        Some(Self {
            correct,
            total,
            percent: percent(correct, total),
            perfect_tickets: session.perfect_ticket_count(),
            ticket_count: session.ticket_count(),
        })
    }
}

fn percent(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let (correct, total) = (u64::from(correct), u64::from(total));
    u32::try_from((correct * 100 + total / 2) / total).unwrap_or(100)
}
