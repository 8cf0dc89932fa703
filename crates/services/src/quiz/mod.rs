mod machine;
mod persistence;
mod view;

// Public API of the quiz subsystem.
pub use machine::QuizStateMachine;
pub use persistence::PersistenceGateway;
pub use view::{Feedback, Prompt, ScoreBoard, SessionResult, StatementView, TicketView, Verdict};
