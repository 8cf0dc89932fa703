#![forbid(unsafe_code)]

pub mod error;
pub mod quiz;

pub use error::QuizError;
pub use quiz::{
    Feedback, PersistenceGateway, Prompt, QuizStateMachine, ScoreBoard, SessionResult,
    StatementView, TicketView, Verdict,
};
