//! Line-driven terminal host for the quiz state machine.

use quiz_core::model::{AdvanceOutcome, SessionPhase};
use services::{Feedback, Prompt, QuizError, QuizStateMachine, TicketView};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Input {
    Start,
    Toggle(usize),
    Next,
    Reset,
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input {
    match line.trim() {
        "" | "n" | "next" => Input::Next,
        "s" | "start" => Input::Start,
        "r" | "reset" => Input::Reset,
        "q" | "quit" => Input::Quit,
        other => match other.parse::<usize>() {
            Ok(number) if number > 0 => Input::Toggle(number - 1),
            _ => Input::Unknown,
        },
    }
}

/// Render, read a command, apply it; until `quit` or end of input.
pub async fn run(mut quiz: QuizStateMachine) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        render(&quiz);
        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };

        let outcome = match (parse_input(&line), quiz.phase()) {
            (Input::Quit, _) => return Ok(()),
            (Input::Reset, _) => {
                quiz.reset().await;
                Ok(())
            }
            (Input::Start | Input::Next, SessionPhase::Idle | SessionPhase::Finished) => {
                quiz.start().await
            }
            (Input::Toggle(index), SessionPhase::Active) => {
                quiz.toggle_selection(index).await.map(|_| ())
            }
            (Input::Next, SessionPhase::Active) => quiz.advance().await.map(|outcome| {
                if let AdvanceOutcome::Revealed { score } = outcome {
                    println!("  ticket score: {score}");
                }
            }),
            _ => {
                println!("  ?");
                Ok(())
            }
        };

        if let Err(err) = outcome {
            report(&err);
        }
    }
}

fn report(err: &QuizError) {
    if err.is_invalid_transition() {
        println!("  ! {err}");
    } else {
        tracing::error!(error = %err, "could not start a session");
        println!("  ! could not start a session: {err}");
    }
}

fn render(quiz: &QuizStateMachine) {
    match quiz.phase() {
        SessionPhase::Idle => {
            println!();
            println!("Mark the true statement(s) in each ticket.");
            println!("[s]tart  [r]eset  [q]uit");
        }
        SessionPhase::Active => {
            if let Some(view) = quiz.current_ticket() {
                render_ticket(&view, quiz.scores().running, quiz.scores().total_possible);
            }
        }
        SessionPhase::Finished => {
            if let Some(result) = quiz.result() {
                println!();
                println!("Done! {}/{} - {}%", result.correct, result.total, result.percent);
                println!(
                    "Perfect tickets: {} of {}",
                    result.perfect_tickets, result.ticket_count
                );
                println!("[s]tart again  [r]eset  [q]uit");
            }
        }
    }
}

fn render_ticket(view: &TicketView, running: u32, total: u32) {
    println!();
    println!("Ticket {}/{}    score {running}/{total}", view.number, view.of);
    println!(
        "{}",
        match view.prompt {
            Prompt::SelectOne => "Which statement is true?",
            Prompt::SelectSeveral => "Which statements are true?",
        }
    );

    for (index, statement) in view.statements.iter().enumerate() {
        let mark = if statement.marked { "x" } else { " " };
        let verdict = statement.verdict.map_or(String::new(), |verdict| {
            let label = if verdict.is_true { "true" } else { "false" };
            match verdict.feedback {
                Feedback::Correct => format!("  ({label})"),
                Feedback::ShouldHaveMarked => format!("  ({label}, should have been marked)"),
                Feedback::ShouldNotHaveMarked => format!("  ({label}, should not be marked)"),
            }
        });
        println!("  {}. [{mark}] {}{verdict}", index + 1, statement.text);
    }

    if view.revealed {
        let score = view.score.unwrap_or_default();
        println!("  {score}/{}", view.statements.len());
        let next = if view.is_last { "results" } else { "next ticket" };
        println!("[enter] {next}  [r]eset  [q]uit");
    } else {
        println!(
            "marked {}/{}  [1-{}] toggle  [enter] check  [r]eset  [q]uit",
            view.marked_count,
            view.true_required,
            view.statements.len()
        );
    }
}
