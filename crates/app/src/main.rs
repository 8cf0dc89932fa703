use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use quiz_core::model::{SessionConfig, StatementPool, TrueQuota};
use services::QuizStateMachine;
use storage::pool::JsonFilePool;
use storage::repository::{StatementSource, Storage};
use storage::sqlite::SqliteRepository;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod play;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidNumber { flag: &'static str, raw: String },
    InvalidDbUrl { raw: String },
    MissingPool,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidNumber { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::MissingPool => write!(f, "import requires --pool <json_path>"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_number(flag: &'static str, raw: String) -> Result<u32, ArgsError> {
    raw.trim()
        .parse()
        .map_err(|_| ArgsError::InvalidNumber { flag, raw })
}

fn env_number(var: &str, flag: &'static str, default: u32) -> Result<u32, ArgsError> {
    std::env::var(var)
        .ok()
        .map_or(Ok(default), |raw| parse_number(flag, raw))
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- play   [--db <sqlite_url>] [--pool <json_path>] [session options]");
    eprintln!("  cargo run -p app -- import --pool <json_path> [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Session options (defaults):");
    eprintln!("  --tickets <n>       (40)");
    eprintln!("  --ticket-size <n>   (3)");
    eprintln!("  --min-true <n>      (1)");
    eprintln!("  --max-true <n>      (2)");
    eprintln!();
    eprintln!("Without --pool, play draws statements previously imported into the database.");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_POOL_PATH, QUIZ_TICKETS, QUIZ_TICKET_SIZE,");
    eprintln!("  QUIZ_MIN_TRUE, QUIZ_MAX_TRUE, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Play,
    Import,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "play" => Some(Self::Play),
            "import" => Some(Self::Import),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    pool_path: Option<PathBuf>,
    tickets: u32,
    ticket_size: u32,
    min_true: u32,
    max_true: u32,
}

impl Args {
    /// Flags override environment variables, which override defaults.
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let defaults = SessionConfig::default();
        let mut parsed = Self {
            db_url: std::env::var("QUIZ_DB_URL")
                .ok()
                .map_or_else(|| normalize_sqlite_url("quiz.sqlite3".into()), normalize_sqlite_url),
            pool_path: std::env::var("QUIZ_POOL_PATH").ok().map(PathBuf::from),
            tickets: env_number("QUIZ_TICKETS", "--tickets", defaults.ticket_count())?,
            ticket_size: env_number("QUIZ_TICKET_SIZE", "--ticket-size", defaults.ticket_size())?,
            min_true: env_number("QUIZ_MIN_TRUE", "--min-true", defaults.true_quota().min())?,
            max_true: env_number("QUIZ_MAX_TRUE", "--max-true", defaults.true_quota().max())?,
        };

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    parsed.db_url = normalize_sqlite_url(value);
                }
                "--pool" => parsed.pool_path = Some(require_value(args, "--pool")?.into()),
                "--tickets" => {
                    parsed.tickets = parse_number("--tickets", require_value(args, "--tickets")?)?;
                }
                "--ticket-size" => {
                    parsed.ticket_size =
                        parse_number("--ticket-size", require_value(args, "--ticket-size")?)?;
                }
                "--min-true" => {
                    parsed.min_true = parse_number("--min-true", require_value(args, "--min-true")?)?;
                }
                "--max-true" => {
                    parsed.max_true = parse_number("--max-true", require_value(args, "--max-true")?)?;
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(parsed)
    }

    fn session_config(&self) -> Result<SessionConfig, quiz_core::model::ConfigError> {
        SessionConfig::new(
            self.tickets,
            self.ticket_size,
            TrueQuota::new(self.min_true, self.max_true)?,
        )
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // Default behavior: play when no subcommand is provided.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Play,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Play,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let parsed = Args::parse(&mut argv.into_iter()).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_sqlite_file(&parsed.db_url)?;

    match cmd {
        Command::Play => {
            let config = parsed.session_config()?;
            let mut storage = Storage::sqlite(&parsed.db_url).await?;
            if let Some(path) = &parsed.pool_path {
                let source: Arc<dyn StatementSource> = Arc::new(JsonFilePool::new(path));
                storage = storage.with_statement_source(source);
            }
            tracing::info!(
                db = %parsed.db_url,
                pool = ?parsed.pool_path,
                tickets = config.ticket_count(),
                "opening quiz"
            );

            let quiz = QuizStateMachine::resume(config, storage.statements, storage.snapshots).await;
            play::run(quiz).await?;
            Ok(())
        }
        Command::Import => {
            let source = JsonFilePool::new(parsed.pool_path.ok_or(ArgsError::MissingPool)?);
            let records = source.fetch_pool().await?;
            // refuse to store a pool that could never start a session
            StatementPool::from_records(records.clone())?;

            let repo = SqliteRepository::connect(&parsed.db_url).await?;
            repo.migrate().await?;
            let count = repo.replace_statements(&records).await?;
            println!("imported {count} statement(s) from {}", source.path().display());
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
