use std::fmt;
use std::time::Duration;

use services::{
    AppServices, Clock, DEFAULT_SEED_TIMEOUT, GateDecision, Identity, LocalIdentityGate, gate,
    seed_source_for,
};
use study_core::model::{SessionId, WeekId};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{Command, JournalFields, TaskAction};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    MissingOperand { command: &'static str, what: &'static str },
    InvalidSessionId { raw: String },
    InvalidTaskNumber { raw: String },
    InvalidWeek { raw: String },
    InvalidDbUrl { raw: String },
    InvalidTimeout { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingOperand { command, what } => {
                write!(f, "{command} requires {what}")
            }
            ArgsError::InvalidSessionId { raw } => write!(f, "invalid session id: {raw:?}"),
            ArgsError::InvalidTaskNumber { raw } => {
                write!(f, "invalid task number (expected 1 or more): {raw}")
            }
            ArgsError::InvalidWeek { raw } => write!(f, "invalid week: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidTimeout { raw } => {
                write!(f, "invalid seed timeout (expected whole seconds, 1 or more): {raw}")
            }
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

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  study [options] [command]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  dashboard                       progress and next session (default)");
    eprintln!("  schedule                        sessions grouped by week");
    eprintln!("  show <session-id>               one session with its checklist");
    eprintln!("  toggle <session-id> <n>         flip task n (1-based)");
    eprintln!("  check <session-id> <n>          mark task n done");
    eprintln!("  uncheck <session-id> <n>        mark task n not done");
    eprintln!("  journal <session-id> [--notes T] [--issues T] [--fixes T]");
    eprintln!("  reflect <week> [--understood T] [--confused T] [--questions T]");
    eprintln!("  reflections                     past reflections, latest week first");
    eprintln!("  weeks                           weeks available for reflections");
    eprintln!("  reset                           erase all stored data");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>      default sqlite:study.sqlite3");
    eprintln!("  --seed <url|path>      default data/sessions.json");
    eprintln!("  --seed-timeout <secs>  HTTP seed request timeout, default 10");
    eprintln!("  --user <id>            identity for this run");
    eprintln!("  --json                 print JSON instead of text");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_SEED, STUDY_SEED_TIMEOUT, STUDY_USER, STUDY_LOG");
}

struct Args {
    db_url: String,
    seed: String,
    seed_timeout: Duration,
    user: Option<String>,
    json: bool,
    command: Command,
}

#[derive(Default)]
struct TextFlags {
    notes: Option<String>,
    issues: Option<String>,
    fixes: Option<String>,
    understood: Option<String>,
    confused: Option<String>,
    questions: Option<String>,
}

impl Args {
    fn parse(args: impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            std::env::var("STUDY_DB_URL").unwrap_or_else(|_| "sqlite:study.sqlite3".into()),
        );
        let mut seed = std::env::var("STUDY_SEED").unwrap_or_else(|_| "data/sessions.json".into());
        let mut seed_timeout = match std::env::var("STUDY_SEED_TIMEOUT") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => DEFAULT_SEED_TIMEOUT,
        };
        let mut user = non_blank(std::env::var("STUDY_USER").ok());
        let mut json = false;
        let mut text = TextFlags::default();
        let mut positional = Vec::new();

        let mut args = args;
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--seed" => seed = require_value(&mut args, "--seed")?,
                "--seed-timeout" => {
                    seed_timeout = parse_timeout(&require_value(&mut args, "--seed-timeout")?)?;
                }
                "--user" => user = non_blank(Some(require_value(&mut args, "--user")?)),
                "--json" => json = true,
                "--notes" => text.notes = Some(require_value(&mut args, "--notes")?),
                "--issues" => text.issues = Some(require_value(&mut args, "--issues")?),
                "--fixes" => text.fixes = Some(require_value(&mut args, "--fixes")?),
                "--understood" => {
                    text.understood = Some(require_value(&mut args, "--understood")?);
                }
                "--confused" => text.confused = Some(require_value(&mut args, "--confused")?),
                "--questions" => {
                    text.questions = Some(require_value(&mut args, "--questions")?);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let command = parse_command(positional, text)?;
        Ok(Self {
            db_url,
            seed,
            seed_timeout,
            user,
            json,
            command,
        })
    }
}

fn parse_command(positional: Vec<String>, text: TextFlags) -> Result<Command, ArgsError> {
    let mut operands = positional.into_iter();
    let Some(name) = operands.next() else {
        return Ok(Command::Dashboard);
    };

    let command = match name.as_str() {
        "dashboard" => Command::Dashboard,
        "schedule" => Command::Schedule,
        "show" => Command::Show(session_operand(&mut operands, "show")?),
        "toggle" | "check" | "uncheck" => {
            let (command, action) = match name.as_str() {
                "toggle" => ("toggle", TaskAction::Toggle),
                "check" => ("check", TaskAction::Check),
                _ => ("uncheck", TaskAction::Uncheck),
            };
            let id = session_operand(&mut operands, command)?;
            let raw = operands.next().ok_or(ArgsError::MissingOperand {
                command,
                what: "a task number",
            })?;
            let index = parse_task_number(&raw)?;
            Command::Task { id, index, action }
        }
        "journal" => Command::Journal {
            id: session_operand(&mut operands, "journal")?,
            fields: JournalFields {
                notes: text.notes,
                issues: text.issues,
                fixes: text.fixes,
            },
        },
        "reflect" => {
            let raw = operands.next().ok_or(ArgsError::MissingOperand {
                command: "reflect",
                what: "a week number",
            })?;
            let week = raw
                .parse::<WeekId>()
                .map_err(|_| ArgsError::InvalidWeek { raw: raw.clone() })?;
            Command::Reflect {
                week,
                understood: text.understood.unwrap_or_default(),
                confused: text.confused.unwrap_or_default(),
                questions: text.questions.unwrap_or_default(),
            }
        }
        "reflections" => Command::Reflections,
        "weeks" => Command::Weeks,
        "reset" => Command::Reset,
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = operands.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    Ok(command)
}

fn session_operand(
    operands: &mut impl Iterator<Item = String>,
    command: &'static str,
) -> Result<SessionId, ArgsError> {
    let raw = operands.next().ok_or(ArgsError::MissingOperand {
        command,
        what: "a session id",
    })?;
    raw.parse::<SessionId>()
        .map_err(|_| ArgsError::InvalidSessionId { raw })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn parse_timeout(raw: &str) -> Result<Duration, ArgsError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs >= 1 => Ok(Duration::from_secs(secs)),
        _ => Err(ArgsError::InvalidTimeout {
            raw: raw.to_string(),
        }),
    }
}

/// Task numbers are 1-based on the command line.
fn parse_task_number(raw: &str) -> Result<usize, ArgsError> {
    match raw.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(ArgsError::InvalidTaskNumber {
            raw: raw.to_string(),
        }),
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
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
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
    let filter = EnvFilter::try_from_env("STUDY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse(std::env::args().skip(1)).inspect_err(|_| print_usage())?;

    let identity_gate = LocalIdentityGate::new(args.user.clone().map(Identity::new));
    let identity = match gate(&identity_gate) {
        GateDecision::Proceed(identity) => identity,
        GateDecision::Redirect => {
            eprintln!("no identity: pass --user <id> or set STUDY_USER");
            std::process::exit(3);
        }
    };

    prepare_sqlite_file(&args.db_url)?;
    let services = AppServices::new_sqlite(
        &args.db_url,
        Clock::default(),
        seed_source_for(&args.seed, args.seed_timeout)?,
    )
    .await?;
    info!(user = %identity.uid, db = %args.db_url, report = ?services.init_report(), "store ready");

    let output = commands::execute(&services, args.command, args.json).await?;
    println!("{output}");
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
