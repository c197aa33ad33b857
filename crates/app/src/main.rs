use std::fmt;
use std::path::PathBuf;

use services::tutor_service::settings_from_env;
use services::{AppServices, Clock};
use storage::repository::Storage;

mod screens;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    eprintln!("  cargo run -p app -- [quiz|review|stats|tutor] [--db <sqlite_url>]");
    eprintln!("  cargo run -p app -- report [--db <sqlite_url>] [--out <file>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  command quiz");
    eprintln!("  --db sqlite://prep.sqlite3   (:memory: keeps progress for this run only)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  PREP_DB_URL, PREP_AI_API_KEY, PREP_AI_BASE_URL, PREP_AI_MODEL, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quiz,
    Review,
    Stats,
    Report,
    Tutor,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "quiz" => Some(Self::Quiz),
            "review" => Some(Self::Review),
            "stats" => Some(Self::Stats),
            "report" => Some(Self::Report),
            "tutor" => Some(Self::Tutor),
            _ => None,
        }
    }
}

#[derive(Debug)]
enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug)]
struct Args {
    database: Database,
    out: Option<PathBuf>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>, cmd: Command) -> Result<Self, ArgsError> {
        let mut database = std::env::var("PREP_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| Database::Sqlite("sqlite://prep.sqlite3".into()), parse_database);
        let mut out = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    database = parse_database(value);
                }
                "--out" if cmd == Command::Report => {
                    out = Some(PathBuf::from(require_value(args, "--out")?));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { database, out })
    }
}

fn parse_database(raw: String) -> Database {
    if raw.trim() == ":memory:" {
        Database::Memory
    } else {
        Database::Sqlite(normalize_sqlite_url(raw))
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

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    // No subcommand means quiz.
    let cmd = match argv.first().map(String::as_str) {
        None => Command::Quiz,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Quiz,
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    if !argv.is_empty() && !argv[0].starts_with("--") {
        argv.remove(0);
    }

    let mut iter = argv.into_iter();
    let parsed = Args::parse(&mut iter, cmd).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let clock = Clock::system();
    let tutor_settings = settings_from_env()?;
    let mut app = match &parsed.database {
        Database::Memory => {
            AppServices::with_storage(Storage::in_memory(), clock, tutor_settings).await?
        }
        Database::Sqlite(url) => {
            // Open + migrate SQLite at startup, creating the file first.
            prepare_sqlite_file(url)?;
            AppServices::new_sqlite(url, clock, tutor_settings).await?
        }
    };

    match cmd {
        Command::Quiz => screens::quiz(&mut app).await?,
        Command::Review => screens::review(&mut app).await?,
        Command::Stats => screens::stats(&app),
        Command::Report => screens::report(&app, parsed.out.as_deref()).await?,
        Command::Tutor => screens::tutor(&app).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    pretty_env_logger::init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
