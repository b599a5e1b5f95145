use std::fmt;

use services::{AppServices, Clock, UserSession};
use study_core::model::{OwnerId, TopicWithProgress};
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidOwner { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidOwner { raw } => write!(f, "invalid --owner value: {raw}"),
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
    eprintln!("  cargo run -p app -- topics [--db <sqlite_url>] [--owner <id>]");
    eprintln!("  cargo run -p app -- watch  [--db <sqlite_url>] [--owner <id>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:dev.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  STUDY_DB_URL, STUDY_OWNER");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Topics,
    Watch,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "topics" => Some(Self::Topics),
            "watch" => Some(Self::Watch),
            _ => None,
        }
    }
}

struct Args {
    db_url: String,
    owner: Option<OwnerId>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = std::env::var("STUDY_DB_URL")
            .ok()
            .map_or_else(|| "sqlite://dev.sqlite3".into(), normalize_sqlite_url);
        let mut owner = std::env::var("STUDY_OWNER")
            .ok()
            .and_then(|value| OwnerId::new(value).ok());

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--owner" => {
                    let value = require_value(args, "--owner")?;
                    owner = Some(
                        OwnerId::new(value.clone())
                            .map_err(|_| ArgsError::InvalidOwner { raw: value })?,
                    );
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, owner })
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

fn print_progress(progress: &[TopicWithProgress]) {
    if progress.is_empty() {
        println!("(no topics)");
        return;
    }
    for item in progress {
        let mark = if item.checked { 'x' } else { ' ' };
        println!("[{mark}] {:>4}  {}", item.topic.id(), item.topic.title());
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None => Command::Topics,
        Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) if first.starts_with("--") => Command::Topics,
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
    let args = Args::parse(&mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&args.db_url)?;

    let session = match args.owner {
        Some(owner) => UserSession::signed_in(owner),
        None => UserSession::anonymous(),
    };
    let services =
        AppServices::new_sqlite(&args.db_url, Clock::default_clock(), session).await?;

    match cmd {
        Command::Topics => {
            let progress = services.progress().topics_with_progress().await?;
            print_progress(&progress);
            Ok(())
        }
        Command::Watch => {
            let mut watch = services.progress().watch().await?;
            print_progress(&watch.current());
            println!("-- watching; ctrl-c to stop --");

            loop {
                tokio::select! {
                    emitted = watch.next() => match emitted {
                        Some(progress) => {
                            println!();
                            print_progress(&progress);
                        }
                        None => {
                            tracing::warn!("progress stream closed");
                            break;
                        }
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            Ok(())
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
