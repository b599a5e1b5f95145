use std::fmt;

use chrono::{DateTime, Utc};
use storage::repository::{NewSubtopicRecord, NewTopicRecord, Storage};
use study_core::model::{ImageRef, OwnerId};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    owner: Option<OwnerId>,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    InvalidOwner { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidOwner { raw } => write!(f, "invalid --owner value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
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
    eprintln!("  cargo run -p storage --bin seed -- [--db <sqlite_url>] [--owner <id>] [--now <rfc3339>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite://dev.sqlite3");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = "sqlite://dev.sqlite3".to_string();
        let mut owner = None;
        let mut now = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--owner" => {
                    let value = require_value(args, "--owner")?;
                    owner = Some(
                        OwnerId::new(value.clone())
                            .map_err(|_| ArgsError::InvalidOwner { raw: value })?,
                    );
                }
                "--now" => {
                    let value = require_value(args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value })?;
                    now = Some(parsed.with_timezone(&Utc));
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, owner, now })
    }
}

const SAMPLE_TOPICS: [(&str, &[(&str, &str, bool)]); 3] = [
    (
        "Dogs",
        &[
            ("Terriers", "Bred to hunt vermin; compact and energetic.", true),
            ("Spaniels", "Flushing dogs with long coats.", false),
            ("Sight hounds", "Hunt by speed and vision, not scent.", false),
        ],
    ),
    (
        "Cats",
        &[
            ("Siamese", "Vocal, point-colored breed from Thailand.", true),
            ("Maine Coon", "Largest domesticated cat breed.", true),
        ],
    ),
    ("Birds", &[]),
];

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let args = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let mut topic_count = 0u32;
    let mut subtopic_count = 0u32;

    for (title, subtopics) in SAMPLE_TOPICS {
        let topic_id = storage
            .topics
            .insert_new_topic(NewTopicRecord {
                owner_id: args.owner.clone(),
                title: (*title).to_owned(),
                created_at: now,
            })
            .await?;
        topic_count += 1;

        for (sub_title, description, checked) in subtopics {
            storage
                .subtopics
                .insert_new_subtopic(NewSubtopicRecord {
                    topic_id,
                    owner_id: args.owner.clone(),
                    title: (*sub_title).to_owned(),
                    description: (*description).to_owned(),
                    checked: *checked,
                    bookmarked: false,
                    image: ImageRef::from_file(format!(
                        "images/{}.png",
                        sub_title.to_lowercase().replace(' ', "-")
                    ))
                    .ok(),
                    created_at: now,
                })
                .await?;
            subtopic_count += 1;
        }
    }

    println!(
        "Seeded {topic_count} topics with {subtopic_count} subtopics into {}",
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
