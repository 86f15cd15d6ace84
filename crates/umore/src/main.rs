use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

mod config;
mod db;
mod html;
mod journal;
mod server;
mod store;
mod types;

use config::Settings;
use db::SqliteStore;
use journal::Journal;
use store::{DynStore, MemoryStore};
use types::{Mood, DAYS_IN_GRID};

#[derive(Parser, Debug)]
#[command(name = "umore")]
#[command(about = "Keep a year of moods, one colored square per day")]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// SQLite database holding the journal (overrides UMORE_DB)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Keep the journal in memory only; nothing is written to disk
    #[arg(long, global = true)]
    ephemeral: bool,

    /// Output directory for generated files
    #[arg(short, long, default_value = ".", global = true)]
    output: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the web server (default)
    Serve {
        /// Port to listen on (overrides UMORE_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Generate a static HTML snapshot (no server)
    Build,

    /// Print a summary of the year so far
    Show,

    /// Record a mood on a day
    Set {
        /// Mood color or name (e.g. "yellow" or "Happy")
        mood: String,

        /// Day of the year, 1-based (defaults to today)
        #[arg(short, long)]
        day: Option<usize>,
    },

    /// Remove the mood recorded on a day
    Remove {
        /// Day of the year, 1-based (defaults to today)
        #[arg(short, long)]
        day: Option<usize>,
    },

    /// Toggle dark mode for the web page
    DarkMode,

    /// Reset every day of the journal
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level))
        .add_directive("hyper=warn".parse().unwrap());

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_max_level(Level::TRACE)
        .init();
}

fn open_journal(settings: &Settings, ephemeral: bool, today: NaiveDate) -> Result<Journal<DynStore>> {
    let store: DynStore = if ephemeral {
        info!("Using in-memory journal");
        Box::new(MemoryStore::new())
    } else {
        Box::new(SqliteStore::open(&settings.db_path)?)
    };
    Ok(Journal::open(store, today))
}

/// Turn a 1-based day of the year into a grid index, defaulting to today
fn day_to_index(day: Option<usize>, today_index: usize) -> Result<usize> {
    match day {
        None => Ok(today_index),
        Some(0) => bail!("Days are numbered from 1"),
        Some(day) if day > DAYS_IN_GRID => bail!("The journal has {} days", DAYS_IN_GRID),
        Some(day) => Ok(day - 1),
    }
}

/// Parse a mood given on the command line; placeholders cannot be recorded
fn parse_mood(raw: &str) -> Result<Mood> {
    let mood: Mood = raw.parse()?;
    if mood.is_sentinel() {
        bail!("{} is a placeholder, not a mood; use `remove` to clear a day", raw);
    }
    Ok(mood)
}

/// Ask on the terminal; anything but "y"/"yes" is a no
fn prompt_stdin(prompt: &str) -> bool {
    print!("{} [y/N] ", prompt);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}

fn show(journal: &Journal<DynStore>) {
    info!(
        today = journal.today_index() + 1,
        today_mood = journal.mood(journal.today_index()).map(|m| m.label()),
        recorded = journal.recorded_days(),
        dark_mode = journal.dark_mode(),
        "Year so far"
    );
    for count in journal.tally() {
        info!(mood = count.mood.label(), color = %count.mood, days = count.count, "Mood");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args.log_level);

    let port = match args.command {
        Some(Commands::Serve { port }) => port,
        _ => None,
    };
    let settings = Settings::from_env()?.with_overrides(args.db.clone(), port);
    let today = Local::now().date_naive();
    let mut journal = open_journal(&settings, args.ephemeral, today)?;

    match args.command {
        // Default to serve if no command specified
        None | Some(Commands::Serve { .. }) => {
            server::serve(settings.port, journal).await?;
        }
        Some(Commands::Build) => {
            let html_path = args.output.join("index.html");
            html::generate_html(&journal.view(), &html_path)?;
            info!(path = %html_path.display(), "HTML saved");
        }
        Some(Commands::Show) => show(&journal),
        Some(Commands::Set { mood, day }) => {
            let mood = parse_mood(&mood)?;
            let index = day_to_index(day, journal.today_index())?;
            journal.select(index);
            if journal.set_mood(mood) {
                info!(day = index + 1, mood = mood.label(), "Mood recorded");
            } else {
                info!(day = index + 1, "Day is not editable, nothing recorded");
            }
        }
        Some(Commands::Remove { day }) => {
            let index = day_to_index(day, journal.today_index())?;
            journal.select(index);
            if journal.remove_mood() {
                info!(day = index + 1, "Mood removed");
            } else {
                info!(day = index + 1, "Day is not editable, nothing removed");
            }
        }
        Some(Commands::DarkMode) => {
            let enabled = journal.toggle_dark_mode();
            info!(dark_mode = enabled, "Dark mode toggled");
        }
        Some(Commands::Clear { yes }) => {
            let cleared = if yes {
                journal.clear_all();
                true
            } else {
                journal.clear_all_confirmed(&mut prompt_stdin)
            };
            if !cleared {
                info!("Nothing cleared");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_day_to_index() {
        assert_eq!(day_to_index(None, 42).unwrap(), 42);
        assert_eq!(day_to_index(Some(1), 42).unwrap(), 0);
        assert_eq!(day_to_index(Some(365), 42).unwrap(), 364);
        assert!(day_to_index(Some(0), 42).is_err());
    }

    #[test]
    fn test_day_to_index_past_end_of_grid() {
        let err = day_to_index(Some(400), 42).unwrap_err();
        assert!(err.to_string().contains("365"));
        assert!(day_to_index(Some(366), 42).is_err());
    }

    #[test]
    fn test_parse_mood_accepts_palette() {
        assert_eq!(parse_mood("yellow").unwrap(), Mood::Happy);
        assert_eq!(parse_mood("Relaxed").unwrap(), Mood::Relaxed);
    }

    #[test]
    fn test_parse_mood_rejects_placeholders() {
        let err = parse_mood("white").unwrap_err();
        assert!(err.to_string().contains("placeholder"));
        assert!(parse_mood("lightgray").is_err());
        assert!(parse_mood("teal").is_err());
    }

    #[test]
    fn test_args_default_to_serve() {
        let args = Args::try_parse_from(["umore"]).unwrap();
        assert!(args.command.is_none());
        assert!(!args.ephemeral);
        assert_eq!(args.log_level, "info");
    }

    #[test]
    fn test_args_set_with_day() {
        let args = Args::try_parse_from(["umore", "set", "yellow", "--day", "12"]).unwrap();
        match args.command {
            Some(Commands::Set { mood, day }) => {
                assert_eq!(mood, "yellow");
                assert_eq!(day, Some(12));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_args_global_db_after_subcommand() {
        let args = Args::try_parse_from(["umore", "clear", "--yes", "--db", "x.db"]).unwrap();
        assert_eq!(args.db, Some(PathBuf::from("x.db")));
        assert!(matches!(args.command, Some(Commands::Clear { yes: true })));
    }

    #[test]
    fn test_open_journal_ephemeral() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let journal = open_journal(&Settings::default(), true, today).unwrap();
        assert_eq!(journal.today_index(), 0);
        assert_eq!(journal.recorded_days(), 0);
    }

    #[test]
    fn test_open_journal_on_disk() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let settings = Settings::default()
            .with_overrides(Some(temp_dir.path().join("umore.db")), None);
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

        let mut journal = open_journal(&settings, false, today).unwrap();
        journal.select(0);
        journal.set_mood(Mood::Happy);
        drop(journal);

        let journal = open_journal(&settings, false, today).unwrap();
        assert_eq!(journal.mood(0), Some(Mood::Happy));
    }
}
