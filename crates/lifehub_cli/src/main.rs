//! CLI entry point for local habit inspection.
//!
//! # Responsibility
//! - Verify `lifehub_core` linkage without Flutter/FFI runtime setup.
//! - Drive habit use cases against a SQLite file for quick sanity checks.
//!
//! # Invariants
//! - Output is JSON (or plain `key=value` for `ping`) and deterministic for
//!   a given database state.
//! - Failures exit with status 1 and a single `error:` line on stderr.

use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand, ValueEnum};
use lifehub_core::db::open_db;
use lifehub_core::{
    default_log_level, init_logging, parse_calendar_date, EntryDetails, Frequency, HabitDraft,
    HabitId, HabitRepository, HabitService, MutationOutcome, PersistenceWarning, Quality,
    SqliteKeyValueStore, StorageConfig, TimeOfDay, DEFAULT_WINDOW_DAYS,
};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "lifehub", version, about = "Inspect and drive LifeHub habits")]
struct Cli {
    /// SQLite database path (defaults to `LIFEHUB_DB_PATH` or the temp dir).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// User whose habit array is used (defaults to `LIFEHUB_USER_KEY`).
    #[arg(long, global = true)]
    user: Option<String>,

    /// Absolute directory for rolling log files; logging stays off when unset.
    #[arg(long, global = true)]
    log_dir: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print core linkage info.
    Ping,
    /// List every habit as JSON.
    List,
    /// Create a habit.
    Add {
        title: String,
        #[arg(long, value_enum, default_value_t = FrequencyArg::Daily)]
        frequency: FrequencyArg,
        #[arg(long, default_value = "any")]
        time_of_day: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Record a completion.
    Complete {
        habit_id: HabitId,
        /// `YYYY-MM-DD`; defaults to today.
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        quality: Option<String>,
        #[arg(long)]
        duration: Option<u32>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Mark a date as not completed.
    Uncomplete {
        habit_id: HabitId,
        #[arg(long)]
        date: Option<String>,
    },
    /// Delete the log entry on a date.
    RemoveEntry {
        habit_id: HabitId,
        #[arg(long)]
        date: Option<String>,
    },
    /// Validate a saved AI suggestion response and admit the valid habits.
    ImportSuggestions { file: PathBuf },
    /// Show streak and completion statistics.
    Stats {
        habit_id: HabitId,
        /// Evaluation day `YYYY-MM-DD`; defaults to today.
        #[arg(long)]
        today: Option<String>,
        #[arg(long, default_value_t = DEFAULT_WINDOW_DAYS)]
        window: u32,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FrequencyArg {
    Daily,
    Weekly,
    Custom,
}

impl From<FrequencyArg> for Frequency {
    fn from(value: FrequencyArg) -> Self {
        match value {
            FrequencyArg::Daily => Frequency::Daily,
            FrequencyArg::Weekly => Frequency::Weekly,
            FrequencyArg::Custom => Frequency::Custom,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String, String> {
    if matches!(cli.command, Command::Ping) {
        return Ok(ping_text());
    }

    if let Some(log_dir) = &cli.log_dir {
        init_logging(default_log_level(), log_dir).map_err(|err| err.to_string())?;
    }

    let config = resolve_config(cli.db, cli.user)?;
    let conn = open_db(&config.db_path).map_err(|err| err.to_string())?;
    let repo = HabitRepository::new(SqliteKeyValueStore::new(&conn), config.storage_key());
    let mut service = HabitService::load(repo).map_err(|err| err.to_string())?;

    match cli.command {
        Command::Ping => Ok(ping_text()),
        Command::List => to_json(&service.habits()),
        Command::Add {
            title,
            frequency,
            time_of_day,
            description,
        } => {
            let mut draft = HabitDraft::new(title, frequency.into());
            draft.description = description;
            draft.time_of_day = time_of_day.parse::<TimeOfDay>().unwrap_or_default();
            mutation_json(service.create_habit(draft))
        }
        Command::Complete {
            habit_id,
            date,
            quality,
            duration,
            notes,
        } => {
            let quality = quality
                .map(|raw| {
                    raw.parse::<Quality>()
                        .map_err(|()| format!("unsupported quality `{raw}`"))
                })
                .transpose()?;
            let details = EntryDetails {
                quality,
                duration_minutes: duration,
                notes,
                ..EntryDetails::default()
            };
            mutation_json(service.complete(habit_id, &date_or_today(date), details))
        }
        Command::Uncomplete { habit_id, date } => {
            mutation_json(service.uncomplete(habit_id, &date_or_today(date)))
        }
        Command::RemoveEntry { habit_id, date } => {
            mutation_json(service.remove_entry(habit_id, &date_or_today(date)))
        }
        Command::ImportSuggestions { file } => {
            let raw = std::fs::read_to_string(&file)
                .map_err(|err| format!("cannot read {}: {err}", file.display()))?;
            let outcome = service
                .accept_suggestions(&raw)
                .map_err(|err| err.to_string())?;
            let rejected: Vec<_> = outcome
                .rejected
                .iter()
                .map(|rejection| {
                    serde_json::json!({
                        "index": rejection.index,
                        "error": rejection.error.to_string(),
                    })
                })
                .collect();
            to_json(&serde_json::json!({
                "accepted": outcome.accepted,
                "rejected": rejected,
                "warning": warning_text(outcome.persistence_warning),
            }))
        }
        Command::Stats {
            habit_id,
            today,
            window,
        } => {
            let today = match today {
                Some(raw) => parse_calendar_date(&raw).map_err(|err| err.to_string())?,
                None => local_today(),
            };
            let stats = service
                .stats(habit_id, today, window)
                .map_err(|err| err.to_string())?;
            to_json(&serde_json::json!({
                "totalCompletions": stats.total_completions,
                "longestStreak": stats.longest_streak,
                "currentStreak": stats.current_streak,
                "completionRate": stats.completion_rate,
            }))
        }
    }
}

fn ping_text() -> String {
    format!(
        "lifehub_core ping={}\nlifehub_core version={}",
        lifehub_core::ping(),
        lifehub_core::core_version()
    )
}

fn resolve_config(db: Option<PathBuf>, user: Option<String>) -> Result<StorageConfig, String> {
    StorageConfig::resolve(db, user).map_err(|err| err.to_string())
}

fn mutation_json<E: std::fmt::Display>(result: Result<MutationOutcome, E>) -> Result<String, String> {
    let outcome = result.map_err(|err| err.to_string())?;
    to_json(&serde_json::json!({
        "habit": outcome.habit,
        "warning": warning_text(outcome.persistence_warning),
    }))
}

fn warning_text(warning: Option<PersistenceWarning>) -> Option<String> {
    warning.map(|warning| warning.to_string())
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| err.to_string())
}

fn date_or_today(date: Option<String>) -> String {
    date.unwrap_or_else(|| local_today().format("%Y-%m-%d").to_string())
}

fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::{run, Cli};
    use clap::Parser;
    use lifehub_core::config::USER_KEY_ENV;
    use lifehub_core::Habit;

    fn run_args(db: &std::path::Path, args: &[&str]) -> Result<String, String> {
        let db = db.to_str().unwrap();
        let mut argv = vec!["lifehub", "--db", db, "--user", "cli-tests"];
        argv.extend_from_slice(args);
        run(Cli::try_parse_from(argv).unwrap())
    }

    #[test]
    fn explicit_user_wins_over_invalid_env_user() {
        std::env::set_var(USER_KEY_ENV, "a b");
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.sqlite3");

        let listed = run_args(&db, &["list"]);
        std::env::remove_var(USER_KEY_ENV);
        assert_eq!(listed.unwrap().trim(), "[]");
    }

    #[test]
    fn ping_prints_linkage() {
        let output = run(Cli::try_parse_from(["lifehub", "ping"]).unwrap()).unwrap();
        assert!(output.contains("ping=pong"));
    }

    #[test]
    fn add_complete_and_stats_flow() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.sqlite3");

        let added: serde_json::Value =
            serde_json::from_str(&run_args(&db, &["add", "Stretch", "--frequency", "daily"]).unwrap())
                .unwrap();
        let habit: Habit = serde_json::from_value(added["habit"].clone()).unwrap();
        let id = habit.id.to_string();

        for date in ["2024-05-01", "2024-05-02"] {
            run_args(&db, &["complete", &id, "--date", date, "--quality", "good"]).unwrap();
        }

        let listed: Vec<Habit> = serde_json::from_str(&run_args(&db, &["list"]).unwrap()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].streak(), 2);

        let stats: serde_json::Value = serde_json::from_str(
            &run_args(&db, &["stats", &id, "--today", "2024-05-02", "--window", "2"]).unwrap(),
        )
        .unwrap();
        assert_eq!(stats["totalCompletions"], 2);
        assert_eq!(stats["currentStreak"], 2);
        assert_eq!(stats["completionRate"], 1.0);
    }

    #[test]
    fn unknown_quality_and_bad_date_are_errors() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("cli.sqlite3");
        let added: serde_json::Value =
            serde_json::from_str(&run_args(&db, &["add", "Read"]).unwrap()).unwrap();
        let id = added["habit"]["id"].as_str().unwrap().to_string();

        assert!(run_args(&db, &["complete", &id, "--quality", "superb"]).is_err());
        let err = run_args(&db, &["uncomplete", &id, "--date", "May 1"]).unwrap_err();
        assert!(err.contains("malformed date"));
    }
}
