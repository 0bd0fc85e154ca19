//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose habit use cases to Dart via FRB as sync calls.
//! - Carry habit records across the boundary as persisted-shape JSON strings.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every mutation opens storage, applies one reconciled change and writes
//!   through before returning.
//! - A failed write-through still returns `ok = true` with a `warning`.
//!
//! # See also
//! - docs/architecture/logging.md

use lifehub_core::db::open_db;
use lifehub_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    EntryDetails, Frequency, Habit, HabitDraft, HabitId, HabitRepository, HabitService,
    HabitServiceError, MutationOutcome, Quality, SqliteKeyValueStore, StorageConfig, TimeOfDay,
};
use std::sync::{Mutex, OnceLock};

static STORAGE_CONFIG: OnceLock<StorageConfig> = OnceLock::new();
// Serializes load-mutate-save cycles so concurrent calls cannot drop writes.
static SESSION_LOCK: Mutex<()> = Mutex::new(());

/// Minimal health-check API for FRB smoke integration.
///
/// # FFI contract
/// - Sync call, non-blocking.
/// - Never throws; always returns a UTF-8 string.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Input semantics:
/// - `level`: one of `trace|debug|info|warn|error` (case-insensitive).
/// - `log_dir`: absolute directory path where rolling logs are written.
///
/// # FFI contract
/// - Safe to call repeatedly with the same `level + log_dir`.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Pins the database path and user key for this process.
///
/// # FFI contract
/// - Must be called before any habit call to take effect; otherwise
///   `LIFEHUB_DB_PATH` / `LIFEHUB_USER_KEY` (or their defaults) are used.
/// - Repeating the same configuration is accepted; a different one is rejected.
/// - Returns empty string on success and error message on failure.
#[flutter_rust_bridge::frb(sync)]
pub fn configure_storage(db_path: String, user_key: String) -> String {
    let requested = match StorageConfig::new(db_path.trim(), &user_key) {
        Ok(config) => config,
        Err(err) => return err.to_string(),
    };
    let active = STORAGE_CONFIG.get_or_init(|| requested.clone());
    if *active == requested {
        String::new()
    } else {
        format!(
            "storage already configured at `{}` for `{}`",
            active.db_path.display(),
            active.user_key
        )
    }
}

/// Response envelope for habit calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitActionResponse {
    /// Whether the operation was applied.
    pub ok: bool,
    /// Updated habit in persisted JSON shape.
    pub habit_json: Option<String>,
    /// Human-readable message for diagnostics/UI.
    pub message: String,
    /// Set when the change is kept in memory but was not saved.
    pub warning: Option<String>,
}

impl HabitActionResponse {
    fn from_outcome(message: &str, outcome: MutationOutcome) -> Self {
        match serde_json::to_string(&outcome.habit) {
            Ok(habit_json) => Self {
                ok: true,
                habit_json: Some(habit_json),
                message: message.to_string(),
                warning: outcome.persistence_warning.map(|warning| warning.to_string()),
            },
            Err(err) => Self::failure(format!("habit encode failed: {err}")),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            habit_json: None,
            message: message.into(),
            warning: None,
        }
    }
}

/// Response envelope for listing habits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HabitListResponse {
    pub ok: bool,
    /// JSON array of habits in persisted shape (`[]` on failure).
    pub habits_json: String,
    pub message: String,
}

/// Response envelope for AI suggestion intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionIntakeResponse {
    pub ok: bool,
    pub accepted_json: String,
    /// One message per rejected suggestion, prefixed with its index.
    pub rejected: Vec<String>,
    pub message: String,
    pub warning: Option<String>,
}

/// Lists every habit of the configured user.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_list() -> HabitListResponse {
    let listed = with_habit_service(|service| {
        serde_json::to_string(service.habits())
            .map(|json| (json, service.habits().len()))
            .map_err(|err| format!("habit encode failed: {err}"))
    });
    match listed {
        Ok((habits_json, count)) => HabitListResponse {
            ok: true,
            habits_json,
            message: format!("Found {count} habit(s)."),
        },
        Err(err) => HabitListResponse {
            ok: false,
            habits_json: "[]".to_string(),
            message: format!("habit_list failed: {err}"),
        },
    }
}

/// Creates a habit from form input.
///
/// `frequency` is `daily|weekly|custom`; `time_of_day` falls back to `any`.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_create(
    title: String,
    frequency: String,
    time_of_day: Option<String>,
) -> HabitActionResponse {
    let frequency = match frequency.trim().to_ascii_lowercase().as_str() {
        "daily" => Frequency::Daily,
        "weekly" => Frequency::Weekly,
        "custom" => Frequency::Custom,
        other => {
            return HabitActionResponse::failure(format!(
                "habit_create failed: unsupported frequency `{other}`"
            ))
        }
    };
    let mut draft = HabitDraft::new(title, frequency);
    draft.time_of_day = time_of_day
        .and_then(|value| value.parse::<TimeOfDay>().ok())
        .unwrap_or_default();

    run_mutation("habit_create", "Habit created.", |service| {
        service.create_habit(draft).map_err(|err| err.to_string())
    })
}

/// Records a completion on `date` (`YYYY-MM-DD`).
///
/// Unknown `quality` values are stored as not tracked.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_complete(
    habit_id: String,
    date: String,
    quality: Option<String>,
    duration_minutes: Option<u32>,
    notes: Option<String>,
) -> HabitActionResponse {
    let details = EntryDetails {
        quality: quality.and_then(|value| value.parse::<Quality>().ok()),
        duration_minutes,
        notes: notes.filter(|text| !text.trim().is_empty()),
        ..EntryDetails::default()
    };
    with_habit_id("habit_complete", &habit_id, |id| {
        run_mutation("habit_complete", "Completion recorded.", |service| {
            service
                .complete(id, &date, details)
                .map_err(|err| err.to_string())
        })
    })
}

/// Marks `date` (`YYYY-MM-DD`) as not completed.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_uncomplete(habit_id: String, date: String) -> HabitActionResponse {
    with_habit_id("habit_uncomplete", &habit_id, |id| {
        run_mutation("habit_uncomplete", "Completion removed.", |service| {
            service.uncomplete(id, &date).map_err(|err| err.to_string())
        })
    })
}

/// Deletes the log entry on `date` (`YYYY-MM-DD`).
#[flutter_rust_bridge::frb(sync)]
pub fn habit_remove_entry(habit_id: String, date: String) -> HabitActionResponse {
    with_habit_id("habit_remove_entry", &habit_id, |id| {
        run_mutation("habit_remove_entry", "Log entry removed.", |service| {
            service.remove_entry(id, &date).map_err(|err| err.to_string())
        })
    })
}

/// Validates a raw suggestion response and admits valid habits.
#[flutter_rust_bridge::frb(sync)]
pub fn habit_accept_suggestions(raw_response: String) -> SuggestionIntakeResponse {
    let result = with_habit_service(|service| {
        service
            .accept_suggestions(&raw_response)
            .map_err(|err| err.to_string())
    });
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) => {
            return SuggestionIntakeResponse {
                ok: false,
                accepted_json: "[]".to_string(),
                rejected: Vec::new(),
                message: format!("habit_accept_suggestions failed: {err}"),
                warning: None,
            }
        }
    };

    let accepted_json = encode_habits(&outcome.accepted);
    SuggestionIntakeResponse {
        ok: true,
        accepted_json,
        rejected: outcome
            .rejected
            .iter()
            .map(|rejection| format!("#{}: {}", rejection.index, rejection.error))
            .collect(),
        message: format!(
            "Accepted {} suggestion(s), rejected {}.",
            outcome.accepted.len(),
            outcome.rejected.len()
        ),
        warning: outcome
            .persistence_warning
            .map(|warning| warning.to_string()),
    }
}

fn encode_habits(habits: &[Habit]) -> String {
    serde_json::to_string(habits).unwrap_or_else(|err| {
        log::error!("event=ffi_encode module=ffi status=error error={err}");
        "[]".to_string()
    })
}

fn resolve_storage_config() -> Result<StorageConfig, String> {
    if let Some(config) = STORAGE_CONFIG.get() {
        return Ok(config.clone());
    }
    let config = StorageConfig::from_env().map_err(|err| err.to_string())?;
    Ok(STORAGE_CONFIG.get_or_init(|| config).clone())
}

fn with_habit_service<T>(
    f: impl FnOnce(&mut HabitService<SqliteKeyValueStore<'_>>) -> Result<T, String>,
) -> Result<T, String> {
    let config = resolve_storage_config()?;
    let _session = SESSION_LOCK
        .lock()
        .map_err(|_| "habit session lock poisoned".to_string())?;
    let conn = open_db(&config.db_path).map_err(|err| format!("habit DB open failed: {err}"))?;
    let repo = HabitRepository::new(SqliteKeyValueStore::new(&conn), config.storage_key());
    let mut service = HabitService::load(repo).map_err(|err| match err {
        HabitServiceError::Repo(err) => format!("habit load failed: {err}"),
        other => other.to_string(),
    })?;
    f(&mut service)
}

fn with_habit_id(
    call: &str,
    raw_id: &str,
    f: impl FnOnce(HabitId) -> HabitActionResponse,
) -> HabitActionResponse {
    match HabitId::parse_str(raw_id.trim()) {
        Ok(id) => f(id),
        Err(_) => HabitActionResponse::failure(format!("{call} failed: invalid habit id `{raw_id}`")),
    }
}

fn run_mutation(
    call: &str,
    message: &str,
    f: impl FnOnce(
        &mut HabitService<SqliteKeyValueStore<'_>>,
    ) -> Result<MutationOutcome, String>,
) -> HabitActionResponse {
    match with_habit_service(f) {
        Ok(outcome) => HabitActionResponse::from_outcome(message, outcome),
        Err(err) => HabitActionResponse::failure(format!("{call} failed: {err}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{
        configure_storage, core_version, habit_accept_suggestions, habit_complete, habit_create,
        habit_list, habit_remove_entry, habit_uncomplete, init_logging, ping,
    };
    use lifehub_core::Habit;
    use std::sync::OnceLock;
    use tempfile::TempDir;

    // All tests in this binary share one process-wide storage configuration;
    // the directory lives as long as the test process.
    static TEST_DIR: OnceLock<TempDir> = OnceLock::new();

    fn configure_test_storage() {
        TEST_DIR.get_or_init(|| {
            let dir = tempfile::tempdir().unwrap();
            let error = configure_storage(
                dir.path().join("ffi.sqlite3").to_str().unwrap().to_string(),
                "ffi-tests".to_string(),
            );
            assert!(error.is_empty(), "{error}");
            dir
        });
    }

    fn create(title: &str) -> Habit {
        configure_test_storage();
        let response = habit_create(title.to_string(), "daily".to_string(), None);
        assert!(response.ok, "{}", response.message);
        serde_json::from_str(&response.habit_json.unwrap()).unwrap()
    }

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_empty_log_dir() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
    }

    #[test]
    fn init_logging_rejects_unsupported_level() {
        assert!(!init_logging("verbose".to_string(), "/tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn configure_storage_rejects_switching_user() {
        configure_test_storage();
        let error = configure_storage("/tmp/other.sqlite3".to_string(), "someone".to_string());
        assert!(error.contains("already configured"));
    }

    #[test]
    fn complete_then_uncomplete_roundtrip() {
        let habit = create("ffi stretch");
        let id = habit.id.to_string();

        let completed = habit_complete(
            id.clone(),
            "2024-01-01".to_string(),
            Some("excellent".to_string()),
            Some(10),
            None,
        );
        assert!(completed.ok, "{}", completed.message);
        let updated: Habit = serde_json::from_str(&completed.habit_json.unwrap()).unwrap();
        assert_eq!(updated.streak(), 1);
        assert_eq!(updated.experience(), 17);

        let reverted = habit_uncomplete(id.clone(), "2024-01-01".to_string());
        assert!(reverted.ok, "{}", reverted.message);
        let reverted: Habit = serde_json::from_str(&reverted.habit_json.unwrap()).unwrap();
        assert_eq!(reverted.streak(), 0);
        assert_eq!(reverted.experience(), 7);

        let removed = habit_remove_entry(id, "2024-01-01".to_string());
        assert!(removed.ok, "{}", removed.message);
    }

    #[test]
    fn malformed_inputs_fail_without_panicking() {
        let habit = create("ffi validation");

        let bad_date = habit_complete(habit.id.to_string(), "Jan 1".to_string(), None, None, None);
        assert!(!bad_date.ok);
        assert!(bad_date.message.contains("malformed date"));

        let bad_id = habit_uncomplete("not-a-uuid".to_string(), "2024-01-01".to_string());
        assert!(!bad_id.ok);
        assert!(bad_id.message.contains("invalid habit id"));

        let bad_frequency = habit_create("x".to_string(), "hourly".to_string(), None);
        assert!(!bad_frequency.ok);
    }

    #[test]
    fn suggestions_are_admitted_and_listed() {
        configure_test_storage();
        let response = habit_accept_suggestions(
            r#"[{"title":"ffi suggested walk","aiRationale":"air","frequency":"daily"},{"frequency":"weekly"}]"#
                .to_string(),
        );
        assert!(response.ok, "{}", response.message);
        assert_eq!(response.rejected.len(), 1);
        assert!(response.rejected[0].starts_with("#1:"));

        let listed = habit_list();
        assert!(listed.ok, "{}", listed.message);
        let habits: Vec<Habit> = serde_json::from_str(&listed.habits_json).unwrap();
        assert!(habits
            .iter()
            .any(|habit| habit.title == "ffi suggested walk" && habit.is_ai_suggested));
    }
}
