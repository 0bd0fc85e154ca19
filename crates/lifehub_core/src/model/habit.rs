//! Habit and habit-log records.
//!
//! # Responsibility
//! - Define the persisted `Habit` record and its per-date `HabitLogEntry`.
//! - Keep the log unique by date with last-write-wins semantics.
//! - Decode untrusted enumerated tags leniently (unknown -> not tracked).
//!
//! # Invariants
//! - `level >= 1` for every valid habit.
//! - `title` is non-empty after trimming.
//! - Stored `streak` / `last_completed_date` equal a rescan of `log`, and
//!   `experience` stays below the current level's threshold.
//! - `HabitLog` iterates in ascending date order and never holds two entries
//!   for the same date.
//!
//! # See also
//! - docs/architecture/habit-engine.md

use crate::engine::progression::{level_threshold, Progress};
use crate::engine::streak::{compute_streak, StreakSummary};
use chrono::{NaiveDate, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

/// Maximum accepted title length, counted in characters.
pub const MAX_TITLE_CHARS: usize = 120;

/// Stable identifier for one habit.
pub type HabitId = Uuid;

/// Validation errors for habit records and untrusted habit input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyTitle,
    TitleTooLong { max_chars: usize, actual_chars: usize },
    InvalidLevel(u32),
    MalformedDate(String),
    MalformedPayload(String),
    /// Stored derived fields disagree with the log they are derived from.
    InconsistentProgress(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyTitle => write!(f, "habit title cannot be empty"),
            Self::TitleTooLong {
                max_chars,
                actual_chars,
            } => write!(
                f,
                "habit title is too long ({actual_chars} chars, max {max_chars})"
            ),
            Self::InvalidLevel(level) => write!(f, "habit level must be >= 1, got {level}"),
            Self::MalformedDate(value) => {
                write!(f, "malformed date `{value}`; expected YYYY-MM-DD")
            }
            Self::MalformedPayload(details) => write!(f, "malformed habit payload: {details}"),
            Self::InconsistentProgress(details) => {
                write!(f, "inconsistent habit progress: {details}")
            }
        }
    }
}

impl Error for ValidationError {}

/// How often a habit is meant to be performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Custom,
}

/// Extra schedule details for `Frequency::Custom`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomFrequencyDetails {
    /// Scheduled weekdays, Monday first, no duplicates.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub days_of_week: Vec<Weekday>,
}

impl CustomFrequencyDetails {
    /// Builds details from arbitrary weekdays, sorting and deduplicating them.
    pub fn from_days(days: impl IntoIterator<Item = Weekday>) -> Self {
        let mut days_of_week: Vec<Weekday> = Vec::new();
        for day in days {
            if !days_of_week.contains(&day) {
                days_of_week.push(day);
            }
        }
        days_of_week.sort_by_key(|day| day.num_days_from_monday());
        Self { days_of_week }
    }

    pub fn is_empty(&self) -> bool {
        self.days_of_week.is_empty()
    }
}

/// Preferred time slot for a habit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
    Evening,
    #[default]
    Any,
}

impl TimeOfDay {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Any => "any",
        }
    }
}

impl FromStr for TimeOfDay {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "any" | "anytime" => Ok(Self::Any),
            _ => Err(()),
        }
    }
}

/// Self-reported quality of one completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Quality {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Fair => "fair",
            Self::Poor => "poor",
        }
    }
}

impl FromStr for Quality {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "excellent" => Ok(Self::Excellent),
            "good" => Ok(Self::Good),
            "fair" => Ok(Self::Fair),
            "poor" => Ok(Self::Poor),
            _ => Err(()),
        }
    }
}

/// Emotion tag recorded before or after performing a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Calm,
    Motivated,
    Neutral,
    Tired,
    Stressed,
    Anxious,
    Sad,
}

impl FromStr for Emotion {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "happy" => Ok(Self::Happy),
            "calm" => Ok(Self::Calm),
            "motivated" => Ok(Self::Motivated),
            "neutral" => Ok(Self::Neutral),
            "tired" => Ok(Self::Tired),
            "stressed" => Ok(Self::Stressed),
            "anxious" => Ok(Self::Anxious),
            "sad" => Ok(Self::Sad),
            _ => Err(()),
        }
    }
}

/// Optional qualitative detail attached to one log entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryDetails {
    #[serde(
        default,
        deserialize_with = "lenient_tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub quality: Option<Quality>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(
        default,
        deserialize_with = "lenient_tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub emotion_before: Option<Emotion>,
    #[serde(
        default,
        deserialize_with = "lenient_tag",
        skip_serializing_if = "Option::is_none"
    )]
    pub emotion_after: Option<Emotion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// One record per habit per calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitLogEntry {
    /// Upsert key inside one habit log.
    pub date: NaiveDate,
    pub completed: bool,
    #[serde(flatten)]
    pub details: EntryDetails,
}

impl HabitLogEntry {
    /// Creates a completed entry carrying the given details.
    pub fn completed(date: NaiveDate, details: EntryDetails) -> Self {
        Self {
            date,
            completed: true,
            details,
        }
    }

    /// Creates a not-completed entry without details.
    pub fn not_completed(date: NaiveDate) -> Self {
        Self {
            date,
            completed: false,
            details: EntryDetails::default(),
        }
    }
}

/// Date-keyed habit log.
///
/// Serialized as a JSON array ordered by date. Decoding an array that repeats
/// a date keeps the last occurrence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<HabitLogEntry>", into = "Vec<HabitLogEntry>")]
pub struct HabitLog {
    entries: BTreeMap<NaiveDate, HabitLogEntry>,
}

impl HabitLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the entry for `entry.date`.
    ///
    /// Returns the replaced entry, if any.
    pub fn upsert(&mut self, entry: HabitLogEntry) -> Option<HabitLogEntry> {
        self.entries.insert(entry.date, entry)
    }

    /// Removes the entry for `date`. Absent dates are a no-op.
    pub fn remove(&mut self, date: NaiveDate) -> Option<HabitLogEntry> {
        self.entries.remove(&date)
    }

    pub fn get(&self, date: NaiveDate) -> Option<&HabitLogEntry> {
        self.entries.get(&date)
    }

    /// Iterates entries in ascending date order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &HabitLogEntry> + '_ {
        self.entries.values()
    }

    /// Iterates dates of completed entries in ascending order.
    pub fn completed_dates(&self) -> impl DoubleEndedIterator<Item = NaiveDate> + '_ {
        self.entries
            .values()
            .filter(|entry| entry.completed)
            .map(|entry| entry.date)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<HabitLogEntry>> for HabitLog {
    fn from(value: Vec<HabitLogEntry>) -> Self {
        let mut log = Self::new();
        for entry in value {
            log.upsert(entry);
        }
        log
    }
}

impl From<HabitLog> for Vec<HabitLogEntry> {
    fn from(value: HabitLog) -> Self {
        value.entries.into_values().collect()
    }
}

impl FromIterator<HabitLogEntry> for HabitLog {
    fn from_iter<T: IntoIterator<Item = HabitLogEntry>>(iter: T) -> Self {
        iter.into_iter().collect::<Vec<_>>().into()
    }
}

/// Canonical persisted habit record.
///
/// Derived progress fields are crate-private; callers read them through
/// accessors and change them only through reconciliation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: HabitId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub frequency: Frequency,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_frequency_details: Option<CustomFrequencyDetails>,
    #[serde(default, deserialize_with = "time_of_day_or_any")]
    pub time_of_day: TimeOfDay,
    #[serde(default)]
    pub(crate) streak: u32,
    #[serde(default)]
    pub(crate) experience: u32,
    #[serde(default = "initial_level")]
    pub(crate) level: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) last_completed_date: Option<NaiveDate>,
    #[serde(default)]
    pub(crate) log: HabitLog,
    #[serde(
        rename = "isAISuggested",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub is_ai_suggested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_rationale: Option<String>,
}

impl Habit {
    /// Creates a habit with a generated ID and zeroed progress.
    ///
    /// # Errors
    /// - Returns `EmptyTitle` / `TitleTooLong` for unusable titles.
    pub fn new(title: &str, frequency: Frequency) -> Result<Self, ValidationError> {
        Self::with_id(Uuid::new_v4(), title, frequency)
    }

    /// Creates a habit with a caller-provided ID and zeroed progress.
    pub fn with_id(id: HabitId, title: &str, frequency: Frequency) -> Result<Self, ValidationError> {
        let title = normalize_title(title)?;
        Ok(Self {
            id,
            title,
            description: None,
            frequency,
            custom_frequency_details: None,
            time_of_day: TimeOfDay::Any,
            streak: 0,
            experience: 0,
            level: initial_level(),
            last_completed_date: None,
            log: HabitLog::new(),
            is_ai_suggested: false,
            ai_rationale: None,
        })
    }

    /// Validates record-level invariants.
    pub fn validate(&self) -> Result<(), ValidationError> {
        normalize_title(&self.title)?;
        if self.level == 0 {
            return Err(ValidationError::InvalidLevel(self.level));
        }

        let rescan = compute_streak(&self.log);
        if rescan.streak != self.streak || rescan.last_completed_date != self.last_completed_date {
            return Err(ValidationError::InconsistentProgress(format!(
                "stored streak {} (last {}) but log gives {} (last {})",
                self.streak,
                display_date(self.last_completed_date),
                rescan.streak,
                display_date(rescan.last_completed_date)
            )));
        }
        // The top level has no further threshold to stay below.
        if self.level < u32::MAX && self.experience >= level_threshold(self.level) {
            return Err(ValidationError::InconsistentProgress(format!(
                "experience {} reaches the level {} threshold {}",
                self.experience,
                self.level,
                level_threshold(self.level)
            )));
        }
        Ok(())
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn experience(&self) -> u32 {
        self.experience
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn last_completed_date(&self) -> Option<NaiveDate> {
        self.last_completed_date
    }

    pub fn log(&self) -> &HabitLog {
        &self.log
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.experience, self.level)
    }

    /// Returns a copy with every derived field replaced in one step.
    pub(crate) fn reconciled(&self, log: HabitLog, summary: StreakSummary, progress: Progress) -> Self {
        Self {
            streak: summary.streak,
            last_completed_date: summary.last_completed_date,
            experience: progress.experience,
            level: progress.level,
            log,
            ..self.clone()
        }
    }
}

/// Trims a title and enforces emptiness/length limits.
pub fn normalize_title(title: &str) -> Result<String, ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    let actual_chars = trimmed.chars().count();
    if actual_chars > MAX_TITLE_CHARS {
        return Err(ValidationError::TitleTooLong {
            max_chars: MAX_TITLE_CHARS,
            actual_chars,
        });
    }
    Ok(trimmed.to_string())
}

fn display_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "none".to_string(), |date| date.to_string())
}

fn initial_level() -> u32 {
    1
}

fn lenient_tag<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| value.parse().ok()))
}

fn time_of_day_or_any<'de, D>(deserializer: D) -> Result<TimeOfDay, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_tag::<D, TimeOfDay>(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::{
        CustomFrequencyDetails, EntryDetails, Habit, HabitLog, HabitLogEntry, Quality,
        ValidationError,
    };
    use chrono::{NaiveDate, Weekday};

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
    }

    #[test]
    fn log_upsert_replaces_same_date() {
        let mut log = HabitLog::new();
        log.upsert(HabitLogEntry::not_completed(day(2)));
        let replaced = log.upsert(HabitLogEntry::completed(day(2), EntryDetails::default()));

        assert_eq!(replaced.map(|entry| entry.completed), Some(false));
        assert_eq!(log.len(), 1);
        assert!(log.get(day(2)).unwrap().completed);
    }

    #[test]
    fn log_iterates_in_date_order_regardless_of_insert_order() {
        let log: HabitLog = [day(3), day(1), day(2)]
            .into_iter()
            .map(|date| HabitLogEntry::completed(date, EntryDetails::default()))
            .collect();

        let dates: Vec<_> = log.iter().map(|entry| entry.date).collect();
        assert_eq!(dates, vec![day(1), day(2), day(3)]);
    }

    #[test]
    fn decoding_duplicate_dates_keeps_last_entry() {
        let value = serde_json::json!([
            { "date": "2024-01-01", "completed": true, "quality": "good" },
            { "date": "2024-01-01", "completed": false }
        ]);

        let log: HabitLog = serde_json::from_value(value).unwrap();
        assert_eq!(log.len(), 1);
        let entry = log.get(day(1)).unwrap();
        assert!(!entry.completed);
        assert_eq!(entry.details.quality, None);
    }

    #[test]
    fn unknown_quality_and_emotion_decode_as_untracked() {
        let value = serde_json::json!({
            "date": "2024-01-05",
            "completed": true,
            "quality": "legendary",
            "emotionBefore": "TIRED",
            "emotionAfter": "ecstatic",
            "durationMinutes": 25
        });

        let entry: HabitLogEntry = serde_json::from_value(value).unwrap();
        assert_eq!(entry.details.quality, None);
        assert_eq!(entry.details.emotion_before, Some(super::Emotion::Tired));
        assert_eq!(entry.details.emotion_after, None);
        assert_eq!(entry.details.duration_minutes, Some(25));
    }

    #[test]
    fn new_habit_trims_title_and_starts_at_level_one() {
        let habit = Habit::new("  Read 10 pages ", super::Frequency::Daily).unwrap();
        assert_eq!(habit.title, "Read 10 pages");
        assert_eq!(habit.level(), 1);
        assert_eq!(habit.streak(), 0);
        assert!(habit.log().is_empty());
    }

    #[test]
    fn new_habit_rejects_blank_title() {
        let err = Habit::new("   ", super::Frequency::Weekly).unwrap_err();
        assert_eq!(err, ValidationError::EmptyTitle);
    }

    #[test]
    fn custom_details_sort_and_dedupe_days() {
        let details =
            CustomFrequencyDetails::from_days([Weekday::Fri, Weekday::Mon, Weekday::Fri]);
        assert_eq!(details.days_of_week, vec![Weekday::Mon, Weekday::Fri]);
    }

    #[test]
    fn quality_parse_is_case_insensitive() {
        assert_eq!(" Excellent ".parse::<Quality>(), Ok(Quality::Excellent));
        assert!("meh".parse::<Quality>().is_err());
    }
}
