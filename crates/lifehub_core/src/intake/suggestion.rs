//! AI habit suggestion intake.
//!
//! # Responsibility
//! - Turn untrusted generative-AI output into fully formed `Habit` values.
//! - Normalize free-text frequency and time-of-day into enumerated types.
//!
//! # Invariants
//! - A suggestion yields either a complete habit or a `ValidationError`,
//!   never a partially populated record.
//! - Admitted habits start with `streak = 0`, `experience = 0`, `level = 1`
//!   and an empty log.
//! - Each item of a batch is validated independently.

use crate::model::habit::{
    normalize_title, CustomFrequencyDetails, Frequency, Habit, TimeOfDay, ValidationError,
};
use chrono::Weekday;
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

static CODE_FENCE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*```[A-Za-z0-9_-]*\s*(.*?)\s*```\s*$").expect("valid code fence regex")
});
static WEEKDAY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(monday|mon|tuesday|tues|tue|wednesday|wed|thursday|thurs|thu|friday|fri|saturday|sat|sunday|sun)s?\b",
    )
    .expect("valid weekday regex")
});

/// Raw proposal shape produced by the suggestion collaborator.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitSuggestion {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ai_rationale: Option<String>,
    #[serde(default)]
    pub frequency: Option<String>,
    #[serde(default)]
    pub time_of_day: Option<String>,
}

impl HabitSuggestion {
    /// Converts the proposal into an admitted habit.
    pub fn into_habit(self) -> Result<Habit, ValidationError> {
        let title = normalize_title(self.title.as_deref().unwrap_or_default())?;
        let (frequency, custom_frequency_details) =
            normalize_frequency(self.frequency.as_deref().unwrap_or_default());

        let mut habit = Habit::new(&title, frequency)?;
        habit.description = non_blank(self.description);
        habit.custom_frequency_details = custom_frequency_details;
        habit.time_of_day = normalize_time_of_day(self.time_of_day.as_deref());
        habit.is_ai_suggested = true;
        habit.ai_rationale = non_blank(self.ai_rationale);
        Ok(habit)
    }
}

/// One suggestion that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionRejection {
    /// Zero-based position inside the upstream array.
    pub index: usize,
    pub error: ValidationError,
}

/// Outcome of validating one collaborator response.
#[derive(Debug, Clone, Default)]
pub struct SuggestionBatch {
    pub accepted: Vec<Habit>,
    pub rejected: Vec<SuggestionRejection>,
}

/// Validates one suggestion object.
///
/// # Errors
/// - `MalformedPayload` when the value is not an object of the expected shape.
/// - `EmptyTitle` / `TitleTooLong` for unusable titles.
pub fn validate_suggestion(payload: &Value) -> Result<Habit, ValidationError> {
    if !payload.is_object() {
        return Err(ValidationError::MalformedPayload(
            "suggestion must be a JSON object".to_string(),
        ));
    }
    let suggestion = HabitSuggestion::deserialize(payload)
        .map_err(|err| ValidationError::MalformedPayload(err.to_string()))?;
    suggestion.into_habit()
}

/// Parses a raw collaborator response into validated habits.
///
/// Accepts a JSON array of suggestions or a single suggestion object, with
/// or without a surrounding Markdown code fence.
///
/// # Errors
/// - `MalformedPayload` when the text is not JSON or not an array/object.
pub fn parse_suggestions(raw: &str) -> Result<SuggestionBatch, ValidationError> {
    let body = strip_code_fence(raw);
    let value: Value = serde_json::from_str(body).map_err(|err| {
        warn!("event=suggestion_intake module=intake status=error error_code=invalid_json");
        ValidationError::MalformedPayload(format!("response is not valid JSON: {err}"))
    })?;

    let items = match value {
        Value::Array(items) => items,
        object @ Value::Object(_) => vec![object],
        _ => {
            return Err(ValidationError::MalformedPayload(
                "expected a JSON array of habit suggestions".to_string(),
            ));
        }
    };

    let mut batch = SuggestionBatch::default();
    for (index, item) in items.iter().enumerate() {
        match validate_suggestion(item) {
            Ok(habit) => batch.accepted.push(habit),
            Err(error) => batch.rejected.push(SuggestionRejection { index, error }),
        }
    }

    info!(
        "event=suggestion_intake module=intake status=ok received={} accepted={} rejected={}",
        items.len(),
        batch.accepted.len(),
        batch.rejected.len()
    );
    Ok(batch)
}

/// Maps free-text frequency onto `Frequency`.
///
/// "daily" and "weekly" are matched as case-insensitive substrings; anything
/// else is custom, with any weekday names picked up as scheduled days.
pub fn normalize_frequency(text: &str) -> (Frequency, Option<CustomFrequencyDetails>) {
    let lowered = text.to_lowercase();
    if lowered.contains("daily") {
        return (Frequency::Daily, None);
    }
    if lowered.contains("weekly") {
        return (Frequency::Weekly, None);
    }

    let days = WEEKDAY_RE
        .captures_iter(&lowered)
        .filter_map(|caps| caps.get(1))
        .filter_map(|name| name.as_str()[..3].parse::<Weekday>().ok());
    let details = CustomFrequencyDetails::from_days(days);
    (Frequency::Custom, (!details.is_empty()).then_some(details))
}

/// Maps free-text time of day, defaulting to `Any`.
pub fn normalize_time_of_day(text: Option<&str>) -> TimeOfDay {
    text.and_then(|value| value.parse().ok()).unwrap_or_default()
}

fn strip_code_fence(raw: &str) -> &str {
    match CODE_FENCE_RE.captures(raw).and_then(|caps| caps.get(1)) {
        Some(body) => body.as_str(),
        None => raw.trim(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
