//! Experience and level progression.
//!
//! # Invariants
//! - Completion events never lower `level`.
//! - Uncompletion events lower experience by a flat amount, floored at zero,
//!   and never touch `level`.
//! - Stored experience is the remainder after all level-ups.

use crate::model::habit::Quality;

/// Experience granted for every completion before streak/quality bonuses.
pub const BASE_COMPLETION_XP: u32 = 10;
/// Extra experience per day of the streak after the completion.
pub const STREAK_XP_PER_DAY: u32 = 2;
/// Experience removed when a completion is taken back.
pub const UNCOMPLETION_PENALTY_XP: u32 = 10;
/// Experience needed to leave level `n` is `n * XP_PER_LEVEL`.
pub const XP_PER_LEVEL: u32 = 100;

/// Experience/level pair carried by a habit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub experience: u32,
    pub level: u32,
}

impl Progress {
    pub const INITIAL: Self = Self {
        experience: 0,
        level: 1,
    };

    /// Creates a progress value, clamping `level` to at least 1.
    pub fn new(experience: u32, level: u32) -> Self {
        Self {
            experience,
            level: level.max(1),
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::INITIAL
    }
}

/// Quality bonus; untracked or low quality earns nothing extra.
pub fn quality_bonus(quality: Option<Quality>) -> u32 {
    match quality {
        Some(Quality::Excellent) => 5,
        Some(Quality::Good) => 2,
        Some(Quality::Fair) | Some(Quality::Poor) | None => 0,
    }
}

/// Experience earned by one completion that leaves the habit at `streak_after`.
pub fn completion_gain(streak_after: u32, quality: Option<Quality>) -> u32 {
    BASE_COMPLETION_XP
        .saturating_add(streak_after.saturating_mul(STREAK_XP_PER_DAY))
        .saturating_add(quality_bonus(quality))
}

/// Experience needed to advance from `level` to the next one.
pub fn level_threshold(level: u32) -> u32 {
    level.max(1).saturating_mul(XP_PER_LEVEL)
}

/// Applies a completion event, carrying over as many level-ups as the gain pays for.
pub fn apply_completion_event(
    progress: Progress,
    streak_after: u32,
    quality: Option<Quality>,
) -> Progress {
    let mut experience = progress
        .experience
        .saturating_add(completion_gain(streak_after, quality));
    let mut level = progress.level.max(1);

    while level < u32::MAX && experience >= level_threshold(level) {
        experience -= level_threshold(level);
        level += 1;
    }

    Progress { experience, level }
}

/// Applies an uncompletion event.
pub fn apply_uncompletion_event(progress: Progress) -> Progress {
    Progress {
        experience: progress.experience.saturating_sub(UNCOMPLETION_PENALTY_XP),
        level: progress.level.max(1),
    }
}

/// Experience still missing before the next level-up.
pub fn experience_to_next_level(progress: Progress) -> u32 {
    level_threshold(progress.level).saturating_sub(progress.experience)
}
