//! Priority score calculation.
//!
//! A task's score blends four factors and one multiplier:
//! - User priority (weight 0.4)
//! - Time decay: linear ramp to 100 over the first 30 days (weight 0.3)
//! - Deadline urgency: piecewise ramp over the last 7 days, 100 once overdue (weight 0.2)
//! - Bump penalty: +10 per bump, capped at 50 (weight 0.1)
//! - Effort boost: multiplier applied after the weighted sum
//!
//! The result is clamped to [0, 100] and rounded to two decimals. Every
//! function here is pure; `now` is always passed in.

use chrono::{DateTime, Utc};

use crate::domain::{Effort, Task};

pub const WEIGHT_USER_PRIORITY: f64 = 0.4;
pub const WEIGHT_TIME_DECAY: f64 = 0.3;
pub const WEIGHT_DEADLINE_URGENCY: f64 = 0.2;
pub const WEIGHT_BUMP_PENALTY: f64 = 0.1;

/// Days until time decay saturates at 100.
pub const TIME_DECAY_FULL_DAYS: f64 = 30.0;

/// Final stretch where urgency climbs steeply from 50 to 100.
pub const DEADLINE_STEEP_DAYS: f64 = 3.0;
/// Outer window where urgency climbs gently from 0 to 50.
pub const DEADLINE_WINDOW_DAYS: f64 = 7.0;

/// Penalty points per bump.
pub const BUMP_PENALTY_PER_BUMP: f64 = 10.0;
/// Maximum bump penalty.
pub const BUMP_PENALTY_MAX: f64 = 50.0;

pub const SCORE_MIN: f64 = 0.0;
pub const SCORE_MAX: f64 = 100.0;

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Every intermediate value behind a score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreBreakdown {
    pub user_priority: f64,
    pub time_decay: f64,
    pub deadline_urgency: f64,
    pub bump_penalty: f64,
    pub effort_boost: f64,
    /// Weighted sum times effort boost, before clamping and rounding
    pub raw: f64,
    /// Final clamped and rounded score
    pub score: f64,
}

/// Fractional days from `from` to `to`; negative when `to` is earlier.
fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / MILLIS_PER_DAY
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Age contribution in [0, 100].
pub fn time_decay(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = days_between(created_at, now).max(0.0);
    (days / TIME_DECAY_FULL_DAYS * 100.0).min(100.0)
}

/// Deadline contribution in [0, 100] for a given number of days until due.
///
/// Both inner branches evaluate to exactly 50 at three days out.
pub fn urgency_for_days(days_until_due: f64) -> f64 {
    if days_until_due < 0.0 {
        100.0
    } else if days_until_due <= DEADLINE_STEEP_DAYS {
        100.0 - (days_until_due / DEADLINE_STEEP_DAYS) * 50.0
    } else if days_until_due <= DEADLINE_WINDOW_DAYS {
        ((DEADLINE_WINDOW_DAYS - days_until_due) / (DEADLINE_WINDOW_DAYS - DEADLINE_STEEP_DAYS)) * 50.0
    } else {
        0.0
    }
}

/// Deadline contribution in [0, 100]; zero without a due date.
pub fn deadline_urgency(due_date: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match due_date {
        Some(due) => urgency_for_days(days_between(now, due)),
        None => 0.0,
    }
}

/// Delay contribution in [0, 50].
pub fn bump_penalty(bump_count: i32) -> f64 {
    (bump_count.max(0) as f64 * BUMP_PENALTY_PER_BUMP).min(BUMP_PENALTY_MAX)
}

/// Multiplier for the estimated effort; no estimate means no adjustment.
pub fn effort_boost(effort: Option<Effort>) -> f64 {
    match effort {
        Some(Effort::Small) => 1.3,
        Some(Effort::Medium) => 1.15,
        Some(Effort::Large) => 1.0,
        Some(Effort::XLarge) => 0.95,
        None => 1.0,
    }
}

/// Compute the full breakdown for a task at `now`.
pub fn score_breakdown(task: &Task, now: DateTime<Utc>) -> ScoreBreakdown {
    let user_priority = task.user_priority as f64;
    let time_decay = time_decay(task.created_at, now);
    let deadline_urgency = deadline_urgency(task.due_date, now);
    let bump_penalty = bump_penalty(task.bump_count);
    let effort_boost = effort_boost(task.estimated_effort);

    let weighted = user_priority * WEIGHT_USER_PRIORITY
        + time_decay * WEIGHT_TIME_DECAY
        + deadline_urgency * WEIGHT_DEADLINE_URGENCY
        + bump_penalty * WEIGHT_BUMP_PENALTY;
    let raw = weighted * effort_boost;

    ScoreBreakdown {
        user_priority,
        time_decay,
        deadline_urgency,
        bump_penalty,
        effort_boost,
        raw,
        score: round2(raw.clamp(SCORE_MIN, SCORE_MAX)),
    }
}

/// Compute the priority score for a task at `now`.
///
/// Total over valid snapshots: never panics, always in [0, 100].
pub fn compute_score(task: &Task, now: DateTime<Utc>) -> f64 {
    score_breakdown(task, now).score
}
