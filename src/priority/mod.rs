//! Priority scoring, risk classification and ordering.
//!
//! This module provides the three pure call shapes the rest of the
//! application uses:
//! - **`compute_score`**: task snapshot and `now` to a score in [0, 100]
//! - **`compute_risk`**: task snapshot and `now` to the at-risk flag
//! - **`order_tasks`**: scored snapshots to display order
//!
//! None of these touch storage or read the clock; they are safe to call
//! from any thread.

mod calculator;
mod ordering;
mod risk;

pub use calculator::{
    BUMP_PENALTY_MAX, BUMP_PENALTY_PER_BUMP, DEADLINE_STEEP_DAYS, DEADLINE_WINDOW_DAYS, SCORE_MAX, SCORE_MIN,
    ScoreBreakdown, TIME_DECAY_FULL_DAYS, WEIGHT_BUMP_PENALTY, WEIGHT_DEADLINE_URGENCY, WEIGHT_TIME_DECAY,
    WEIGHT_USER_PRIORITY, bump_penalty, compute_score, deadline_urgency, effort_boost, score_breakdown,
    time_decay, urgency_for_days,
};
pub use ordering::{DEFAULT_PAGE_SIZE, Page, compare_tasks, filter_at_risk, order_tasks, paginate, rank_active};
pub use risk::{AT_RISK_BUMP_THRESHOLD, AT_RISK_DEADLINE_DAYS, RiskReason, compute_risk, risk_reason};
