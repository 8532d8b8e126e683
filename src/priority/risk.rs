//! At-risk classification.
//!
//! A task is at risk when it has been bumped three or more times, or when it
//! is due within the next three days (overdue included). The rule reads the
//! snapshot only and never looks at the numeric score.

use chrono::{DateTime, Duration, Utc};

use crate::domain::Task;

/// Bumps at which a task counts as chronically delayed.
pub const AT_RISK_BUMP_THRESHOLD: i32 = 3;
/// Deadline proximity window in days.
pub const AT_RISK_DEADLINE_DAYS: i64 = 3;

/// Why a task was flagged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskReason {
    ChronicDelay,
    DeadlineNear,
    Both,
}

/// Classify a task at `now`; `None` means not at risk.
pub fn risk_reason(task: &Task, now: DateTime<Utc>) -> Option<RiskReason> {
    let delayed = task.bump_count >= AT_RISK_BUMP_THRESHOLD;
    let deadline_near = task
        .due_date
        .is_some_and(|due| due < now + Duration::days(AT_RISK_DEADLINE_DAYS));

    match (delayed, deadline_near) {
        (true, true) => Some(RiskReason::Both),
        (true, false) => Some(RiskReason::ChronicDelay),
        (false, true) => Some(RiskReason::DeadlineNear),
        (false, false) => None,
    }
}

pub fn compute_risk(task: &Task, now: DateTime<Utc>) -> bool {
    risk_reason(task, now).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn task() -> Task {
        Task::new("task", now())
    }

    #[test]
    fn test_due_soon_is_at_risk() {
        let t = task().with_due_date(now() + Duration::days(2));
        assert!(compute_risk(&t, now()));
        assert_eq!(risk_reason(&t, now()), Some(RiskReason::DeadlineNear));
    }

    #[test]
    fn test_heavily_bumped_without_deadline_is_at_risk() {
        let t = task().with_bumps(5);
        assert!(compute_risk(&t, now()));
        assert_eq!(risk_reason(&t, now()), Some(RiskReason::ChronicDelay));
    }

    #[test]
    fn test_distant_deadline_is_not_at_risk() {
        let t = task().with_due_date(now() + Duration::days(10));
        assert!(!compute_risk(&t, now()));
    }

    #[test]
    fn test_bump_threshold_is_inclusive() {
        assert!(!compute_risk(&task().with_bumps(2), now()));
        assert!(compute_risk(&task().with_bumps(3), now()));
    }

    #[test]
    fn test_deadline_window_is_exclusive() {
        let exactly = task().with_due_date(now() + Duration::days(3));
        assert!(!compute_risk(&exactly, now()));

        let just_inside = task().with_due_date(now() + Duration::days(3) - Duration::seconds(1));
        assert!(compute_risk(&just_inside, now()));
    }

    #[test]
    fn test_overdue_is_at_risk() {
        let t = task().with_due_date(now() - Duration::days(4));
        assert!(compute_risk(&t, now()));
    }

    #[test]
    fn test_both_reasons() {
        let t = task().with_bumps(4).with_due_date(now() + Duration::hours(1));
        assert_eq!(risk_reason(&t, now()), Some(RiskReason::Both));
    }

    #[test]
    fn test_risk_ignores_score() {
        let mut t = task().with_priority(100);
        t.priority_score = 99.0;
        assert!(!compute_risk(&t, now()));
    }
}
