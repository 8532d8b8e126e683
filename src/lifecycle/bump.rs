//! Bump tracking: explicit "I'm delaying this" actions.

use chrono::{DateTime, Utc};

use crate::domain::Task;
use crate::error::Result;
use crate::lifecycle::apply_score;

/// Increments a task's delay counter and rescores it.
///
/// There is no un-bump; the counter only moves up.
#[derive(Debug, Clone, Copy, Default)]
pub struct BumpTracker;

impl BumpTracker {
    pub fn new() -> Self {
        Self
    }

    /// Bump a task once.
    ///
    /// Done tasks come back unchanged.
    pub fn bump(&self, task: &Task, now: DateTime<Utc>) -> Result<Task> {
        task.validate()?;

        let mut bumped = task.clone();
        if bumped.status.is_terminal() {
            log::debug!("Ignoring bump of done task {}", bumped.id);
            return Ok(bumped);
        }

        bumped.bump_count = bumped.bump_count.saturating_add(1);
        apply_score(&mut bumped, now);
        bumped.touch(now);

        log::info!(
            "Bumped task {} (bumps={}, score={:.2})",
            bumped.id,
            bumped.bump_count,
            bumped.priority_score
        );
        Ok(bumped)
    }
}
