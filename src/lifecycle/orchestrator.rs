//! Lifecycle orchestrator: validates snapshots, moves status and rescores.
//!
//! Status machine: `todo <-> in_progress -> done`. Once done, scoring calls
//! (edit, bump, recalculate, complete) hand the task back without rescoring;
//! `reopen` is the only way back to an active status.

use chrono::{DateTime, Utc};

use crate::domain::{EventRecord, Task, TaskStatus};
use crate::error::{Result, ValidationError};
use crate::lifecycle::bump::BumpTracker;
use crate::lifecycle::{Completion, TaskDraft, TaskUpdate, apply_score};
use crate::priority::compute_risk;

/// Stateless; cheap to construct and share between request handlers.
#[derive(Debug, Clone, Copy, Default)]
pub struct LifecycleOrchestrator {
    bumps: BumpTracker,
}

impl LifecycleOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a new todo task and give it its initial score.
    pub fn create(&self, draft: TaskDraft, now: DateTime<Utc>) -> Result<Task> {
        let mut task = Task::new(&draft.title, now);
        if let Some(priority) = draft.user_priority {
            task.user_priority = priority;
        }
        task.due_date = draft.due_date;
        task.estimated_effort = draft.estimated_effort;
        task.validate()?;

        apply_score(&mut task, now);
        log::info!("Created task {} (score={:.2})", task.id, task.priority_score);
        Ok(task)
    }

    /// Apply a field edit.
    ///
    /// Scoring inputs trigger a synchronous recompute. On a done task an edit
    /// that touches a scoring input is a no-op, so a later reopen scores the
    /// inputs the task was completed with.
    pub fn update(&self, task: &Task, changes: &TaskUpdate, now: DateTime<Utc>) -> Result<Task> {
        task.validate()?;

        let mut updated = task.clone();
        if changes.is_empty() {
            return Ok(updated);
        }
        if task.status.is_terminal() && changes.touches_score() {
            log::debug!("Ignoring scoring edit on done task {}", task.id);
            return Ok(updated);
        }

        if let Some(title) = &changes.title {
            updated.title = title.clone();
        }
        if let Some(priority) = changes.user_priority {
            updated.user_priority = priority;
        }
        if let Some(due_date) = changes.due_date {
            updated.due_date = due_date;
        }
        if let Some(effort) = changes.estimated_effort {
            updated.estimated_effort = effort;
        }
        updated.validate()?;

        if changes.touches_score() {
            apply_score(&mut updated, now);
            log::debug!("Rescored task {} after edit (score={:.2})", updated.id, updated.priority_score);
        }
        updated.touch(now);
        Ok(updated)
    }

    /// Record one explicit delay.
    pub fn bump(&self, task: &Task, now: DateTime<Utc>) -> Result<Task> {
        self.bumps.bump(task, now)
    }

    /// Move a todo task into progress.
    pub fn start(&self, task: &Task, now: DateTime<Utc>) -> Result<Task> {
        self.transition(task, TaskStatus::InProgress, now)
    }

    /// Move an in-progress task back to todo.
    pub fn pause(&self, task: &Task, now: DateTime<Utc>) -> Result<Task> {
        self.transition(task, TaskStatus::Todo, now)
    }

    /// Mark a task done and emit the completion event.
    ///
    /// Completing an already-done task returns it unchanged with no event.
    pub fn complete(&self, task: &Task, now: DateTime<Utc>) -> Result<Completion> {
        task.validate()?;

        let mut done = task.clone();
        if done.status.is_terminal() {
            return Ok(Completion { task: done, event: None });
        }

        let was_at_risk = compute_risk(&done, now);
        done.status = TaskStatus::Done;
        done.completed_at = Some(now);
        done.touch(now);

        let event = EventRecord::task_completed(&done, was_at_risk, now);
        log::info!("Completed task {} (bumps={}, at_risk={})", done.id, done.bump_count, was_at_risk);
        Ok(Completion {
            task: done,
            event: Some(event),
        })
    }

    /// Bring a done task back to todo and rescore it.
    ///
    /// The bump count carries over. Active tasks come back unchanged.
    pub fn reopen(&self, task: &Task, now: DateTime<Utc>) -> Result<Task> {
        task.validate()?;

        let mut reopened = task.clone();
        if !reopened.status.is_terminal() {
            return Ok(reopened);
        }

        reopened.status = TaskStatus::Todo;
        reopened.completed_at = None;
        apply_score(&mut reopened, now);
        reopened.touch(now);
        log::info!("Reopened task {} (score={:.2})", reopened.id, reopened.priority_score);
        Ok(reopened)
    }

    /// Recompute the score with no other change; done tasks are left alone.
    pub fn recalculate(&self, task: &Task, now: DateTime<Utc>) -> Result<Task> {
        task.validate()?;

        let mut rescored = task.clone();
        if rescored.is_active() {
            apply_score(&mut rescored, now);
        }
        Ok(rescored)
    }

    fn transition(&self, task: &Task, to: TaskStatus, now: DateTime<Utc>) -> Result<Task> {
        task.validate()?;

        if task.status == to {
            return Ok(task.clone());
        }
        if task.status.is_terminal() {
            return Err(ValidationError::InvalidTransition {
                id: task.id.clone(),
                from: task.status.to_string(),
                to: to.to_string(),
            }
            .into());
        }

        let mut moved = task.clone();
        moved.status = to;
        apply_score(&mut moved, now);
        moved.touch(now);
        log::debug!("Task {} moved {} -> {}", moved.id, task.status, to);
        Ok(moved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Effort;
    use crate::error::TaskrankError;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 12, 0, 0).unwrap()
    }

    fn orchestrator() -> LifecycleOrchestrator {
        LifecycleOrchestrator::new()
    }

    fn created(draft: TaskDraft) -> Task {
        orchestrator().create(draft, now()).unwrap()
    }

    #[test]
    fn test_create_scores_default_priority() {
        let task = created(TaskDraft::new("Write report"));

        assert_eq!(task.user_priority, 50);
        assert_eq!(task.bump_count, 0);
        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority_score, 20.0);
        assert_eq!(task.score_calculated_at, Some(now()));
    }

    #[test]
    fn test_create_with_small_effort() {
        let task = created(TaskDraft::new("Reply to email").with_effort(Effort::Small));
        assert_eq!(task.priority_score, 26.0);
    }

    #[test]
    fn test_create_rejects_out_of_range_priority() {
        let err = orchestrator()
            .create(TaskDraft::new("a").with_priority(101), now())
            .unwrap_err();
        assert!(matches!(
            err,
            TaskrankError::Validation(ValidationError::PriorityOutOfRange(101))
        ));
    }

    #[test]
    fn test_create_rejects_empty_title() {
        let err = orchestrator().create(TaskDraft::new(""), now()).unwrap_err();
        assert!(matches!(err, TaskrankError::Validation(ValidationError::EmptyTitle)));
    }

    #[test]
    fn test_priority_edit_rescores() {
        let task = created(TaskDraft::new("a"));
        let later = now() + Duration::hours(1);
        let changes = TaskUpdate {
            user_priority: Some(100),
            ..TaskUpdate::default()
        };

        let updated = orchestrator().update(&task, &changes, later).unwrap();
        assert_eq!(updated.user_priority, 100);
        assert!(updated.priority_score > task.priority_score);
        assert_eq!(updated.score_calculated_at, Some(later));
        assert_eq!(updated.updated_at, later);
    }

    #[test]
    fn test_due_date_edit_rescores() {
        let task = created(TaskDraft::new("a").with_priority(0));
        let changes = TaskUpdate {
            due_date: Some(Some(now())),
            ..TaskUpdate::default()
        };

        let updated = orchestrator().update(&task, &changes, now()).unwrap();
        assert_eq!(updated.priority_score, 20.0);

        let cleared = orchestrator()
            .update(
                &updated,
                &TaskUpdate {
                    due_date: Some(None),
                    ..TaskUpdate::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(cleared.priority_score, 0.0);
    }

    #[test]
    fn test_title_edit_keeps_score() {
        let task = created(TaskDraft::new("a"));
        let later = now() + Duration::days(10);
        let changes = TaskUpdate {
            title: Some("b".to_string()),
            ..TaskUpdate::default()
        };

        let updated = orchestrator().update(&task, &changes, later).unwrap();
        assert_eq!(updated.title, "b");
        assert_eq!(updated.priority_score, task.priority_score);
        assert_eq!(updated.score_calculated_at, task.score_calculated_at);
    }

    #[test]
    fn test_update_rejects_invalid_priority_without_clamping() {
        let task = created(TaskDraft::new("a"));
        let changes = TaskUpdate {
            user_priority: Some(-5),
            ..TaskUpdate::default()
        };
        let err = orchestrator().update(&task, &changes, now()).unwrap_err();
        assert!(matches!(
            err,
            TaskrankError::Validation(ValidationError::PriorityOutOfRange(-5))
        ));
    }

    #[test]
    fn test_bump_via_orchestrator() {
        let task = created(TaskDraft::new("a").with_priority(0));
        let bumped = orchestrator().bump(&task, now()).unwrap();
        assert_eq!(bumped.bump_count, 1);
        assert_eq!(bumped.priority_score, 1.0);
    }

    #[test]
    fn test_complete_emits_event() {
        let task = created(TaskDraft::new("a").with_due_date(now() + Duration::days(1)));
        let later = now() + Duration::hours(2);

        let completion = orchestrator().complete(&task, later).unwrap();
        assert_eq!(completion.task.status, TaskStatus::Done);
        assert_eq!(completion.task.completed_at, Some(later));

        let event = completion.event.unwrap();
        assert!(event.is_completion());
        assert_eq!(event.task_id, task.id);
        assert_eq!(event.payload["was_at_risk"], true);
        assert_eq!(event.payload["on_time"], true);
    }

    #[test]
    fn test_complete_twice_is_noop() {
        let task = created(TaskDraft::new("a"));
        let first = orchestrator().complete(&task, now()).unwrap();
        let second = orchestrator().complete(&first.task, now() + Duration::days(1)).unwrap();

        assert_eq!(second.task, first.task);
        assert!(second.event.is_none());
    }

    #[test]
    fn test_done_task_is_not_rescored() {
        let task = created(TaskDraft::new("a"));
        let done = orchestrator().complete(&task, now()).unwrap().task;
        let much_later = now() + Duration::days(40);

        let recalculated = orchestrator().recalculate(&done, much_later).unwrap();
        assert_eq!(recalculated, done);

        let bumped = orchestrator().bump(&done, much_later).unwrap();
        assert_eq!(bumped.bump_count, 0);
        assert_eq!(bumped.priority_score, done.priority_score);

        let edited = orchestrator()
            .update(
                &done,
                &TaskUpdate {
                    user_priority: Some(100),
                    ..TaskUpdate::default()
                },
                much_later,
            )
            .unwrap();
        assert_eq!(edited, done);
    }

    #[test]
    fn test_scoring_edit_on_done_task_survives_reopen() {
        let task = created(TaskDraft::new("a").with_priority(20));
        let done = orchestrator().complete(&task, now()).unwrap().task;

        let edited = orchestrator()
            .update(
                &done,
                &TaskUpdate {
                    user_priority: Some(100),
                    due_date: Some(Some(now())),
                    ..TaskUpdate::default()
                },
                now(),
            )
            .unwrap();
        assert_eq!(edited, done);

        let reopened = orchestrator().reopen(&edited, now()).unwrap();
        assert_eq!(reopened.user_priority, 20);
        assert_eq!(reopened.due_date, None);
        assert_eq!(reopened.priority_score, 8.0);
    }

    #[test]
    fn test_title_edit_on_done_task_applies() {
        let task = created(TaskDraft::new("a"));
        let done = orchestrator().complete(&task, now()).unwrap().task;

        let renamed = orchestrator()
            .update(
                &done,
                &TaskUpdate {
                    title: Some("b".to_string()),
                    ..TaskUpdate::default()
                },
                now() + Duration::days(1),
            )
            .unwrap();
        assert_eq!(renamed.title, "b");
        assert_eq!(renamed.priority_score, done.priority_score);
        assert_eq!(renamed.status, TaskStatus::Done);
    }

    #[test]
    fn test_start_and_pause() {
        let task = created(TaskDraft::new("a"));

        let started = orchestrator().start(&task, now()).unwrap();
        assert_eq!(started.status, TaskStatus::InProgress);

        let again = orchestrator().start(&started, now()).unwrap();
        assert_eq!(again, started);

        let paused = orchestrator().pause(&started, now()).unwrap();
        assert_eq!(paused.status, TaskStatus::Todo);
    }

    #[test]
    fn test_start_done_task_is_invalid_transition() {
        let task = created(TaskDraft::new("a"));
        let done = orchestrator().complete(&task, now()).unwrap().task;

        let err = orchestrator().start(&done, now()).unwrap_err();
        assert!(matches!(
            err,
            TaskrankError::Validation(ValidationError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_reopen_keeps_bumps_and_rescores() {
        let task = created(TaskDraft::new("a").with_priority(0));
        let bumped = orchestrator().bump(&task, now()).unwrap();
        let done = orchestrator().complete(&bumped, now()).unwrap().task;

        let later = now() + Duration::days(15);
        let reopened = orchestrator().reopen(&done, later).unwrap();

        assert_eq!(reopened.status, TaskStatus::Todo);
        assert_eq!(reopened.bump_count, 1);
        assert!(reopened.completed_at.is_none());
        // 15 days of decay (50 * 0.3) + one bump (10 * 0.1)
        assert_eq!(reopened.priority_score, 16.0);
    }

    #[test]
    fn test_reopen_active_task_is_noop() {
        let task = created(TaskDraft::new("a"));
        assert_eq!(orchestrator().reopen(&task, now()).unwrap(), task);
    }

    #[test]
    fn test_malformed_snapshot_fails_fast() {
        let task = Task::new("a", now()).with_bumps(-3);
        let err = orchestrator().recalculate(&task, now()).unwrap_err();
        assert!(matches!(
            err,
            TaskrankError::Validation(ValidationError::NegativeBumpCount(-3))
        ));
    }
}
