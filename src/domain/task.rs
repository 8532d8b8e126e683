//! Task record and related types
//!
//! A `Task` is the snapshot the engine reads and writes. The engine never owns
//! storage: callers hand it a snapshot and persist whatever comes back.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::id::generate_task_id;

/// Default importance for a task created without an explicit priority.
pub const DEFAULT_USER_PRIORITY: i32 = 50;
/// Lowest accepted user priority.
pub const MIN_USER_PRIORITY: i32 = 0;
/// Highest accepted user priority.
pub const MAX_USER_PRIORITY: i32 = 100;

/// The task snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    //=== Identity ===
    /// Unique identifier (creation timestamp + random suffix: "1738300800123-a1b2")
    pub id: String,

    /// Free text shown to the user
    pub title: String,

    //=== Scoring inputs ===
    /// Caller-supplied importance, 0..=100
    pub user_priority: i32,

    /// Optional deadline; absence means no deadline pressure
    pub due_date: Option<DateTime<Utc>>,

    /// Optional effort estimate; absence means no multiplier
    pub estimated_effort: Option<Effort>,

    /// Times the user explicitly delayed this task
    pub bump_count: i32,

    //=== Scoring outputs ===
    /// Last computed score, 0..=100 with two decimals
    pub priority_score: f64,

    /// When `priority_score` was last computed
    pub score_calculated_at: Option<DateTime<Utc>>,

    //=== Lifecycle ===
    pub status: TaskStatus,

    //=== Timestamps ===
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    /// Soft-delete marker
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Workflow status of a task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    /// Returns true once the task no longer takes part in scoring
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Done)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Done => "done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "todo" => Ok(TaskStatus::Todo),
            "in_progress" | "in-progress" => Ok(TaskStatus::InProgress),
            "done" => Ok(TaskStatus::Done),
            other => Err(ValidationError::UnknownStatus(other.to_string())),
        }
    }
}

/// Estimated effort; a closed set so an unknown value never silently scores as 1.0
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effort {
    Small,
    Medium,
    Large,
    XLarge,
}

impl Effort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Effort::Small => "small",
            Effort::Medium => "medium",
            Effort::Large => "large",
            Effort::XLarge => "xlarge",
        }
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Effort {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(Effort::Small),
            "medium" => Ok(Effort::Medium),
            "large" => Ok(Effort::Large),
            "xlarge" => Ok(Effort::XLarge),
            other => Err(ValidationError::UnknownEffort(other.to_string())),
        }
    }
}

impl Task {
    /// Create an unscored todo task with the default priority
    pub fn new(title: &str, created_at: DateTime<Utc>) -> Self {
        Self {
            id: generate_task_id(created_at),
            title: title.to_string(),
            user_priority: DEFAULT_USER_PRIORITY,
            due_date: None,
            estimated_effort: None,
            bump_count: 0,
            priority_score: 0.0,
            score_calculated_at: None,
            status: TaskStatus::Todo,
            created_at,
            updated_at: created_at,
            completed_at: None,
            deleted_at: None,
        }
    }

    pub fn with_priority(mut self, user_priority: i32) -> Self {
        self.user_priority = user_priority;
        self
    }

    pub fn with_due_date(mut self, due_date: DateTime<Utc>) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_effort(mut self, effort: Effort) -> Self {
        self.estimated_effort = Some(effort);
        self
    }

    pub fn with_bumps(mut self, bump_count: i32) -> Self {
        self.bump_count = bump_count;
        self
    }

    /// Active tasks are the ones ranked and swept: not done, not deleted
    pub fn is_active(&self) -> bool {
        !self.status.is_terminal() && self.deleted_at.is_none()
    }

    /// Check the fields the engine relies on.
    ///
    /// The engine never clamps inputs; a bad snapshot is rejected as-is.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(MIN_USER_PRIORITY..=MAX_USER_PRIORITY).contains(&self.user_priority) {
            return Err(ValidationError::PriorityOutOfRange(self.user_priority));
        }
        if self.bump_count < 0 {
            return Err(ValidationError::NegativeBumpCount(self.bump_count));
        }
        if self.title.trim().is_empty() {
            return Err(ValidationError::EmptyTitle);
        }
        Ok(())
    }

    /// Update the modification timestamp
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}
