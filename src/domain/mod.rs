//! Domain types for taskrank
//!
//! - Task: the snapshot the engine scores, with its status and effort enums
//! - EventRecord: lifecycle events (completion feeds the streak tracker)

pub mod event;
pub mod task;

pub use event::{EventRecord, event_types};
pub use task::{DEFAULT_USER_PRIORITY, Effort, MAX_USER_PRIORITY, MIN_USER_PRIORITY, Task, TaskStatus};
