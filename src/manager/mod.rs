//! Task Manager module
//!
//! Persists lifecycle operations and serves ordered listings.

mod task_manager;

pub use task_manager::{ListQuery, TaskManager};
