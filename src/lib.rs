//! Taskrank - priority scoring and lifecycle engine for a personal task list
//!
//! Every task carries a score in [0, 100] blended from the user's own
//! priority, the task's age, deadline proximity and how often it was put
//! off, boosted for small efforts. Lifecycle operations rescore in the same
//! call; a periodic sweep keeps time-driven inputs fresh.

pub mod config;
pub mod domain;
pub mod error;
pub mod id;
pub mod lifecycle;
pub mod manager;
pub mod priority;
pub mod storage;
pub mod sweep;

pub use error::{Result, TaskrankError};
