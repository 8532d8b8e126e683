//! Storage layer for taskrank.
//!
//! Records live in JSONL files, one per collection, behind the `Storage`
//! trait. `TaskStore` wraps any backend with the task queries the engine
//! needs.

mod jsonl;
mod tasks;
mod traits;

pub use jsonl::JsonlStorage;
pub use tasks::{EVENTS_COLLECTION, TASKS_COLLECTION, TaskStore};
pub use traits::{Filter, FilterOp, HasId, Storage};
