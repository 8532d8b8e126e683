//! Background recalculation sweep.
//!
//! Time-varying score inputs (age, deadline distance) drift while nothing
//! happens to a task. The sweep periodically picks up active tasks whose
//! score is older than one interval, in id-keyed batches, and writes fresh
//! scores back. Only `priority_score` and `score_calculated_at` are written.

mod config;
mod runner;

pub use config::{DEFAULT_BATCH_SIZE, DEFAULT_MAX_RETRIES, DEFAULT_SWEEP_INTERVAL, SweepConfig};
pub use runner::{RecalculationSweep, SweepOutcome, SweepReport};
