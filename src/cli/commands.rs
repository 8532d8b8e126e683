//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - add/edit/rm: task records
//! - bump/start/pause/done/reopen: lifecycle moves
//! - show/list: read side, in priority order
//! - sweep/daemon: score recalculation

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use taskrank::domain::Effort;

/// Taskrank - priority-ordered personal task list
#[derive(Parser, Debug)]
#[command(name = "taskrank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute; lists tasks when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a task
    Add {
        title: String,

        /// Importance from 0 to 100
        #[arg(short, long)]
        priority: Option<i32>,

        /// Due date (YYYY-MM-DD or RFC 3339)
        #[arg(short, long, value_parser = parse_due)]
        due: Option<DateTime<Utc>>,

        /// small, medium, large or xlarge
        #[arg(short, long)]
        effort: Option<Effort>,
    },

    /// Change fields of a task
    Edit {
        id: String,

        #[arg(short, long)]
        title: Option<String>,

        #[arg(short, long)]
        priority: Option<i32>,

        #[arg(short, long, value_parser = parse_due, conflicts_with = "clear_due")]
        due: Option<DateTime<Utc>>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        #[arg(short, long, conflicts_with = "clear_effort")]
        effort: Option<Effort>,

        /// Remove the effort estimate
        #[arg(long)]
        clear_effort: bool,
    },

    /// Put a task off once more
    Bump { id: String },

    /// Move a task to in progress
    Start { id: String },

    /// Move an in-progress task back to todo
    Pause { id: String },

    /// Complete a task
    Done { id: String },

    /// Move a done task back to todo
    Reopen { id: String },

    /// Delete a task
    Rm { id: String },

    /// Show one task with its score breakdown
    Show {
        id: String,

        /// Also print the task's event history
        #[arg(long)]
        events: bool,
    },

    /// List tasks by priority
    List {
        /// Only tasks at risk
        #[arg(short, long)]
        at_risk: bool,

        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Tasks per page (defaults to listing.page-size)
        #[arg(long)]
        per_page: Option<usize>,

        /// Include done tasks
        #[arg(long)]
        all: bool,
    },

    /// Rescore stale tasks once
    Sweep,

    /// Rescore stale tasks periodically until interrupted
    Daemon,
}

/// Parse `YYYY-MM-DD` (midnight UTC) or a full RFC 3339 timestamp.
pub fn parse_due(s: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| format!("invalid date '{}': expected YYYY-MM-DD or RFC 3339", s))
}
