use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use taskrank::config::Config;
use taskrank::domain::{EventRecord, Task, TaskStatus};
use taskrank::lifecycle::{TaskDraft, TaskUpdate};
use taskrank::manager::{ListQuery, TaskManager};
use taskrank::priority::{Page, RiskReason, risk_reason, score_breakdown};
use taskrank::storage::JsonlStorage;
use taskrank::sweep::{RecalculationSweep, SweepOutcome};
use tokio_util::sync::CancellationToken;

mod cli;

use cli::Cli;
use cli::commands::Commands;

fn setup_logging() -> Result<()> {
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("taskrank")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("taskrank.log");

    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn open_storage(config: &Config) -> Result<Arc<JsonlStorage>> {
    let storage = JsonlStorage::new(&config.storage.dir)
        .context(format!("Failed to open storage at {}", config.storage.dir.display()))?;
    Ok(Arc::new(storage))
}

fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{} {}", "Storage:".yellow(), config.storage.dir.display());
    }

    let storage = open_storage(config)?;
    let manager = TaskManager::new(storage.clone());
    let now = Utc::now();

    match &cli.command {
        None => handle_list_command(&manager, ListQuery::default(), config, now),
        Some(Commands::Add {
            title,
            priority,
            due,
            effort,
        }) => {
            let draft = TaskDraft {
                title: title.clone(),
                user_priority: *priority,
                due_date: *due,
                estimated_effort: *effort,
            };
            let task = manager.add(draft, now)?;
            println!("{} {} {}", "Added:".green(), task.id.dimmed(), task.title);
            print_score(&task);
            Ok(())
        }
        Some(Commands::Edit {
            id,
            title,
            priority,
            due,
            clear_due,
            effort,
            clear_effort,
        }) => {
            let changes = TaskUpdate {
                title: title.clone(),
                user_priority: *priority,
                due_date: if *clear_due { Some(None) } else { due.map(Some) },
                estimated_effort: if *clear_effort { Some(None) } else { effort.map(Some) },
            };
            if changes.is_empty() {
                println!("{}", "Nothing to change".yellow());
                return Ok(());
            }
            let task = manager.edit(id, &changes, now)?;
            println!("{} {}", "Updated:".green(), task.title);
            print_score(&task);
            Ok(())
        }
        Some(Commands::Bump { id }) => {
            let task = manager.bump(id, now)?;
            println!("{} {} (bumped {} times)", "Bumped:".yellow(), task.title, task.bump_count);
            print_score(&task);
            if let Some(reason) = risk_reason(&task, now) {
                println!("  {} {}", "At risk:".red().bold(), describe_risk(reason));
            }
            Ok(())
        }
        Some(Commands::Start { id }) => {
            let task = manager.start(id, now)?;
            println!("{} {}", "Started:".cyan(), task.title);
            Ok(())
        }
        Some(Commands::Pause { id }) => {
            let task = manager.pause(id, now)?;
            println!("{} {}", "Paused:".yellow(), task.title);
            Ok(())
        }
        Some(Commands::Done { id }) => {
            let completion = manager.complete(id, now)?;
            if completion.event.is_some() {
                println!("{} {}", "Done:".green().bold(), completion.task.title);
            } else {
                println!("{} {}", "Already done:".dimmed(), completion.task.title);
            }
            Ok(())
        }
        Some(Commands::Reopen { id }) => {
            let task = manager.reopen(id, now)?;
            println!("{} {}", "Reopened:".cyan(), task.title);
            print_score(&task);
            Ok(())
        }
        Some(Commands::Rm { id }) => {
            if manager.remove(id, now)? {
                println!("{} {}", "Deleted:".red(), id);
            } else {
                println!("{} {}", "Already deleted:".dimmed(), id);
            }
            Ok(())
        }
        Some(Commands::Show { id, events }) => handle_show_command(&manager, id, *events, now),
        Some(Commands::List {
            at_risk,
            page,
            per_page,
            all,
        }) => {
            let query = ListQuery {
                at_risk: *at_risk,
                include_done: *all,
                page: *page,
                per_page: per_page.unwrap_or(config.listing.page_size),
            };
            handle_list_command(&manager, query, config, now)
        }
        Some(Commands::Sweep) => handle_sweep_command(storage, config, now),
        Some(Commands::Daemon) => handle_daemon_command(storage, config),
    }
}

fn print_score(task: &Task) {
    println!("  {} {:.2}", "Score:".bold(), task.priority_score);
}

fn describe_risk(reason: RiskReason) -> &'static str {
    match reason {
        RiskReason::ChronicDelay => "bumped repeatedly",
        RiskReason::DeadlineNear => "due within 3 days",
        RiskReason::Both => "bumped repeatedly and due within 3 days",
    }
}

fn status_label(status: TaskStatus) -> ColoredString {
    match status {
        TaskStatus::Todo => status.as_str().normal(),
        TaskStatus::InProgress => status.as_str().cyan(),
        TaskStatus::Done => status.as_str().green(),
    }
}

fn handle_show_command(manager: &TaskManager<JsonlStorage>, id: &str, show_events: bool, now: DateTime<Utc>) -> Result<()> {
    let task = manager.get(id)?;
    let breakdown = score_breakdown(&task, now);

    println!("{} {}", task.title.bold(), task.id.dimmed());
    println!("  {:<16} {}", "status", status_label(task.status));
    println!("  {:<16} {}", "priority", task.user_priority);
    if let Some(due) = task.due_date {
        println!("  {:<16} {}", "due", due.format("%Y-%m-%d %H:%M"));
    }
    if let Some(effort) = task.estimated_effort {
        println!("  {:<16} {}", "effort", effort);
    }
    println!("  {:<16} {}", "bumps", task.bump_count);
    println!("  {:<16} {:.2}", "stored score", task.priority_score);
    match task.score_calculated_at {
        Some(at) => println!("  {:<16} {}", "scored at", at.format("%Y-%m-%d %H:%M")),
        None => println!("  {:<16} {}", "scored at", "never".dimmed()),
    }

    println!("{}", "Score now:".bold());
    println!("  {:<16} {:.2}", "user priority", breakdown.user_priority);
    println!("  {:<16} {:.2}", "time decay", breakdown.time_decay);
    println!("  {:<16} {:.2}", "urgency", breakdown.deadline_urgency);
    println!("  {:<16} {:.2}", "bump penalty", breakdown.bump_penalty);
    println!("  {:<16} x{:.2}", "effort boost", breakdown.effort_boost);
    println!("  {:<16} {:.2}", "score", breakdown.score);

    if let Some(reason) = risk_reason(&task, now) {
        println!("  {} {}", "At risk:".red().bold(), describe_risk(reason));
    }

    if show_events {
        println!("{}", "Events:".bold());
        for event in manager.events(id)? {
            print_event(&event);
        }
    }
    Ok(())
}

fn print_event(event: &EventRecord) {
    println!(
        "  {} {} {}",
        event.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        event.event_type,
        event.payload
    );
}

fn handle_list_command(
    manager: &TaskManager<JsonlStorage>,
    query: ListQuery,
    config: &Config,
    now: DateTime<Utc>,
) -> Result<()> {
    let query = ListQuery {
        page: query.page.max(1),
        per_page: if query.per_page == 0 { config.listing.page_size } else { query.per_page },
        ..query
    };
    info!("Listing tasks: {:?}", query);
    let page = manager.list(query, now)?;
    print_page(&page, now);
    Ok(())
}

fn print_page(page: &Page, now: DateTime<Utc>) {
    if page.items.is_empty() {
        println!("{}", "No tasks".dimmed());
        return;
    }

    for task in &page.items {
        let flag = if risk_reason(task, now).is_some() {
            "!".red().bold()
        } else {
            " ".normal()
        };
        let title = if task.status == TaskStatus::Done {
            task.title.dimmed()
        } else {
            task.title.normal()
        };
        println!(
            "{} {:>6.2}  {:<12} {}  {}",
            flag,
            task.priority_score,
            status_label(task.status),
            title,
            task.id.dimmed()
        );
    }

    println!(
        "{}",
        format!(
            "page {}/{} ({} tasks)",
            page.page,
            page.total_pages.max(1),
            page.total_items
        )
        .dimmed()
    );
}

fn handle_sweep_command(storage: Arc<JsonlStorage>, config: &Config, now: DateTime<Utc>) -> Result<()> {
    let sweep = RecalculationSweep::with_config(storage, config.sweep.to_sweep_config());
    match sweep.sweep_once(now)? {
        SweepOutcome::Completed(report) => {
            println!(
                "{} scanned {}, updated {}, skipped {}, failed {}",
                "Sweep:".cyan(),
                report.scanned,
                report.updated,
                report.skipped_inactive,
                report.failed
            );
        }
        SweepOutcome::Skipped => println!("{}", "Sweep already running".yellow()),
    }
    Ok(())
}

fn handle_daemon_command(storage: Arc<JsonlStorage>, config: &Config) -> Result<()> {
    if !config.sweep.enabled {
        println!("{}", "Sweep is disabled in config (sweep.enabled: false)".yellow());
        return Ok(());
    }

    let sweep = RecalculationSweep::with_config(storage, config.sweep.to_sweep_config());
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    println!(
        "{} every {}s, Ctrl-C to stop",
        "Sweeping:".cyan(),
        sweep.config().interval.as_secs()
    );

    runtime.block_on(async {
        let cancel = CancellationToken::new();
        let stopper = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Received Ctrl-C, stopping sweep");
                stopper.cancel();
            }
        });
        sweep.run(cancel).await;
    });

    println!("{}", "Stopped".dimmed());
    Ok(())
}

fn main() -> Result<()> {
    setup_logging().context("Failed to setup logging")?;

    let cli = Cli::parse();

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    run_application(&cli, &config).context("Application failed")?;

    Ok(())
}
