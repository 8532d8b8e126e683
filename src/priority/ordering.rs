//! Task ordering and pagination for listings.
//!
//! Ordering trusts the persisted scores and never recalculates. Primary key is
//! `priority_score` descending; ties go to the newer `created_at`. The sort is
//! stable, so fully identical keys keep their input order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::domain::Task;
use crate::priority::risk::compute_risk;

/// Default number of tasks per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Comparator used everywhere tasks are listed.
pub fn compare_tasks(a: &Task, b: &Task) -> Ordering {
    b.priority_score
        .total_cmp(&a.priority_score)
        .then_with(|| b.created_at.cmp(&a.created_at))
}

/// Sort tasks into display order.
pub fn order_tasks(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(compare_tasks);
    tasks
}

/// Drop done and deleted tasks, then order the rest.
pub fn rank_active(tasks: Vec<Task>) -> Vec<Task> {
    order_tasks(tasks.into_iter().filter(Task::is_active).collect())
}

/// Keep only the at-risk tasks, preserving the incoming order.
pub fn filter_at_risk(tasks: Vec<Task>, now: DateTime<Utc>) -> Vec<Task> {
    tasks.into_iter().filter(|t| compute_risk(t, now)).collect()
}

/// One page of an ordered listing
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub items: Vec<Task>,
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl Page {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }
}

/// Order tasks and cut out one page.
///
/// `page` is 1-based; page 0 is treated as page 1 and a zero `per_page`
/// falls back to [`DEFAULT_PAGE_SIZE`]. Pages past the end are empty.
pub fn paginate(tasks: Vec<Task>, page: usize, per_page: usize) -> Page {
    let page = page.max(1);
    let per_page = if per_page == 0 { DEFAULT_PAGE_SIZE } else { per_page };
    let total_items = tasks.len();
    let total_pages = total_items.div_ceil(per_page);

    let items = order_tasks(tasks)
        .into_iter()
        .skip((page - 1) * per_page)
        .take(per_page)
        .collect();

    Page {
        items,
        page,
        per_page,
        total_items,
        total_pages,
    }
}
