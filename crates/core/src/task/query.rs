//! Query pipeline: filter, search, sort and paginate
//!
//! Every stage preserves the relative order of the stage before it, so the
//! result order is fully determined by the sort key and insertion order.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::collection::Entry;
use super::cursor::{Cursor, Scope};
use super::model::{Task, TaskPriority, TaskStatus};
use crate::{Error, Result};

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_LIMIT: i64 = 10;

/// Largest page a caller may request
pub const MAX_PAGE_LIMIT: i64 = 100;

/// Field a query can be sorted by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortField {
    Title,
    Status,
    Priority,
}

impl SortField {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Status => "status",
            Self::Priority => "priority",
        }
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortField {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "title" => Ok(Self::Title),
            "status" => Ok(Self::Status),
            "priority" => Ok(Self::Priority),
            _ => Err(Error::validation(
                "sort_by",
                format!("'{s}' is not one of title, status, priority"),
            )),
        }
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl FromStr for SortOrder {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(Error::validation(
                "sort_order",
                format!("'{s}' is not one of asc, desc"),
            )),
        }
    }
}

/// Exact-match filters. Unset fields impose no constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        self.status.map_or(true, |status| task.status == status)
            && self.priority.map_or(true, |priority| task.priority == priority)
    }
}

/// How the sorted result is cut into a page
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pagination {
    /// Skip `skip` tasks, then take up to `limit`
    Offset { skip: i64, limit: i64 },
    /// Resume after the position encoded in `cursor`, then take up to `limit`.
    /// `None` starts from the beginning.
    Cursor { cursor: Option<String>, limit: i64 },
}

impl Default for Pagination {
    fn default() -> Self {
        Self::Offset {
            skip: 0,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl Pagination {
    pub fn offset(skip: i64, limit: i64) -> Self {
        Self::Offset { skip, limit }
    }

    pub fn first_page(limit: i64) -> Self {
        Self::Cursor {
            cursor: None,
            limit,
        }
    }

    pub fn after(cursor: impl Into<String>, limit: i64) -> Self {
        Self::Cursor {
            cursor: Some(cursor.into()),
            limit,
        }
    }

    pub fn limit(&self) -> i64 {
        match self {
            Self::Offset { limit, .. } | Self::Cursor { limit, .. } => *limit,
        }
    }

    fn checked_limit(&self) -> Result<usize> {
        let limit = self.limit();
        if limit <= 0 {
            return Err(Error::validation("limit", "must be greater than 0"));
        }
        if limit > MAX_PAGE_LIMIT {
            return Err(Error::validation(
                "limit",
                format!("must be at most {MAX_PAGE_LIMIT}"),
            ));
        }
        Ok(limit as usize)
    }
}

/// A combined filter/search/sort/paginate request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskQuery {
    pub filter: TaskFilter,
    pub search: Option<String>,
    pub sort_by: Option<SortField>,
    pub sort_order: SortOrder,
    pub page: Pagination,
}

impl TaskQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only keep tasks with this status
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.filter.status = Some(status);
        self
    }

    /// Only keep tasks with this priority
    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.filter.priority = Some(priority);
        self
    }

    /// Case-insensitive substring match on title or description
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn sorted_by(mut self, field: SortField, order: SortOrder) -> Self {
        self.sort_by = Some(field);
        self.sort_order = order;
        self
    }

    pub fn with_page(mut self, page: Pagination) -> Self {
        self.page = page;
        self
    }
}

/// One page of query results plus pagination metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskPage {
    pub items: Vec<Task>,
    /// Matching tasks before pagination
    pub total: usize,
    /// Offset mode only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<usize>,
    pub limit: usize,
    pub has_more: bool,
    /// Cursor mode only, present while `has_more` is true
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

/// Value of the sort key for one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SortKey {
    Title(String),
    Status(TaskStatus),
    Priority(TaskPriority),
}

impl SortKey {
    fn of(task: &Task, field: SortField) -> Self {
        match field {
            SortField::Title => Self::Title(task.title.clone()),
            SortField::Status => Self::Status(task.status),
            SortField::Priority => Self::Priority(task.priority),
        }
    }

    pub(crate) fn field(&self) -> SortField {
        match self {
            Self::Title(_) => SortField::Title,
            Self::Status(_) => SortField::Status,
            Self::Priority(_) => SortField::Priority,
        }
    }

    fn cmp_task(&self, task: &Task) -> Ordering {
        match self {
            Self::Title(title) => title.as_str().cmp(task.title.as_str()),
            Self::Status(status) => status.as_str().cmp(task.status.as_str()),
            Self::Priority(priority) => priority.cmp(&task.priority),
        }
    }
}

/// Status sorts by its wire name, so completed < in-progress < pending.
fn cmp_by_field(a: &Task, b: &Task, field: SortField) -> Ordering {
    match field {
        SortField::Title => a.title.cmp(&b.title),
        SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        SortField::Priority => a.priority.cmp(&b.priority),
    }
}

fn directed(ordering: Ordering, order: SortOrder) -> Ordering {
    match order {
        SortOrder::Asc => ordering,
        SortOrder::Desc => ordering.reverse(),
    }
}

/// Where a task sits in a sorted result: its key (if sorted) then its
/// insertion sequence as the tie-breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Position {
    #[serde(rename = "k")]
    pub key: Option<SortKey>,
    #[serde(rename = "s")]
    pub seq: u64,
}

impl Position {
    fn of(entry: &Entry, sort_by: Option<SortField>) -> Self {
        Self {
            key: sort_by.map(|field| SortKey::of(&entry.task, field)),
            seq: entry.seq,
        }
    }

    /// Order of this position relative to `entry` in the result ordering
    fn cmp_entry(&self, entry: &Entry, order: SortOrder) -> Ordering {
        let by_key = match &self.key {
            Some(key) => directed(key.cmp_task(&entry.task), order),
            None => Ordering::Equal,
        };
        by_key.then(self.seq.cmp(&entry.seq))
    }
}

fn matches_search(task: &Task, needle: &str) -> bool {
    task.title.to_lowercase().contains(needle) || task.description.to_lowercase().contains(needle)
}

/// Run `query` over entries held in insertion order.
pub(crate) fn run(entries: &[Entry], query: &TaskQuery) -> Result<TaskPage> {
    let limit = query.page.checked_limit()?;
    if let Pagination::Offset { skip, .. } = query.page {
        if skip < 0 {
            return Err(Error::validation("skip", "must not be negative"));
        }
    }

    let needle = query
        .search
        .as_deref()
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase);

    let mut matching: Vec<&Entry> = entries
        .iter()
        .filter(|entry| query.filter.matches(&entry.task))
        .filter(|entry| needle.as_deref().map_or(true, |n| matches_search(&entry.task, n)))
        .collect();

    // slice::sort_by is stable, so ties keep insertion order in both directions
    if let Some(field) = query.sort_by {
        matching.sort_by(|a, b| directed(cmp_by_field(&a.task, &b.task, field), query.sort_order));
    }

    let total = matching.len();

    let page = match &query.page {
        Pagination::Offset { skip, .. } => {
            let skip = *skip as usize;
            let items: Vec<Task> = matching
                .iter()
                .skip(skip)
                .take(limit)
                .map(|entry| entry.task.clone())
                .collect();
            let has_more = skip.saturating_add(items.len()) < total;
            TaskPage {
                items,
                total,
                skip: Some(skip),
                limit,
                has_more,
                next_cursor: None,
            }
        }
        Pagination::Cursor { cursor, .. } => {
            let scope = Scope {
                status: query.filter.status,
                priority: query.filter.priority,
                search: needle.clone(),
            };
            let start = match cursor.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
                Some(token) => {
                    let cursor = Cursor::decode(token)?;
                    cursor.check_compatible(&scope, query.sort_by, query.sort_order)?;
                    // Entries at or before the cursor position were already served
                    matching.partition_point(|entry| {
                        cursor.position.cmp_entry(entry, query.sort_order) != Ordering::Less
                    })
                }
                None => 0,
            };
            let end = start.saturating_add(limit).min(total);
            let window = &matching[start..end];
            let has_more = end < total;
            let next_cursor = match window.last() {
                Some(last) if has_more => Some(
                    Cursor {
                        order: query.sort_order,
                        scope,
                        position: Position::of(last, query.sort_by),
                    }
                    .encode()?,
                ),
                _ => None,
            };
            TaskPage {
                items: window.iter().map(|entry| entry.task.clone()).collect(),
                total,
                skip: None,
                limit,
                has_more,
                next_cursor,
            }
        }
    };

    debug!(
        total = page.total,
        returned = page.items.len(),
        has_more = page.has_more,
        "task query evaluated"
    );
    Ok(page)
}
