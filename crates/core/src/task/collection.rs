//! The authoritative in-memory task collection
//!
//! Tasks are kept in insertion order. Every mutation validates its input
//! before touching the collection, so a failed call leaves it unchanged.

use chrono::Utc;
use tracing::debug;

use super::model::{NewTask, Task, TaskPatch};
use super::query::{self, TaskPage, TaskQuery};
use super::validate::{validate_new_task, validate_patch};
use crate::{Error, Result};

/// A stored task and its insertion sequence number
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub seq: u64,
    pub task: Task,
}

/// Task collection with unique titles
#[derive(Debug, Default)]
pub struct TaskCollection {
    entries: Vec<Entry>,
    next_seq: u64,
}

impl TaskCollection {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tasks in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.entries.iter().map(|entry| &entry.task)
    }

    fn index_of(&self, title: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.task.title == title)
    }

    /// Add a task at the end of the collection
    pub fn create(&mut self, task: NewTask) -> Result<Task> {
        validate_new_task(&task)?;
        if self.index_of(&task.title).is_some() {
            return Err(Error::DuplicateTitle(task.title));
        }

        let task = task.into_task(Utc::now());
        self.entries.push(Entry {
            seq: self.next_seq,
            task: task.clone(),
        });
        self.next_seq += 1;

        debug!(title = %task.title, size = self.entries.len(), "task created");
        Ok(task)
    }

    /// Get a task by title
    pub fn get_by_title(&self, title: &str) -> Result<Task> {
        self.index_of(title)
            .map(|index| self.entries[index].task.clone())
            .ok_or_else(|| Error::TaskNotFound(title.to_string()))
    }

    /// Overwrite the fields set in `patch`, keeping the task in place
    pub fn update(&mut self, title: &str, patch: TaskPatch) -> Result<Task> {
        let index = self
            .index_of(title)
            .ok_or_else(|| Error::TaskNotFound(title.to_string()))?;
        validate_patch(&patch)?;

        let task = &mut self.entries[index].task;
        patch.apply(task, Utc::now());

        debug!(title = %task.title, "task updated");
        Ok(task.clone())
    }

    /// Remove a task, returning it
    pub fn delete(&mut self, title: &str) -> Result<Task> {
        let index = self
            .index_of(title)
            .ok_or_else(|| Error::TaskNotFound(title.to_string()))?;
        let removed = self.entries.remove(index);

        debug!(title = %removed.task.title, size = self.entries.len(), "task deleted");
        Ok(removed.task)
    }

    /// Filter, search, sort and paginate the collection
    pub fn query(&self, query: &TaskQuery) -> Result<TaskPage> {
        query::run(&self.entries, query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Pagination, SortField, SortOrder, TaskPriority, TaskStatus};

    fn task(title: &str, status: TaskStatus, priority: u8) -> NewTask {
        NewTask::new(title, format!("{title} description"))
            .with_status(status)
            .with_priority(TaskPriority::new(i64::from(priority)).unwrap())
    }

    fn titles(page: &TaskPage) -> Vec<&str> {
        page.items.iter().map(|t| t.title.as_str()).collect()
    }

    fn groceries() -> TaskCollection {
        let mut tasks = TaskCollection::new();
        tasks.create(task("Buy milk", TaskStatus::Pending, 3)).unwrap();
        tasks.create(task("Buy bread", TaskStatus::Completed, 1)).unwrap();
        tasks.create(task("Walk dog", TaskStatus::Pending, 5)).unwrap();
        tasks
    }

    #[test]
    fn test_create_and_get() {
        let mut tasks = TaskCollection::new();
        let created = tasks
            .create(task("First", TaskStatus::Pending, 2))
            .unwrap();
        tasks.create(task("Second", TaskStatus::InProgress, 4)).unwrap();

        assert_eq!(tasks.len(), 2);
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(tasks.get_by_title("First").unwrap(), created);
        assert_eq!(
            tasks.get_by_title("Second").unwrap().status,
            TaskStatus::InProgress
        );
    }

    #[test]
    fn test_duplicate_title_leaves_collection_unchanged() {
        let mut tasks = groceries();
        let before: Vec<Task> = tasks.iter().cloned().collect();

        let result = tasks.create(task("Buy milk", TaskStatus::Completed, 5));
        match result {
            Err(Error::DuplicateTitle(title)) => assert_eq!(title, "Buy milk"),
            other => panic!("Expected DuplicateTitle error, got: {:?}", other),
        }

        let after: Vec<Task> = tasks.iter().cloned().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_invalid_fields_are_rejected_without_mutation() {
        let mut tasks = groceries();

        let long_title = NewTask::new("t".repeat(101), "fine");
        let blank_description = NewTask::new("Fine title", "");

        for candidate in [long_title, blank_description] {
            assert!(matches!(
                tasks.create(candidate),
                Err(Error::Validation { .. })
            ));
        }
        assert_eq!(tasks.len(), 3);
    }

    #[test]
    fn test_get_missing_task() {
        let tasks = groceries();
        assert!(matches!(
            tasks.get_by_title("buy milk"),
            Err(Error::TaskNotFound(_))
        ));
    }

    #[test]
    fn test_update_preserves_title_and_position() {
        let mut tasks = groceries();
        let original = tasks.get_by_title("Buy bread").unwrap();

        let updated = tasks
            .update(
                "Buy bread",
                TaskPatch::new()
                    .with_status(TaskStatus::InProgress)
                    .with_description("Sourdough"),
            )
            .unwrap();

        assert_eq!(updated.title, "Buy bread");
        assert_eq!(updated.status, TaskStatus::InProgress);
        assert_eq!(updated.description, "Sourdough");
        assert_eq!(updated.priority, original.priority);
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);

        let order: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
        assert_eq!(order, vec!["Buy milk", "Buy bread", "Walk dog"]);
    }

    #[test]
    fn test_update_errors() {
        let mut tasks = groceries();

        assert!(matches!(
            tasks.update("Nope", TaskPatch::new().with_priority(TaskPriority::HIGH)),
            Err(Error::TaskNotFound(_))
        ));

        let before = tasks.get_by_title("Walk dog").unwrap();
        assert!(matches!(
            tasks.update(
                "Walk dog",
                TaskPatch::new()
                    .with_description("d".repeat(1001))
                    .with_status(TaskStatus::Completed)
            ),
            Err(Error::Validation { field: "description", .. })
        ));
        assert_eq!(tasks.get_by_title("Walk dog").unwrap(), before);
    }

    #[test]
    fn test_delete() {
        let mut tasks = groceries();

        let removed = tasks.delete("Buy milk").unwrap();
        assert_eq!(removed.title, "Buy milk");
        assert_eq!(tasks.len(), 2);
        assert!(matches!(
            tasks.get_by_title("Buy milk"),
            Err(Error::TaskNotFound(_))
        ));
        assert!(matches!(tasks.delete("Buy milk"), Err(Error::TaskNotFound(_))));

        let page = tasks.query(&TaskQuery::new()).unwrap();
        assert_eq!(titles(&page), vec!["Buy bread", "Walk dog"]);
    }

    #[test]
    fn test_title_can_be_reused_after_delete() {
        let mut tasks = groceries();
        tasks.delete("Buy milk").unwrap();
        tasks.create(task("Buy milk", TaskStatus::Pending, 2)).unwrap();

        let page = tasks.query(&TaskQuery::new()).unwrap();
        assert_eq!(titles(&page), vec!["Buy bread", "Walk dog", "Buy milk"]);
    }

    #[test]
    fn test_query_filter_and_search() {
        let tasks = groceries();

        let page = tasks
            .query(&TaskQuery::new().with_status(TaskStatus::Pending).with_search("buy"))
            .unwrap();
        assert_eq!(titles(&page), vec!["Buy milk"]);
        assert_eq!(page.total, 1);
        assert!(!page.has_more);

        let page = tasks
            .query(&TaskQuery::new().with_priority(TaskPriority::VERY_HIGH))
            .unwrap();
        assert_eq!(titles(&page), vec!["Walk dog"]);
    }

    #[test]
    fn test_search_matches_description_case_insensitively() {
        let mut tasks = TaskCollection::new();
        tasks
            .create(NewTask::new("Chores", "Vacuum the LIVING room"))
            .unwrap();
        tasks.create(NewTask::new("Errands", "Post office")).unwrap();

        let page = tasks
            .query(&TaskQuery::new().with_search("living"))
            .unwrap();
        assert_eq!(titles(&page), vec!["Chores"]);

        // regex metacharacters are matched literally
        let page = tasks.query(&TaskQuery::new().with_search(".*")).unwrap();
        assert!(page.items.is_empty());

        let page = tasks.query(&TaskQuery::new().with_search("")).unwrap();
        assert_eq!(page.total, 2);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut tasks = TaskCollection::new();
        tasks.create(task("Zebra", TaskStatus::Pending, 2)).unwrap();
        tasks.create(task("Apple", TaskStatus::Pending, 4)).unwrap();
        tasks.create(task("Mango", TaskStatus::Pending, 2)).unwrap();

        let asc = tasks
            .query(&TaskQuery::new().sorted_by(SortField::Priority, SortOrder::Asc))
            .unwrap();
        assert_eq!(titles(&asc), vec!["Zebra", "Mango", "Apple"]);

        let desc = tasks
            .query(&TaskQuery::new().sorted_by(SortField::Priority, SortOrder::Desc))
            .unwrap();
        assert_eq!(titles(&desc), vec!["Apple", "Zebra", "Mango"]);

        let by_title = tasks
            .query(&TaskQuery::new().sorted_by(SortField::Title, SortOrder::Asc))
            .unwrap();
        assert_eq!(titles(&by_title), vec!["Apple", "Mango", "Zebra"]);
    }

    #[test]
    fn test_sort_by_status_uses_wire_names() {
        let mut tasks = TaskCollection::new();
        tasks.create(task("p", TaskStatus::Pending, 1)).unwrap();
        tasks.create(task("c", TaskStatus::Completed, 1)).unwrap();
        tasks.create(task("i", TaskStatus::InProgress, 1)).unwrap();

        let page = tasks
            .query(&TaskQuery::new().sorted_by(SortField::Status, SortOrder::Asc))
            .unwrap();
        assert_eq!(titles(&page), vec!["c", "i", "p"]);
    }

    #[test]
    fn test_offset_pagination() {
        let tasks = groceries();

        let page = tasks
            .query(&TaskQuery::new().with_page(Pagination::offset(0, 2)))
            .unwrap();
        assert_eq!(titles(&page), vec!["Buy milk", "Buy bread"]);
        assert_eq!(page.total, 3);
        assert_eq!(page.skip, Some(0));
        assert!(page.has_more);
        assert!(page.next_cursor.is_none());

        let page = tasks
            .query(&TaskQuery::new().with_page(Pagination::offset(2, 2)))
            .unwrap();
        assert_eq!(titles(&page), vec!["Walk dog"]);
        assert!(!page.has_more);

        let page = tasks
            .query(&TaskQuery::new().with_page(Pagination::offset(5, 2)))
            .unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total, 3);
        assert!(!page.has_more);
    }

    #[test]
    fn test_pagination_bounds() {
        let tasks = groceries();

        for page in [
            Pagination::offset(-1, 2),
            Pagination::offset(0, 0),
            Pagination::offset(0, -4),
            Pagination::offset(0, 101),
            Pagination::first_page(0),
        ] {
            assert!(
                matches!(
                    tasks.query(&TaskQuery::new().with_page(page.clone())),
                    Err(Error::Validation { .. })
                ),
                "{page:?} should be rejected"
            );
        }
    }

    fn walk_cursor_pages(tasks: &TaskCollection, base: TaskQuery, limit: i64) -> Vec<String> {
        let mut seen = Vec::new();
        let mut page = tasks
            .query(&base.clone().with_page(Pagination::first_page(limit)))
            .unwrap();
        loop {
            seen.extend(page.items.iter().map(|t| t.title.clone()));
            match page.next_cursor.clone() {
                Some(cursor) => {
                    assert!(page.has_more);
                    page = tasks
                        .query(&base.clone().with_page(Pagination::after(cursor, limit)))
                        .unwrap();
                }
                None => {
                    assert!(!page.has_more);
                    break;
                }
            }
        }
        seen
    }

    #[test]
    fn test_cursor_pages_continue_the_sequence() {
        let mut tasks = TaskCollection::new();
        for (i, priority) in [3, 1, 3, 5, 1, 3, 2].into_iter().enumerate() {
            let status = if i % 2 == 0 {
                TaskStatus::Pending
            } else {
                TaskStatus::Completed
            };
            tasks.create(task(&format!("Task {i}"), status, priority)).unwrap();
        }

        let queries = [
            TaskQuery::new(),
            TaskQuery::new().sorted_by(SortField::Priority, SortOrder::Asc),
            TaskQuery::new().sorted_by(SortField::Priority, SortOrder::Desc),
            TaskQuery::new().sorted_by(SortField::Title, SortOrder::Desc),
            TaskQuery::new()
                .with_status(TaskStatus::Pending)
                .sorted_by(SortField::Status, SortOrder::Asc),
        ];

        for base in queries {
            let all = tasks
                .query(&base.clone().with_page(Pagination::offset(0, 100)))
                .unwrap();
            let expected: Vec<String> = all.items.iter().map(|t| t.title.clone()).collect();
            for limit in 1..=3 {
                assert_eq!(
                    walk_cursor_pages(&tasks, base.clone(), limit),
                    expected,
                    "{base:?} with limit {limit}"
                );
            }
        }
    }

    #[test]
    fn test_cursor_survives_deleted_last_item() {
        let mut tasks = TaskCollection::new();
        for (title, priority) in [("a", 2), ("b", 1), ("c", 2), ("d", 1), ("e", 3)] {
            tasks.create(task(title, TaskStatus::Pending, priority)).unwrap();
        }
        let query = TaskQuery::new().sorted_by(SortField::Priority, SortOrder::Asc);

        let first = tasks
            .query(&query.clone().with_page(Pagination::first_page(2)))
            .unwrap();
        assert_eq!(titles(&first), vec!["b", "d"]);

        // the last item served disappears before the next page is requested
        tasks.delete("d").unwrap();

        let cursor = first.next_cursor.unwrap();
        let second = tasks
            .query(&query.with_page(Pagination::after(cursor, 2)))
            .unwrap();
        assert_eq!(titles(&second), vec!["a", "c"]);
        assert!(second.has_more);
    }

    #[test]
    fn test_invalid_cursors() {
        let tasks = groceries();

        assert!(matches!(
            tasks.query(&TaskQuery::new().with_page(Pagination::after("%%%", 2))),
            Err(Error::InvalidCursor(_))
        ));

        let unsorted = tasks
            .query(&TaskQuery::new().with_page(Pagination::first_page(1)))
            .unwrap();
        let cursor = unsorted.next_cursor.unwrap();
        assert!(matches!(
            tasks.query(
                &TaskQuery::new()
                    .sorted_by(SortField::Title, SortOrder::Asc)
                    .with_page(Pagination::after(cursor, 1))
            ),
            Err(Error::InvalidCursor(_))
        ));
    }

    #[test]
    fn test_cursor_rejected_under_different_filter() {
        let mut tasks = TaskCollection::new();
        tasks.create(task("a", TaskStatus::Completed, 3)).unwrap();
        tasks.create(task("b", TaskStatus::Pending, 3)).unwrap();
        tasks.create(task("c", TaskStatus::Completed, 3)).unwrap();
        tasks.create(task("d", TaskStatus::Pending, 3)).unwrap();

        let pending = tasks
            .query(
                &TaskQuery::new()
                    .with_status(TaskStatus::Pending)
                    .with_page(Pagination::first_page(1)),
            )
            .unwrap();
        assert_eq!(titles(&pending), vec!["b"]);
        let cursor = pending.next_cursor.unwrap();

        // resuming "completed" after "b" would silently skip "a"
        match tasks.query(
            &TaskQuery::new()
                .with_status(TaskStatus::Completed)
                .with_page(Pagination::after(cursor.clone(), 5)),
        ) {
            Err(Error::InvalidCursor(message)) => assert!(message.contains("filter")),
            other => panic!("Expected InvalidCursor error, got: {:?}", other),
        }
        assert!(matches!(
            tasks.query(&TaskQuery::new().with_page(Pagination::after(cursor.clone(), 5))),
            Err(Error::InvalidCursor(_))
        ));

        // the issuing filter still resumes
        let rest = tasks
            .query(
                &TaskQuery::new()
                    .with_status(TaskStatus::Pending)
                    .with_page(Pagination::after(cursor, 5)),
            )
            .unwrap();
        assert_eq!(titles(&rest), vec!["d"]);
    }

    #[test]
    fn test_cursor_rejected_under_different_search() {
        let tasks = groceries();
        let first = tasks
            .query(
                &TaskQuery::new()
                    .with_search("BUY")
                    .with_page(Pagination::first_page(1)),
            )
            .unwrap();
        assert_eq!(titles(&first), vec!["Buy milk"]);
        let cursor = first.next_cursor.unwrap();

        assert!(matches!(
            tasks.query(
                &TaskQuery::new()
                    .with_search("walk")
                    .with_page(Pagination::after(cursor.clone(), 5))
            ),
            Err(Error::InvalidCursor(_))
        ));

        // search is case-insensitive, so the cursor survives a change of case
        let rest = tasks
            .query(
                &TaskQuery::new()
                    .with_search("buy")
                    .with_page(Pagination::after(cursor, 5)),
            )
            .unwrap();
        assert_eq!(titles(&rest), vec!["Buy bread"]);
    }

    #[test]
    fn test_blank_cursor_starts_from_beginning() {
        let tasks = groceries();
        let page = tasks
            .query(&TaskQuery::new().with_page(Pagination::after("  ", 2)))
            .unwrap();
        assert_eq!(titles(&page), vec!["Buy milk", "Buy bread"]);
        assert!(page.next_cursor.is_some());
    }
}
