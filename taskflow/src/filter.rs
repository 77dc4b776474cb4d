//! Task filter engine.
//!
//! The filtered view is never stored: it is recomputed from the current
//! task snapshot and the active [`TaskFilter`] every time it is asked for.

use taskflow_proto::{Task, TaskPriority, TaskStatus};

/// The active task-list criteria.
///
/// Every set field restricts the view to an exact match on the task field;
/// unset fields impose nothing. All set fields must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks assigned to this member.
    pub assignee_id: Option<String>,
    /// Only tasks in this project.
    pub project_id: Option<String>,
    /// Only tasks in this status.
    pub status: Option<TaskStatus>,
    /// Only tasks with this priority.
    pub priority: Option<TaskPriority>,
    /// Case-insensitive substring of title, description, or comments.
    pub search: String,
}

impl TaskFilter {
    /// A filter that lets every task through.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts to an assignee. An empty id clears the restriction.
    pub fn set_assignee(&mut self, id: impl Into<String>) {
        self.assignee_id = non_empty(id.into());
    }

    /// Restricts to a project. An empty id clears the restriction.
    pub fn set_project(&mut self, id: impl Into<String>) {
        self.project_id = non_empty(id.into());
    }

    /// Restricts to a status, or clears with `None`.
    pub const fn set_status(&mut self, status: Option<TaskStatus>) {
        self.status = status;
    }

    /// Restricts to a priority, or clears with `None`.
    pub const fn set_priority(&mut self, priority: Option<TaskPriority>) {
        self.priority = priority;
    }

    /// Sets the search text. Empty text clears it.
    pub fn set_search(&mut self, search: impl Into<String>) {
        self.search = search.into();
    }

    /// Clears every restriction.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether no restriction is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignee_id.is_none()
            && self.project_id.is_none()
            && self.status.is_none()
            && self.priority.is_none()
            && self.search.is_empty()
    }

    /// Whether a single task passes every active restriction.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        let fields = &task.fields;
        if !reference_matches(self.assignee_id.as_deref(), fields.assignee_id.as_deref()) {
            return false;
        }
        if !reference_matches(self.project_id.as_deref(), fields.project_id.as_deref()) {
            return false;
        }
        if self.status.is_some_and(|s| s != fields.status) {
            return false;
        }
        if self.priority.is_some_and(|p| p != fields.priority) {
            return false;
        }
        self.search.is_empty() || search_haystack(task).contains(&self.search.to_lowercase())
    }

    /// Returns the tasks that pass, in collection order.
    #[must_use]
    pub fn apply(&self, tasks: &[Task]) -> Vec<Task> {
        tasks.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

fn reference_matches(wanted: Option<&str>, actual: Option<&str>) -> bool {
    wanted.is_none_or(|id| actual == Some(id))
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() { None } else { Some(value) }
}

/// Lower-cased `title description comments`.
fn search_haystack(task: &Task) -> String {
    let f = &task.fields;
    format!("{} {} {}", f.title, f.description, f.comments).to_lowercase()
}
