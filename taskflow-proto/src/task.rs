//! Task records and their mutable field set.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::blank;
use crate::validate::ValidationError;

/// Workflow state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskStatus {
    /// Not started.
    #[default]
    Pending,
    /// Actively being worked on.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Done.
    Completed,
    /// Waiting on something outside the task.
    Blocked,
}

impl TaskStatus {
    /// All statuses in display order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::InProgress, Self::Completed, Self::Blocked];

    /// Wire and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Blocked => "Blocked",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Urgency of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    /// Can wait.
    Low,
    /// Normal priority.
    #[default]
    Medium,
    /// Should be picked up soon.
    High,
    /// Drop everything.
    Urgent,
}

impl TaskPriority {
    /// All priorities in ascending order.
    pub const ALL: [Self; 4] = [Self::Low, Self::Medium, Self::High, Self::Urgent];

    /// Wire and display name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Urgent => "Urgent",
        }
    }
}

impl fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A string did not name a known status or priority.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task {kind}: {value:?}")]
pub struct ParseVariantError {
    /// `"status"` or `"priority"`.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

/// Normalizes `in_progress`, `in-progress` and `IN PROGRESS` to one key.
fn variant_key(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '_' | '-'))
        .flat_map(char::to_lowercase)
        .collect()
}

impl FromStr for TaskStatus {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = variant_key(s);
        Self::ALL
            .into_iter()
            .find(|status| variant_key(status.as_str()) == key)
            .ok_or_else(|| ParseVariantError {
                kind: "status",
                value: s.to_string(),
            })
    }
}

impl FromStr for TaskPriority {
    type Err = ParseVariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = variant_key(s);
        Self::ALL
            .into_iter()
            .find(|priority| variant_key(priority.as_str()) == key)
            .ok_or_else(|| ParseVariantError {
                kind: "priority",
                value: s.to_string(),
            })
    }
}

/// The client-editable fields of a task.
///
/// Used as the create-form state, the edit buffer, and (with an actor
/// attached) the request body. `assignee_id` and `project_id` are weak
/// references: nothing guarantees the named member or project still exists.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskFields {
    /// Short summary; must be non-empty.
    pub title: String,
    /// Free-form description.
    pub description: String,
    /// Workflow state.
    pub status: TaskStatus,
    /// Urgency.
    pub priority: TaskPriority,
    /// Due date, if any.
    #[serde(with = "blank::date")]
    pub due_date: Option<NaiveDate>,
    /// Reminder date, if any.
    #[serde(with = "blank::date")]
    pub reminder_date: Option<NaiveDate>,
    /// Member this task is assigned to.
    #[serde(with = "blank::text")]
    pub assignee_id: Option<String>,
    /// Project this task belongs to.
    #[serde(with = "blank::text")]
    pub project_id: Option<String>,
    /// Running comments.
    pub comments: String,
}

impl TaskFields {
    /// Creates a field set with the given title and defaults elsewhere.
    #[must_use]
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Checks the required fields.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] if the title is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.is_empty() {
            return Err(ValidationError::Empty {
                entity: "task",
                field: "title",
            });
        }
        Ok(())
    }

    /// Attaches the writing actor, producing a request body.
    #[must_use]
    pub fn into_payload(self, updated_by: impl Into<String>) -> TaskPayload {
        TaskPayload {
            fields: self,
            updated_by: updated_by.into(),
        }
    }
}

/// Body of `POST /tasks` and `PUT /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPayload {
    /// The full mutable field set.
    #[serde(flatten)]
    pub fields: TaskFields,
    /// Identity of the writer.
    #[serde(default = "default_actor")]
    pub updated_by: String,
}

fn default_actor() -> String {
    "system".to_string()
}

/// A task as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Service-assigned identifier.
    pub id: String,
    /// Client-editable fields.
    #[serde(flatten)]
    pub fields: TaskFields,
    /// Newline-separated write log kept by the service.
    #[serde(default)]
    pub history: String,
    /// Creation timestamp (ISO 8601, service clock).
    #[serde(default)]
    pub created_at: String,
    /// Last write timestamp (ISO 8601, service clock).
    #[serde(default)]
    pub updated_at: String,
}

impl Task {
    /// Creates a task with no service metadata. Mostly useful in tests.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: TaskFields) -> Self {
        Self {
            id: id.into(),
            fields,
            history: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }
}
