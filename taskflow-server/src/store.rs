//! In-memory record sheets.
//!
//! The [`RecordStore`] holds the four collections the service exposes.
//! Every successful write appends one activity entry. Deletes never
//! cascade: tasks keep whatever assignee or project id they had, even when
//! that record is gone.

use chrono::{NaiveDate, Utc};
use tokio::sync::RwLock;

use taskflow_proto::blank::DATE_FORMAT;
use taskflow_proto::{
    ActivityEntry, EntityKind, Member, MemberFields, MemberProductivity, MetricsSnapshot,
    PendingVsCompleted, Project, ProjectFields, ProjectProgress, Task, TaskPayload, TaskPriority,
    TaskStatus, ValidationError,
};

/// Number of activity entries returned when no limit is given.
pub const DEFAULT_ACTIVITY_LIMIT: usize = 50;

/// Largest accepted activity limit.
pub const MAX_ACTIVITY_LIMIT: usize = 200;

/// Errors from store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record of this kind has the id.
    #[error("{kind} {id} not found")]
    NotFound {
        /// Kind looked up.
        kind: EntityKind,
        /// Missing id.
        id: String,
    },

    /// The submitted fields failed validation.
    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Filters accepted by `GET /tasks`. Unset or empty filters match
/// everything; set filters must all match.
#[derive(Debug, Default, Clone, serde::Deserialize)]
#[serde(default)]
pub struct TaskQuery {
    /// Exact assignee id.
    pub assignee_id: Option<String>,
    /// Exact project id.
    pub project_id: Option<String>,
    /// Exact status.
    pub status: Option<TaskStatus>,
    /// Exact priority.
    pub priority: Option<TaskPriority>,
    /// Due on or before this ISO date. Tasks without a due date never match.
    pub due_before: Option<String>,
    /// Due on or after this ISO date. Tasks without a due date never match.
    pub due_after: Option<String>,
    /// Case-insensitive substring of title, description, or comments.
    pub search: Option<String>,
}

impl TaskQuery {
    fn matches(&self, task: &Task) -> bool {
        let f = &task.fields;
        let due = f.due_date.map(|d| d.format(DATE_FORMAT).to_string());
        exact(self.assignee_id.as_deref(), f.assignee_id.as_deref())
            && exact(self.project_id.as_deref(), f.project_id.as_deref())
            && self.status.is_none_or(|s| s == f.status)
            && self.priority.is_none_or(|p| p == f.priority)
            && bound(self.due_before.as_deref(), due.as_deref(), |due, b| due <= b)
            && bound(self.due_after.as_deref(), due.as_deref(), |due, b| due >= b)
            && self.search.as_deref().filter(|s| !s.is_empty()).is_none_or(|s| {
                let needle = s.to_lowercase();
                [&f.title, &f.description, &f.comments]
                    .iter()
                    .any(|text| text.to_lowercase().contains(&needle))
            })
    }
}

fn exact(wanted: Option<&str>, actual: Option<&str>) -> bool {
    match wanted.filter(|w| !w.is_empty()) {
        Some(w) => actual == Some(w),
        None => true,
    }
}

/// ISO dates compare correctly as strings.
fn bound(limit: Option<&str>, due: Option<&str>, cmp: impl Fn(&str, &str) -> bool) -> bool {
    match limit.filter(|l| !l.is_empty()) {
        Some(l) => due.is_some_and(|d| cmp(d, l)),
        None => true,
    }
}

/// A stored record addressable by id.
trait Row {
    const KIND: EntityKind;
    fn id(&self) -> &str;
    /// Name used in activity details.
    fn label(&self) -> &str;
}

impl Row for Task {
    const KIND: EntityKind = EntityKind::Task;
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.fields.title
    }
}

impl Row for Member {
    const KIND: EntityKind = EntityKind::Member;
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.fields.name
    }
}

impl Row for Project {
    const KIND: EntityKind = EntityKind::Project;
    fn id(&self) -> &str {
        &self.id
    }
    fn label(&self) -> &str {
        &self.fields.name
    }
}

fn find_mut<'a, T: Row>(rows: &'a mut [T], id: &str) -> Result<&'a mut T, StoreError> {
    rows.iter_mut()
        .find(|row| row.id() == id)
        .ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })
}

fn remove<T: Row>(rows: &mut Vec<T>, id: &str) -> Result<T, StoreError> {
    let index = rows
        .iter()
        .position(|row| row.id() == id)
        .ok_or_else(|| StoreError::NotFound {
            kind: T::KIND,
            id: id.to_string(),
        })?;
    Ok(rows.remove(index))
}

fn new_id() -> String {
    uuid::Uuid::now_v7().to_string()
}

/// UTC timestamp with second precision, e.g. `2025-01-31T09:15:00Z`.
fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%SZ").to_string()
}

fn count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

#[derive(Debug, Default)]
struct Sheets {
    tasks: Vec<Task>,
    members: Vec<Member>,
    projects: Vec<Project>,
    activity: Vec<ActivityEntry>,
}

impl Sheets {
    fn log<T: Row>(&mut self, action: &str, row: &T, verb: &str) {
        self.activity.push(ActivityEntry {
            id: new_id(),
            action: action.to_string(),
            entity_type: T::KIND.activity_type().to_string(),
            entity_id: row.id().to_string(),
            details: format!("{verb} {}", row.label()),
            timestamp: now_iso(),
        });
    }

    fn workload(&self, member_id: &str) -> usize {
        self.tasks
            .iter()
            .filter(|t| {
                t.fields.assignee_id.as_deref() == Some(member_id)
                    && t.fields.status != TaskStatus::Completed
            })
            .count()
    }
}

/// Thread-safe in-memory store behind a [`RwLock`].
#[derive(Debug, Default)]
pub struct RecordStore {
    sheets: RwLock<Sheets>,
}

impl RecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // -----------------------------------------------------------------------
    // Tasks
    // -----------------------------------------------------------------------

    /// Tasks matching `query`, in insertion order.
    pub async fn list_tasks(&self, query: &TaskQuery) -> Vec<Task> {
        let sheets = self.sheets.read().await;
        sheets
            .tasks
            .iter()
            .filter(|t| query.matches(t))
            .cloned()
            .collect()
    }

    /// Creates a task and starts its history.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the title is empty.
    pub async fn create_task(&self, payload: TaskPayload) -> Result<Task, StoreError> {
        payload.fields.validate()?;
        let timestamp = now_iso();
        let task = Task {
            id: new_id(),
            history: format!("{timestamp} - {} created task", payload.updated_by),
            created_at: timestamp.clone(),
            updated_at: timestamp,
            fields: payload.fields,
        };
        let mut sheets = self.sheets.write().await;
        sheets.tasks.push(task.clone());
        sheets.log("create", &task, "Added");
        drop(sheets);
        tracing::info!(id = %task.id, "task created");
        Ok(task)
    }

    /// Replaces every mutable field of a task and appends a history line.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] for an empty title and
    /// [`StoreError::NotFound`] for an unknown id.
    pub async fn update_task(&self, id: &str, payload: TaskPayload) -> Result<Task, StoreError> {
        payload.fields.validate()?;
        let timestamp = now_iso();
        let mut sheets = self.sheets.write().await;
        let task = find_mut(&mut sheets.tasks, id)?;
        task.fields = payload.fields;
        let line = format!("{timestamp} - {} updated task", payload.updated_by);
        task.history = if task.history.is_empty() {
            line
        } else {
            format!("{}\n{line}", task.history)
        };
        task.updated_at = timestamp;
        let task = task.clone();
        sheets.log("update", &task, "Updated");
        drop(sheets);
        tracing::info!(%id, "task updated");
        Ok(task)
    }

    /// Removes a task.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub async fn delete_task(&self, id: &str) -> Result<Task, StoreError> {
        let mut sheets = self.sheets.write().await;
        let task = remove(&mut sheets.tasks, id)?;
        sheets.log("delete", &task, "Removed");
        drop(sheets);
        tracing::info!(%id, "task deleted");
        Ok(task)
    }

    // -----------------------------------------------------------------------
    // Members
    // -----------------------------------------------------------------------

    /// All members with their current workload.
    pub async fn list_members(&self) -> Vec<Member> {
        let sheets = self.sheets.read().await;
        sheets
            .members
            .iter()
            .map(|m| Member {
                workload: count(sheets.workload(&m.id)),
                ..m.clone()
            })
            .collect()
    }

    /// Adds a member.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if any field is empty.
    pub async fn create_member(&self, fields: MemberFields) -> Result<Member, StoreError> {
        fields.validate()?;
        let member = Member {
            created_at: now_iso(),
            ..Member::new(new_id(), fields)
        };
        let mut sheets = self.sheets.write().await;
        sheets.members.push(member.clone());
        sheets.log("create", &member, "Added");
        Ok(member)
    }

    /// Replaces a member's fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if any field is empty and
    /// [`StoreError::NotFound`] for an unknown id.
    pub async fn update_member(&self, id: &str, fields: MemberFields) -> Result<Member, StoreError> {
        fields.validate()?;
        let mut sheets = self.sheets.write().await;
        let member = find_mut(&mut sheets.members, id)?;
        member.fields = fields;
        let mut member = member.clone();
        member.workload = count(sheets.workload(id));
        sheets.log("update", &member, "Updated");
        Ok(member)
    }

    /// Removes a member. Tasks assigned to it keep the id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub async fn delete_member(&self, id: &str) -> Result<Member, StoreError> {
        let mut sheets = self.sheets.write().await;
        let member = remove(&mut sheets.members, id)?;
        sheets.log("delete", &member, "Removed");
        Ok(member)
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    /// All projects in insertion order.
    pub async fn list_projects(&self) -> Vec<Project> {
        self.sheets.read().await.projects.clone()
    }

    /// Creates a project.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the name is empty.
    pub async fn create_project(&self, fields: ProjectFields) -> Result<Project, StoreError> {
        fields.validate()?;
        let project = Project {
            created_at: now_iso(),
            ..Project::new(new_id(), fields)
        };
        let mut sheets = self.sheets.write().await;
        sheets.projects.push(project.clone());
        sheets.log("create", &project, "Added");
        Ok(project)
    }

    /// Replaces a project's fields.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Invalid`] if the name is empty and
    /// [`StoreError::NotFound`] for an unknown id.
    pub async fn update_project(
        &self,
        id: &str,
        fields: ProjectFields,
    ) -> Result<Project, StoreError> {
        fields.validate()?;
        let mut sheets = self.sheets.write().await;
        let project = find_mut(&mut sheets.projects, id)?;
        project.fields = fields;
        let project = project.clone();
        sheets.log("update", &project, "Updated");
        Ok(project)
    }

    /// Removes a project. Tasks in it keep the id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] for an unknown id.
    pub async fn delete_project(&self, id: &str) -> Result<Project, StoreError> {
        let mut sheets = self.sheets.write().await;
        let project = remove(&mut sheets.projects, id)?;
        sheets.log("delete", &project, "Removed");
        Ok(project)
    }

    // -----------------------------------------------------------------------
    // Read models
    // -----------------------------------------------------------------------

    /// The newest `limit` activity entries, newest first.
    pub async fn activity(&self, limit: usize) -> Vec<ActivityEntry> {
        let sheets = self.sheets.read().await;
        sheets.activity.iter().rev().take(limit).cloned().collect()
    }

    /// Metrics as of the current UTC date.
    pub async fn metrics(&self) -> MetricsSnapshot {
        self.metrics_on(Utc::now().date_naive()).await
    }

    /// Metrics as of `today`.
    ///
    /// A task counts as completed today when it is `Completed` and was last
    /// written on `today`. Overdue tasks are unfinished with a due date
    /// strictly before `today`. Project progress is the floored percentage
    /// of its tasks that are completed, 0 for a project with no tasks.
    pub async fn metrics_on(&self, today: NaiveDate) -> MetricsSnapshot {
        let today_prefix = today.format(DATE_FORMAT).to_string();
        let sheets = self.sheets.read().await;
        let tasks = &sheets.tasks;
        let done = |t: &&Task| t.fields.status == TaskStatus::Completed;

        let completed = tasks.iter().filter(done).count();
        let completed_today = tasks
            .iter()
            .filter(done)
            .filter(|t| t.updated_at.starts_with(&today_prefix))
            .count();
        let overdue = tasks
            .iter()
            .filter(|t| t.fields.status != TaskStatus::Completed)
            .filter(|t| t.fields.due_date.is_some_and(|d| d < today))
            .count();

        let project_progress = sheets
            .projects
            .iter()
            .map(|p| {
                let in_project: Vec<&Task> = tasks
                    .iter()
                    .filter(|t| t.fields.project_id.as_deref() == Some(p.id.as_str()))
                    .collect();
                let total = in_project.len();
                let finished = in_project.into_iter().filter(done).count();
                let progress = if total == 0 { 0 } else { finished * 100 / total };
                ProjectProgress {
                    project_id: p.id.clone(),
                    name: p.fields.name.clone(),
                    progress: count(progress),
                }
            })
            .collect();

        let member_productivity = sheets
            .members
            .iter()
            .map(|m| MemberProductivity {
                member_id: m.id.clone(),
                name: m.fields.name.clone(),
                completed: count(
                    tasks
                        .iter()
                        .filter(done)
                        .filter(|t| t.fields.assignee_id.as_deref() == Some(m.id.as_str()))
                        .count(),
                ),
            })
            .collect();

        MetricsSnapshot {
            completed_today: count(completed_today),
            pending_vs_completed: PendingVsCompleted {
                pending: count(tasks.len() - completed),
                completed: count(completed),
            },
            overdue: count(overdue),
            project_progress,
            member_productivity,
        }
    }
}
