//! Display-side view state.
//!
//! Rows here are plain data for whatever renders them. Weak references are
//! resolved against the current snapshots; an id that names nothing
//! renders as the same placeholder as no id at all.

use std::fmt;

use taskflow_proto::{
    ActivityEntry, Member, MemberProductivity, MetricsSnapshot, Project, ProjectProgress, Task,
    blank::DATE_FORMAT,
};

/// Shown for a task with no (or a dangling) assignee.
pub const UNASSIGNED: &str = "Unassigned";

/// Shown for a task with no (or a dangling) project.
pub const GENERAL: &str = "General";

/// Shown for empty descriptions.
pub const NO_DESCRIPTION: &str = "No description";

/// Shown for unset dates.
pub const NOT_SET: &str = "Not set";

/// Name of the task's assignee, or [`UNASSIGNED`].
#[must_use]
pub fn assignee_label<'a>(task: &Task, members: &'a [Member]) -> &'a str {
    task.fields
        .assignee_id
        .as_deref()
        .and_then(|id| members.iter().find(|m| m.id == id))
        .map_or(UNASSIGNED, |m| m.fields.name.as_str())
}

/// Name of the task's project, or [`GENERAL`].
#[must_use]
pub fn project_label<'a>(task: &Task, projects: &'a [Project]) -> &'a str {
    task.fields
        .project_id
        .as_deref()
        .and_then(|id| projects.iter().find(|p| p.id == id))
        .map_or(GENERAL, |p| p.fields.name.as_str())
}

fn or_placeholder(text: &str, placeholder: &str) -> String {
    if text.is_empty() {
        placeholder.to_string()
    } else {
        text.to_string()
    }
}

/// One line of the task list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRow {
    /// Task id.
    pub id: String,
    /// Title.
    pub title: String,
    /// Description or [`NO_DESCRIPTION`].
    pub description: String,
    /// Status display name.
    pub status: &'static str,
    /// Priority display name.
    pub priority: &'static str,
    /// Due date or [`NOT_SET`].
    pub due: String,
    /// Assignee name or [`UNASSIGNED`].
    pub assignee: String,
    /// Project name or [`GENERAL`].
    pub project: String,
}

impl TaskRow {
    /// Builds the row for `task`, resolving references against the snapshots.
    #[must_use]
    pub fn build(task: &Task, members: &[Member], projects: &[Project]) -> Self {
        let f = &task.fields;
        Self {
            id: task.id.clone(),
            title: f.title.clone(),
            description: or_placeholder(&f.description, NO_DESCRIPTION),
            status: f.status.as_str(),
            priority: f.priority.as_str(),
            due: f
                .due_date
                .map_or_else(|| NOT_SET.to_string(), |d| d.format(DATE_FORMAT).to_string()),
            assignee: assignee_label(task, members).to_string(),
            project: project_label(task, projects).to_string(),
        }
    }
}

impl fmt::Display for TaskRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  [{} / {}]  {}\n    {}\n    Due: {}  Assignee: {}  Project: {}",
            self.id,
            self.status,
            self.priority,
            self.title,
            self.description,
            self.due,
            self.assignee,
            self.project
        )
    }
}

/// One line of the member list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRow {
    /// Member id.
    pub id: String,
    /// Name.
    pub name: String,
    /// Role.
    pub role: String,
    /// Email.
    pub email: String,
    /// Open tasks assigned, as computed by the service.
    pub workload: u32,
}

impl From<&Member> for MemberRow {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.fields.name.clone(),
            role: member.fields.role.clone(),
            email: member.fields.email.clone(),
            workload: member.workload,
        }
    }
}

impl fmt::Display for MemberRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {} ({})  {}  workload: {}",
            self.id, self.name, self.role, self.email, self.workload
        )
    }
}

/// One line of the project list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRow {
    /// Project id.
    pub id: String,
    /// Name.
    pub name: String,
    /// Description or [`NO_DESCRIPTION`].
    pub description: String,
    /// Free-text status.
    pub status: String,
}

impl From<&Project> for ProjectRow {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id.clone(),
            name: project.fields.name.clone(),
            description: or_placeholder(&project.fields.description, NO_DESCRIPTION),
            status: project.fields.status.clone(),
        }
    }
}

impl fmt::Display for ProjectRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {}  Status: {}\n    {}",
            self.id, self.name, self.status, self.description
        )
    }
}

/// One entry of the activity log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRow {
    /// `action · entity_type`.
    pub heading: String,
    /// Free-text details.
    pub details: String,
    /// Service timestamp.
    pub timestamp: String,
}

impl From<&ActivityEntry> for ActivityRow {
    fn from(entry: &ActivityEntry) -> Self {
        Self {
            heading: format!("{} \u{b7} {}", entry.action, entry.entity_type),
            details: entry.details.clone(),
            timestamp: entry.timestamp.clone(),
        }
    }
}

impl fmt::Display for ActivityRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}  {}  {}", self.timestamp, self.heading, self.details)
    }
}

/// The insights panel. Every figure is zero and every list empty until a
/// snapshot has loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsView {
    /// Tasks completed today.
    pub completed_today: u32,
    /// Tasks not yet completed.
    pub pending: u32,
    /// Unfinished tasks past due.
    pub overdue: u32,
    /// Per-project completion.
    pub project_progress: Vec<ProjectProgress>,
    /// Per-member completions.
    pub member_productivity: Vec<MemberProductivity>,
}

impl From<Option<&MetricsSnapshot>> for MetricsView {
    fn from(snapshot: Option<&MetricsSnapshot>) -> Self {
        snapshot.map_or_else(Self::default, |m| Self {
            completed_today: m.completed_today,
            pending: m.pending_vs_completed.pending,
            overdue: m.overdue,
            project_progress: m.project_progress.clone(),
            member_productivity: m.member_productivity.clone(),
        })
    }
}

impl fmt::Display for MetricsView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Completed today: {}", self.completed_today)?;
        writeln!(f, "Pending tasks:   {}", self.pending)?;
        writeln!(f, "Overdue tasks:   {}", self.overdue)?;
        writeln!(f, "Project progress:")?;
        if self.project_progress.is_empty() {
            writeln!(f, "    No project data yet.")?;
        }
        for p in &self.project_progress {
            writeln!(f, "    {}: {}% complete", p.name, p.progress)?;
        }
        writeln!(f, "Member productivity:")?;
        if self.member_productivity.is_empty() {
            writeln!(f, "    No member data yet.")?;
        }
        for m in &self.member_productivity {
            writeln!(f, "    {}: {} tasks completed", m.name, m.completed)?;
        }
        Ok(())
    }
}
