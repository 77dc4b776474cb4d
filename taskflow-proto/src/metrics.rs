//! Aggregate productivity metrics.
//!
//! Everything here is derived by the service. Clients treat the snapshot as
//! an opaque read model and never recompute it.

use serde::{Deserialize, Serialize};

/// Open versus finished task counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PendingVsCompleted {
    /// Tasks not in `Completed`.
    pub pending: u32,
    /// Tasks in `Completed`.
    pub completed: u32,
}

/// Completion percentage of one project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectProgress {
    /// Project identifier.
    pub project_id: String,
    /// Project name at snapshot time.
    pub name: String,
    /// Whole percent of the project's tasks that are completed.
    pub progress: u32,
}

/// Completed-task count of one member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProductivity {
    /// Member identifier.
    pub member_id: String,
    /// Member name at snapshot time.
    pub name: String,
    /// Number of assigned tasks in `Completed`.
    pub completed: u32,
}

/// Response of `GET /metrics`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSnapshot {
    /// Tasks completed (last written) today.
    pub completed_today: u32,
    /// Open versus finished counts.
    pub pending_vs_completed: PendingVsCompleted,
    /// Unfinished tasks past their due date.
    pub overdue: u32,
    /// Per-project progress, in project listing order.
    pub project_progress: Vec<ProjectProgress>,
    /// Per-member completions, in member listing order.
    pub member_productivity: Vec<MemberProductivity>,
}
