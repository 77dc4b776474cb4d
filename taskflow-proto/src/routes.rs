//! Endpoint paths of the service contract.
//!
//! ```text
//! GET    /tasks | /team-members | /projects | /activity | /metrics
//! POST   /tasks | /team-members | /projects
//! PUT    /tasks/{id} | /team-members/{id} | /projects/{id}
//! DELETE /tasks/{id} | /team-members/{id} | /projects/{id}
//! ```

use std::fmt;

/// Path of the metrics snapshot.
pub const METRICS_PATH: &str = "/metrics";

/// One of the four server-backed record sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionName {
    /// Tasks.
    Tasks,
    /// Team members.
    Members,
    /// Projects.
    Projects,
    /// Activity log.
    Activity,
}

impl CollectionName {
    /// All collections, in the order a fresh session loads them.
    pub const ALL: [Self; 4] = [Self::Tasks, Self::Members, Self::Projects, Self::Activity];

    /// Listing path of this collection.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Tasks => "/tasks",
            Self::Members => "/team-members",
            Self::Projects => "/projects",
            Self::Activity => "/activity",
        }
    }
}

impl fmt::Display for CollectionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Tasks => "tasks",
            Self::Members => "members",
            Self::Projects => "projects",
            Self::Activity => "activity",
        })
    }
}

/// A record kind the client can create, edit, and delete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// A task.
    Task,
    /// A team member.
    Member,
    /// A project.
    Project,
}

impl EntityKind {
    /// All editable kinds.
    pub const ALL: [Self; 3] = [Self::Task, Self::Member, Self::Project];

    /// Collection holding records of this kind.
    #[must_use]
    pub const fn collection(self) -> CollectionName {
        match self {
            Self::Task => CollectionName::Tasks,
            Self::Member => CollectionName::Members,
            Self::Project => CollectionName::Projects,
        }
    }

    /// Name used for `entity_type` in the activity log.
    #[must_use]
    pub const fn activity_type(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::Member => "team_member",
            Self::Project => "project",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Task => "task",
            Self::Member => "member",
            Self::Project => "project",
        })
    }
}
