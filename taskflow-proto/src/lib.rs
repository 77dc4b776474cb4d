//! Shared wire model for the `TaskFlow` client and service.
//!
//! All bodies are JSON. Unset dates and references travel as `""`
//! (see [`blank`]).

pub mod activity;
pub mod blank;
pub mod member;
pub mod metrics;
pub mod project;
pub mod routes;
pub mod task;
pub mod validate;

pub use activity::ActivityEntry;
pub use member::{Member, MemberFields};
pub use metrics::{MemberProductivity, MetricsSnapshot, PendingVsCompleted, ProjectProgress};
pub use project::{DEFAULT_PROJECT_STATUS, Project, ProjectFields};
pub use routes::{CollectionName, EntityKind, METRICS_PATH};
pub use task::{ParseVariantError, Task, TaskFields, TaskPayload, TaskPriority, TaskStatus};
pub use validate::ValidationError;
