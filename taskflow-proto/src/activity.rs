//! Activity log entries.
//!
//! The service appends one entry per successful mutation. Clients only read
//! this collection.

use serde::{Deserialize, Serialize};

/// One line of the change log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    /// Service-assigned identifier.
    pub id: String,
    /// `create`, `update` or `delete`.
    pub action: String,
    /// `task`, `team_member` or `project`.
    pub entity_type: String,
    /// Identifier of the affected record.
    #[serde(default)]
    pub entity_id: String,
    /// Human-readable summary, e.g. `Added Fix login`.
    #[serde(default)]
    pub details: String,
    /// When the entry was written (ISO 8601, service clock).
    pub timestamp: String,
}
