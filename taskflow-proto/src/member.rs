//! Team members.

use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, require};

/// The client-editable fields of a team member.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemberFields {
    /// Display name.
    pub name: String,
    /// Role on the team.
    pub role: String,
    /// Contact address.
    pub email: String,
}

impl MemberFields {
    /// Creates a member field set.
    #[must_use]
    pub fn new(name: impl Into<String>, role: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            role: role.into(),
            email: email.into(),
        }
    }

    /// Checks that name, role, and email are all present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] naming the first empty field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require(
            "member",
            &[
                ("name", self.name.as_str()),
                ("role", self.role.as_str()),
                ("email", self.email.as_str()),
            ],
        )
    }
}

/// A team member as listed by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Service-assigned identifier.
    pub id: String,
    /// Client-editable fields.
    #[serde(flatten)]
    pub fields: MemberFields,
    /// Number of assigned tasks that are not completed.
    ///
    /// Computed by the service on every listing; never sent by the client.
    #[serde(default)]
    pub workload: u32,
    /// Creation timestamp (ISO 8601, service clock).
    #[serde(default)]
    pub created_at: String,
}

impl Member {
    /// Creates a member with zero workload. Mostly useful in tests.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: MemberFields) -> Self {
        Self {
            id: id.into(),
            fields,
            workload: 0,
            created_at: String::new(),
        }
    }
}
