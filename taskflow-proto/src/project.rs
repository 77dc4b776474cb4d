//! Projects.

use serde::{Deserialize, Serialize};

use crate::validate::{ValidationError, require};

/// Status given to projects created without one.
pub const DEFAULT_PROJECT_STATUS: &str = "Active";

/// The client-editable fields of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectFields {
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Free-text status.
    pub status: String,
}

impl Default for ProjectFields {
    fn default() -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            status: DEFAULT_PROJECT_STATUS.to_string(),
        }
    }
}

impl ProjectFields {
    /// Creates an active project with the given name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Checks that the name is present.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::Empty`] if the name is empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        require("project", &[("name", self.name.as_str())])
    }
}

/// A project as stored by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    /// Service-assigned identifier.
    pub id: String,
    /// Client-editable fields.
    #[serde(flatten)]
    pub fields: ProjectFields,
    /// Creation timestamp (ISO 8601, service clock).
    #[serde(default)]
    pub created_at: String,
}

impl Project {
    /// Creates a project with no service metadata. Mostly useful in tests.
    #[must_use]
    pub fn new(id: impl Into<String>, fields: ProjectFields) -> Self {
        Self {
            id: id.into(),
            fields,
            created_at: String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_status_is_active() {
        assert_eq!(ProjectFields::default().status, "Active");
        assert_eq!(ProjectFields::named("Apollo").status, "Active");
    }

    #[test]
    fn missing_status_in_body_defaults_to_active() {
        let fields: ProjectFields = serde_json::from_value(json!({"name": "Apollo"})).unwrap();
        assert_eq!(fields.status, "Active");
        assert_eq!(fields.description, "");
    }

    #[test]
    fn empty_name_fails_validation() {
        assert!(ProjectFields::default().validate().is_err());
        assert!(ProjectFields::named("Apollo").validate().is_ok());
    }
}
