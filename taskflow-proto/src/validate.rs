//! Field validation shared by the client and the service.

/// A mutable field set failed validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required text field is empty.
    #[error("{entity} {field} cannot be empty")]
    Empty {
        /// Entity kind, e.g. `"task"`.
        entity: &'static str,
        /// Field name, e.g. `"title"`.
        field: &'static str,
    },
}

/// Returns [`ValidationError::Empty`] for the first empty `(field, value)` pair.
pub(crate) fn require(
    entity: &'static str,
    fields: &[(&'static str, &str)],
) -> Result<(), ValidationError> {
    match fields.iter().find(|(_, value)| value.is_empty()) {
        Some((field, _)) => Err(ValidationError::Empty {
            entity,
            field: *field,
        }),
        None => Ok(()),
    }
}
