//! Per-kind edit state machine.
//!
//! ```text
//!            begin(id, buf)                 edit(f)
//!   Idle ─────────────────────▶ Editing ◀──────────┐
//!    ▲                         (id, buf) ──────────┘
//!    │     cancel / complete(id)  │
//!    └────────────────────────────┘
//! ```
//!
//! At most one record per kind is in edit mode. Beginning on another record
//! drops the previous buffer without a trace.

/// Errors from edit operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// The record to edit is not in the current collection snapshot.
    #[error("no {kind} with id {id:?} in the current snapshot")]
    RecordNotFound {
        /// Entity kind, for messages.
        kind: &'static str,
        /// The missing id.
        id: String,
    },
}

/// Edit state for one entity kind, holding a buffer of type `B`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum EditState<B> {
    /// Nothing is being edited.
    #[default]
    Idle,
    /// Record `id` is being edited; `buffer` is the working copy.
    Editing {
        /// Id of the record under edit. Never changes mid-edit.
        id: String,
        /// Working copy of the record's mutable fields.
        buffer: B,
    },
}

impl<B> EditState<B> {
    /// Enters edit mode for `id`, replacing any edit in progress.
    pub fn begin(&mut self, id: impl Into<String>, buffer: B) {
        *self = Self::Editing {
            id: id.into(),
            buffer,
        };
    }

    /// Applies a field edit to the buffer. Does nothing when idle.
    ///
    /// Returns whether an edit was in progress.
    pub fn edit(&mut self, f: impl FnOnce(&mut B)) -> bool {
        match self {
            Self::Idle => false,
            Self::Editing { buffer, .. } => {
                f(buffer);
                true
            }
        }
    }

    /// Leaves edit mode, discarding the buffer.
    pub fn cancel(&mut self) {
        *self = Self::Idle;
    }

    /// Leaves edit mode after `id` was saved.
    ///
    /// If a different record has been put into edit mode since the save
    /// was submitted, that newer edit is kept and `false` is returned.
    pub fn complete(&mut self, id: &str) -> bool {
        if self.editing_id() == Some(id) {
            *self = Self::Idle;
            true
        } else {
            false
        }
    }

    /// Id of the record under edit, if any.
    #[must_use]
    pub fn editing_id(&self) -> Option<&str> {
        match self {
            Self::Idle => None,
            Self::Editing { id, .. } => Some(id.as_str()),
        }
    }

    /// The working buffer, if editing.
    #[must_use]
    pub const fn buffer(&self) -> Option<&B> {
        match self {
            Self::Idle => None,
            Self::Editing { buffer, .. } => Some(buffer),
        }
    }

    /// Whether a record is being edited.
    #[must_use]
    pub const fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }
}
