//! Mutation coordinator: writes, then refreshes what the write touched.
//!
//! Every successful write is followed by a sequential reload of the
//! mutated kind's collection and then the activity log. There is no
//! optimistic local update; the reload is the only way a write shows up.
//! A failed reload is reported but does not turn the write into a failure.

use std::fmt;

use serde_json::Value;

use taskflow_proto::{CollectionName, EntityKind, Member, Project, Task, ValidationError};

use super::{Entity, Refresh, Workspace};
use crate::edit::EditState;
use crate::remote::{Remote, RemoteError, Request};

/// Collections to reload after a write to `kind`, in reload order.
#[must_use]
pub const fn refresh_scope(kind: EntityKind) -> [CollectionName; 2] {
    [kind.collection(), CollectionName::Activity]
}

/// Kind of write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// `POST` from the create form.
    Create,
    /// `PUT` of the edit buffer.
    Update,
    /// `DELETE` of a record.
    Delete,
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        })
    }
}

/// Errors from a write. When any of these is returned, forms, edit state,
/// and collections are exactly as they were before the call.
#[derive(Debug, thiserror::Error)]
pub enum MutationError {
    /// The fields failed validation; no request was issued.
    #[error(transparent)]
    Invalid(#[from] ValidationError),

    /// An update was submitted while no record of that kind was in edit mode.
    #[error("no {kind} is being edited")]
    NotEditing {
        /// Kind the update was submitted for.
        kind: EntityKind,
    },

    /// The fields could not be encoded as a request body.
    #[error("encoding {kind} body failed: {source}")]
    Encode {
        /// Kind being written.
        kind: EntityKind,
        /// Serializer error.
        source: serde_json::Error,
    },

    /// The write request failed.
    #[error("{mutation} {kind} failed: {source}")]
    Remote {
        /// Kind being written.
        kind: EntityKind,
        /// Which write.
        mutation: Mutation,
        /// Underlying failure.
        source: RemoteError,
    },
}

/// Outcome of a successful write.
#[derive(Debug)]
pub struct MutationReport {
    /// Kind written.
    pub kind: EntityKind,
    /// Which write.
    pub mutation: Mutation,
    /// Id of the record written. For creates, taken from the response when
    /// the service returned one.
    pub id: Option<String>,
    /// Reloads performed afterwards, in order.
    pub refreshed: Vec<Refresh>,
}

impl MutationReport {
    /// Whether every follow-up reload succeeded.
    #[must_use]
    pub fn fully_refreshed(&self) -> bool {
        self.refreshed.iter().all(Refresh::is_ok)
    }
}

impl<R: Remote> Workspace<R> {
    /// Creates a record of kind `E` from its create form.
    ///
    /// The form is validated first; an invalid form issues no request. On
    /// success the form is reset to defaults and the refresh scope reloaded.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Invalid`] for a form that fails validation
    /// and [`MutationError::Remote`] if the request fails. The form is kept
    /// in both cases.
    pub async fn create<E: Entity>(&self) -> Result<MutationReport, MutationError> {
        let fields = self.form::<E>();
        E::validate(&fields)?;
        let body = self.encode::<E>(fields)?;

        let response = self
            .remote()
            .execute(Request::post(E::KIND.collection().path(), body))
            .await
            .map_err(|source| write_failed(E::KIND, Mutation::Create, source))?;

        self.reset_form::<E>();
        let id = response.get("id").and_then(Value::as_str).map(str::to_string);
        tracing::info!(kind = %E::KIND, id = id.as_deref().unwrap_or(""), "created");
        Ok(self.finish(E::KIND, Mutation::Create, id).await)
    }

    /// Saves the edit buffer of kind `E`.
    ///
    /// Sends the full buffer, not a diff. On success the record leaves edit
    /// mode (unless another record has since entered it) and the refresh
    /// scope is reloaded.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::NotEditing`] when nothing is in edit mode,
    /// [`MutationError::Invalid`] for a buffer that fails validation, and
    /// [`MutationError::Remote`] if the request fails. Edit mode and the
    /// buffer are kept in every error case.
    pub async fn submit_edit<E: Entity>(&self) -> Result<MutationReport, MutationError> {
        let EditState::Editing { id, buffer } = self.edit_state::<E>() else {
            return Err(MutationError::NotEditing { kind: E::KIND });
        };
        E::validate(&buffer)?;
        let body = self.encode::<E>(buffer)?;

        self.remote()
            .execute(Request::put(E::KIND.collection().path(), id.as_str(), body))
            .await
            .map_err(|source| write_failed(E::KIND, Mutation::Update, source))?;

        if !E::slot(&self.slots).edit.lock().complete(&id) {
            tracing::debug!(kind = %E::KIND, %id, "edit moved on before save landed");
        }
        tracing::info!(kind = %E::KIND, %id, "updated");
        Ok(self.finish(E::KIND, Mutation::Update, Some(id)).await)
    }

    /// Deletes record `id` of kind `E`.
    ///
    /// Nothing cascades: tasks referencing a deleted member or project keep
    /// their now-dangling ids.
    ///
    /// # Errors
    ///
    /// Returns [`MutationError::Remote`] if the request fails.
    pub async fn delete<E: Entity>(&self, id: &str) -> Result<MutationReport, MutationError> {
        self.remote()
            .execute(Request::delete(E::KIND.collection().path(), id))
            .await
            .map_err(|source| write_failed(E::KIND, Mutation::Delete, source))?;

        tracing::info!(kind = %E::KIND, %id, "deleted");
        Ok(self.finish(E::KIND, Mutation::Delete, Some(id.to_string())).await)
    }

    /// [`create`](Self::create) for a kind chosen at runtime.
    ///
    /// # Errors
    ///
    /// As for [`create`](Self::create).
    pub async fn create_kind(&self, kind: EntityKind) -> Result<MutationReport, MutationError> {
        match kind {
            EntityKind::Task => self.create::<Task>().await,
            EntityKind::Member => self.create::<Member>().await,
            EntityKind::Project => self.create::<Project>().await,
        }
    }

    /// [`submit_edit`](Self::submit_edit) for a kind chosen at runtime.
    ///
    /// # Errors
    ///
    /// As for [`submit_edit`](Self::submit_edit).
    pub async fn submit_edit_kind(
        &self,
        kind: EntityKind,
    ) -> Result<MutationReport, MutationError> {
        match kind {
            EntityKind::Task => self.submit_edit::<Task>().await,
            EntityKind::Member => self.submit_edit::<Member>().await,
            EntityKind::Project => self.submit_edit::<Project>().await,
        }
    }

    /// [`delete`](Self::delete) for a kind chosen at runtime.
    ///
    /// # Errors
    ///
    /// As for [`delete`](Self::delete).
    pub async fn delete_kind(
        &self,
        kind: EntityKind,
        id: &str,
    ) -> Result<MutationReport, MutationError> {
        match kind {
            EntityKind::Task => self.delete::<Task>(id).await,
            EntityKind::Member => self.delete::<Member>(id).await,
            EntityKind::Project => self.delete::<Project>(id).await,
        }
    }

    /// Reloads the refresh scope of `kind`, one collection after the other.
    pub async fn refresh_after(&self, kind: EntityKind) -> Vec<Refresh> {
        let mut refreshed = Vec::with_capacity(2);
        for collection in refresh_scope(kind) {
            let refresh = self.load(collection).await;
            if let Err(e) = &refresh.outcome {
                tracing::warn!(%kind, %collection, error = %e, "refresh after write failed");
            }
            refreshed.push(refresh);
        }
        refreshed
    }

    async fn finish(
        &self,
        kind: EntityKind,
        mutation: Mutation,
        id: Option<String>,
    ) -> MutationReport {
        MutationReport {
            kind,
            mutation,
            id,
            refreshed: self.refresh_after(kind).await,
        }
    }

    fn encode<E: Entity>(&self, fields: E::Fields) -> Result<Value, MutationError> {
        E::body(fields, self.actor()).map_err(|source| MutationError::Encode {
            kind: E::KIND,
            source,
        })
    }
}

fn write_failed(kind: EntityKind, mutation: Mutation, source: RemoteError) -> MutationError {
    tracing::warn!(%kind, %mutation, error = %source, "write failed");
    MutationError::Remote {
        kind,
        mutation,
        source,
    }
}
