//! The three editable record kinds behind one trait.

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use taskflow_proto::{
    EntityKind, Member, MemberFields, Project, ProjectFields, Task, TaskFields, ValidationError,
};

use crate::edit::EditState;
use crate::store::{Collection, CollectionStore};

/// Create form and edit state for one entity kind.
#[derive(Default)]
pub struct EntitySlot<F> {
    /// Contents of the create form.
    pub(crate) form: Mutex<F>,
    /// Which record, if any, is being edited.
    pub(crate) edit: Mutex<EditState<F>>,
}

/// Per-kind slots of a workspace.
#[derive(Default)]
pub struct Slots {
    pub(crate) task: EntitySlot<TaskFields>,
    pub(crate) member: EntitySlot<MemberFields>,
    pub(crate) project: EntitySlot<ProjectFields>,
}

/// A record kind the workspace can create, edit, and delete.
pub trait Entity: Clone + DeserializeOwned + Send + Sync + 'static {
    /// Which kind this is.
    const KIND: EntityKind;

    /// The mutable field set: form contents and edit buffer.
    type Fields: Clone + Default + PartialEq + Serialize + Send + Sync + 'static;

    /// Service-assigned id.
    fn id(&self) -> &str;

    /// Current mutable fields.
    fn fields(&self) -> &Self::Fields;

    /// Checks required fields before any request is issued.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] naming the first missing field.
    fn validate(fields: &Self::Fields) -> Result<(), ValidationError>;

    /// Builds the `POST`/`PUT` body for `fields`, written by the given actor.
    ///
    /// # Errors
    ///
    /// Returns an error if the fields fail to serialize.
    fn body(fields: Self::Fields, _actor: &str) -> Result<Value, serde_json::Error> {
        serde_json::to_value(fields)
    }

    /// This kind's collection in the store.
    fn collection(store: &CollectionStore) -> &Collection<Self>;

    /// This kind's form and edit slot.
    fn slot(slots: &Slots) -> &EntitySlot<Self::Fields>;
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;
    type Fields = TaskFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> &TaskFields {
        &self.fields
    }

    fn validate(fields: &TaskFields) -> Result<(), ValidationError> {
        fields.validate()
    }

    /// Task writes always carry the writing actor.
    fn body(fields: TaskFields, actor: &str) -> Result<Value, serde_json::Error> {
        serde_json::to_value(fields.into_payload(actor))
    }

    fn collection(store: &CollectionStore) -> &Collection<Self> {
        &store.tasks
    }

    fn slot(slots: &Slots) -> &EntitySlot<TaskFields> {
        &slots.task
    }
}

impl Entity for Member {
    const KIND: EntityKind = EntityKind::Member;
    type Fields = MemberFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> &MemberFields {
        &self.fields
    }

    fn validate(fields: &MemberFields) -> Result<(), ValidationError> {
        fields.validate()
    }

    fn collection(store: &CollectionStore) -> &Collection<Self> {
        &store.members
    }

    fn slot(slots: &Slots) -> &EntitySlot<MemberFields> {
        &slots.member
    }
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;
    type Fields = ProjectFields;

    fn id(&self) -> &str {
        &self.id
    }

    fn fields(&self) -> &ProjectFields {
        &self.fields
    }

    fn validate(fields: &ProjectFields) -> Result<(), ValidationError> {
        fields.validate()
    }

    fn collection(store: &CollectionStore) -> &Collection<Self> {
        &store.projects
    }

    fn slot(slots: &Slots) -> &EntitySlot<ProjectFields> {
        &slots.project
    }
}
