//! The workspace: one session's shared client state.
//!
//! A [`Workspace`] owns the remote, the collection store, the metrics
//! loader, the task filter, and a create form plus edit state per entity
//! kind. It is constructed once and shared (usually behind an `Arc`) with
//! whatever drives it: the CLI, a UI loop, or the session bridge.
//!
//! Synchronous operations (filter changes, edit-buffer changes, form edits)
//! never touch the network. Loads and mutations are `async` and only ever
//! suspend on the remote; locks are released before every await.

pub mod entity;
pub mod mutation;

use futures_util::future::join_all;
use parking_lot::Mutex;

use taskflow_proto::{CollectionName, MetricsSnapshot, Task};

use crate::edit::{EditError, EditState};
use crate::filter::TaskFilter;
use crate::metrics::{MetricsError, MetricsLoader, MetricsOutcome};
use crate::remote::Remote;
use crate::store::{CollectionStore, LoadError, LoadOutcome};

pub use entity::{Entity, EntitySlot, Slots};
pub use mutation::{Mutation, MutationError, MutationReport, refresh_scope};

/// Result of loading one collection, plus any metrics fetch it triggered.
#[derive(Debug)]
pub struct Refresh {
    /// The collection that was loaded.
    pub collection: CollectionName,
    /// Load outcome.
    pub outcome: Result<LoadOutcome, LoadError>,
    /// Set when the load changed the task count and metrics were refetched.
    pub metrics: Option<Result<MetricsOutcome, MetricsError>>,
}

impl Refresh {
    /// Whether the load succeeded (applied or stale).
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Shared client state for one session.
pub struct Workspace<R> {
    remote: R,
    store: CollectionStore,
    metrics: MetricsLoader,
    filter: Mutex<TaskFilter>,
    slots: Slots,
    actor: String,
}

impl<R: Remote> Workspace<R> {
    /// Creates a workspace with nothing loaded.
    ///
    /// `actor` is written as `updated_by` on every task write.
    pub fn new(remote: R, actor: impl Into<String>) -> Self {
        Self {
            remote,
            store: CollectionStore::new(),
            metrics: MetricsLoader::new(),
            filter: Mutex::new(TaskFilter::new()),
            slots: Slots::default(),
            actor: actor.into(),
        }
    }

    /// The remote requests go through.
    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    /// The collection store.
    #[must_use]
    pub const fn store(&self) -> &CollectionStore {
        &self.store
    }

    /// Identity written on task updates.
    #[must_use]
    pub fn actor(&self) -> &str {
        &self.actor
    }

    // --- Loading ---

    /// Loads one collection.
    ///
    /// An applied task load whose record count differs from the last one
    /// observed also fetches metrics, after the load.
    pub async fn load(&self, collection: CollectionName) -> Refresh {
        let outcome = self.store.load(&self.remote, collection).await;
        let metrics = match (&outcome, collection) {
            (Ok(LoadOutcome::Applied { count }), CollectionName::Tasks)
                if self.metrics.observe_task_count(*count) =>
            {
                Some(self.metrics.refresh(&self.remote).await)
            }
            _ => None,
        };
        Refresh {
            collection,
            outcome,
            metrics,
        }
    }

    /// Loads all four collections concurrently.
    pub async fn load_all(&self) -> Vec<Refresh> {
        join_all(CollectionName::ALL.map(|name| self.load(name))).await
    }

    /// Fetches metrics regardless of the task count.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the fetch fails; the previous snapshot
    /// is kept.
    pub async fn refresh_metrics(&self) -> Result<MetricsOutcome, MetricsError> {
        self.metrics.refresh(&self.remote).await
    }

    /// Latest metrics snapshot, if any has loaded.
    #[must_use]
    pub fn metrics(&self) -> Option<MetricsSnapshot> {
        self.metrics.snapshot()
    }

    /// Whether a metrics fetch is in flight or none has loaded yet.
    #[must_use]
    pub fn metrics_loading(&self) -> bool {
        self.metrics.loading()
    }

    // --- Filter ---

    /// A copy of the active filter.
    #[must_use]
    pub fn filter(&self) -> TaskFilter {
        self.filter.lock().clone()
    }

    /// Changes the active filter.
    pub fn update_filter(&self, f: impl FnOnce(&mut TaskFilter)) {
        f(&mut self.filter.lock());
    }

    /// The task collection narrowed by the active filter, in collection order.
    #[must_use]
    pub fn filtered_tasks(&self) -> Vec<Task> {
        let tasks = self.store.tasks.snapshot();
        self.filter.lock().apply(&tasks)
    }

    // --- Create forms ---

    /// A copy of the create form for kind `E`.
    #[must_use]
    pub fn form<E: Entity>(&self) -> E::Fields {
        E::slot(&self.slots).form.lock().clone()
    }

    /// Edits the create form for kind `E`.
    pub fn update_form<E: Entity>(&self, f: impl FnOnce(&mut E::Fields)) {
        f(&mut E::slot(&self.slots).form.lock());
    }

    /// Replaces the create form for kind `E`.
    pub fn set_form<E: Entity>(&self, fields: E::Fields) {
        *E::slot(&self.slots).form.lock() = fields;
    }

    /// Resets the create form for kind `E` to its defaults.
    pub fn reset_form<E: Entity>(&self) {
        self.set_form::<E>(E::Fields::default());
    }

    // --- Edit mode ---

    /// Puts record `id` of kind `E` into edit mode.
    ///
    /// The buffer starts as a copy of the record's fields in the current
    /// snapshot. Any other record of the same kind leaves edit mode and
    /// its buffer is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`EditError::RecordNotFound`] if `id` is not in the snapshot.
    pub fn begin_edit<E: Entity>(&self, id: &str) -> Result<(), EditError> {
        let records = E::collection(&self.store).snapshot();
        let record = records
            .iter()
            .find(|r| r.id() == id)
            .ok_or_else(|| EditError::RecordNotFound {
                kind: E::KIND.activity_type(),
                id: id.to_string(),
            })?;
        E::slot(&self.slots)
            .edit
            .lock()
            .begin(id, record.fields().clone());
        Ok(())
    }

    /// Applies a field change to the edit buffer of kind `E`.
    ///
    /// Returns whether a record was in edit mode.
    pub fn edit<E: Entity>(&self, f: impl FnOnce(&mut E::Fields)) -> bool {
        E::slot(&self.slots).edit.lock().edit(f)
    }

    /// Leaves edit mode for kind `E` without saving.
    pub fn cancel_edit<E: Entity>(&self) {
        E::slot(&self.slots).edit.lock().cancel();
    }

    /// A copy of the edit state of kind `E`.
    #[must_use]
    pub fn edit_state<E: Entity>(&self) -> EditState<E::Fields> {
        E::slot(&self.slots).edit.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::loopback::LoopbackRemote;
    use crate::remote::{Method, RemoteError};
    use serde_json::json;
    use taskflow_proto::{Member, METRICS_PATH, Project, TaskFields, TaskStatus};

    fn task_json(id: &str, title: &str) -> serde_json::Value {
        json!({"id": id, "title": title, "status": "Pending", "priority": "High"})
    }

    fn workspace() -> Workspace<LoopbackRemote> {
        Workspace::new(LoopbackRemote::new(), "tester")
    }

    fn metric_fetches(ws: &Workspace<LoopbackRemote>) -> usize {
        ws.remote()
            .requests()
            .iter()
            .filter(|r| r.path == METRICS_PATH)
            .count()
    }

    #[tokio::test]
    async fn first_task_load_fetches_metrics() {
        let ws = workspace();
        ws.remote().serve("/tasks", json!([task_json("t1", "A")]));
        ws.remote().serve(METRICS_PATH, json!({"overdue": 1}));

        let refresh = ws.load(CollectionName::Tasks).await;
        assert!(refresh.is_ok());
        assert!(matches!(refresh.metrics, Some(Ok(MetricsOutcome::Updated))));
        assert_eq!(ws.metrics().unwrap().overdue, 1);
    }

    #[tokio::test]
    async fn metrics_refetch_only_when_task_count_changes() {
        let ws = workspace();
        ws.remote().serve("/tasks", json!([task_json("t1", "A")]));
        ws.remote().serve(METRICS_PATH, json!({}));
        ws.load(CollectionName::Tasks).await;
        assert_eq!(metric_fetches(&ws), 1);

        // Same count, different content.
        ws.remote().serve("/tasks", json!([task_json("t1", "Renamed")]));
        let refresh = ws.load(CollectionName::Tasks).await;
        assert!(refresh.metrics.is_none());
        assert_eq!(metric_fetches(&ws), 1);

        ws.remote()
            .serve("/tasks", json!([task_json("t1", "A"), task_json("t2", "B")]));
        ws.load(CollectionName::Tasks).await;
        assert_eq!(metric_fetches(&ws), 2);
    }

    #[tokio::test]
    async fn non_task_loads_never_fetch_metrics() {
        let ws = workspace();
        ws.remote().serve("/team-members", json!([]));
        ws.remote().serve("/projects", json!([]));
        ws.load(CollectionName::Members).await;
        ws.load(CollectionName::Projects).await;
        assert_eq!(metric_fetches(&ws), 0);
    }

    #[tokio::test]
    async fn failed_task_load_does_not_fetch_metrics() {
        let ws = workspace();
        ws.remote().fail(
            Method::Get,
            "/tasks",
            RemoteError::Status {
                method: Method::Get,
                path: "/tasks".into(),
                status: 500,
            },
        );
        let refresh = ws.load(CollectionName::Tasks).await;
        assert!(!refresh.is_ok());
        assert!(refresh.metrics.is_none());
        assert!(ws.metrics().is_none());
        assert!(ws.metrics_loading());
    }

    #[tokio::test]
    async fn filtered_view_tracks_snapshot_and_filter() {
        let ws = workspace();
        ws.remote().serve(
            "/tasks",
            json!([
                {"id": "t1", "title": "A", "status": "Pending", "priority": "High"},
                {"id": "t2", "title": "B", "status": "Completed", "priority": "High"},
            ]),
        );
        ws.load(CollectionName::Tasks).await;
        assert_eq!(ws.filtered_tasks().len(), 2);

        ws.update_filter(|f| f.set_status(Some(TaskStatus::Completed)));
        let view = ws.filtered_tasks();
        assert_eq!(view.len(), 1);
        assert_eq!(view[0].id, "t2");
        assert_eq!(ws.filter().status, Some(TaskStatus::Completed));
    }

    #[tokio::test]
    async fn begin_edit_copies_record_fields() {
        let ws = workspace();
        ws.remote().serve("/tasks", json!([task_json("t1", "Original")]));
        ws.load(CollectionName::Tasks).await;

        ws.begin_edit::<Task>("t1").unwrap();
        ws.edit::<Task>(|b| b.title = "Changed".into());
        let EditState::Editing { id, buffer } = ws.edit_state::<Task>() else {
            panic!("expected edit mode");
        };
        assert_eq!(id, "t1");
        assert_eq!(buffer.title, "Changed");
        // The snapshot itself is untouched.
        assert_eq!(ws.store().tasks.snapshot()[0].fields.title, "Original");
    }

    #[tokio::test]
    async fn begin_edit_on_another_record_drops_prior_buffer() {
        let ws = workspace();
        ws.remote().serve(
            "/projects",
            json!([
                {"id": "a", "name": "Alpha", "description": "", "status": "Active"},
                {"id": "b", "name": "Beta", "description": "", "status": "Paused"},
            ]),
        );
        ws.load(CollectionName::Projects).await;

        ws.begin_edit::<Project>("b").unwrap();
        ws.edit::<Project>(|b| b.name = "Scratch".into());
        ws.begin_edit::<Project>("a").unwrap();

        let state = ws.edit_state::<Project>();
        assert_eq!(state.editing_id(), Some("a"));
        assert_eq!(state.buffer().unwrap().name, "Alpha");
        assert_eq!(state.buffer().unwrap().status, "Active");
    }

    #[test]
    fn begin_edit_unknown_record_fails() {
        let ws = workspace();
        let err = ws.begin_edit::<Member>("ghost").unwrap_err();
        assert_eq!(
            err,
            EditError::RecordNotFound {
                kind: "team_member",
                id: "ghost".into()
            }
        );
        assert!(!ws.edit_state::<Member>().is_editing());
    }

    #[test]
    fn edit_kinds_are_independent() {
        let ws = workspace();
        ws.set_form::<Task>(TaskFields::titled("draft"));
        ws.update_form::<Project>(|p| p.name = "draft project".into());
        assert_eq!(ws.form::<Task>().title, "draft");
        assert_eq!(ws.form::<Project>().name, "draft project");
        ws.reset_form::<Task>();
        assert_eq!(ws.form::<Task>(), TaskFields::default());
        assert_eq!(ws.form::<Project>().name, "draft project");
    }
}
