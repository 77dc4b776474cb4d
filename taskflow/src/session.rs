//! Session bridge between a UI loop and the async workspace.
//!
//! A UI loop should never await the network. It sends [`SessionCommand`]s
//! and drains [`SessionEvent`]s instead:
//!
//! ```text
//! UI loop  ─── SessionCommand ──▶  dispatcher ──▶ one tokio task per command
//!          ◀── SessionEvent ────────────────────────────────┘
//! ```
//!
//! Each command runs as its own task, so a mutation's write-then-refresh
//! chain is sequential while independent commands interleave freely.

use std::sync::Arc;

use tokio::sync::mpsc;

use taskflow_proto::{CollectionName, EntityKind};

use crate::metrics::{MetricsError, MetricsOutcome};
use crate::remote::Remote;
use crate::store::LoadOutcome;
use crate::workspace::{Mutation, MutationError, MutationReport, Refresh, Workspace};

/// Default capacity of the command and event channels.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Requests from the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Reload one collection.
    Load(CollectionName),
    /// Reload all four collections concurrently.
    LoadAll,
    /// Submit the create form of a kind.
    Create(EntityKind),
    /// Save the edit buffer of a kind.
    SubmitEdit(EntityKind),
    /// Delete a record.
    Delete {
        /// Kind of the record.
        kind: EntityKind,
        /// Record id.
        id: String,
    },
    /// Refetch metrics regardless of the task count.
    RefreshMetrics,
    /// Stop accepting commands. Commands already running still finish.
    Shutdown,
}

/// Notifications to the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A collection load finished.
    Loaded {
        /// Which collection.
        collection: CollectionName,
        /// Whether the response was applied or discarded as stale.
        outcome: LoadOutcome,
    },
    /// A collection load failed; the previous snapshot is still in place.
    LoadFailed {
        /// Which collection.
        collection: CollectionName,
        /// What went wrong.
        error: String,
    },
    /// A write succeeded and its follow-up reloads have finished.
    MutationSucceeded {
        /// Kind written.
        kind: EntityKind,
        /// Which write.
        mutation: Mutation,
        /// Record id, when known.
        id: Option<String>,
        /// Whether every follow-up reload succeeded.
        fully_refreshed: bool,
    },
    /// A write was rejected or failed; nothing changed locally.
    MutationFailed {
        /// Kind written.
        kind: EntityKind,
        /// Which write.
        mutation: Mutation,
        /// What went wrong.
        error: String,
    },
    /// A metrics fetch finished.
    MetricsUpdated(MetricsOutcome),
    /// A metrics fetch failed; the previous snapshot is still in place.
    MetricsFailed(String),
}

/// Starts the dispatcher and returns the command sender and event receiver.
///
/// Must be called from within a tokio runtime. The dispatcher stops on
/// [`SessionCommand::Shutdown`] or when every command sender is dropped.
pub fn spawn_session<R: Remote + 'static>(
    workspace: Arc<Workspace<R>>,
    capacity: usize,
) -> (mpsc::Sender<SessionCommand>, mpsc::Receiver<SessionEvent>) {
    let (cmd_tx, cmd_rx) = mpsc::channel::<SessionCommand>(capacity);
    let (evt_tx, evt_rx) = mpsc::channel::<SessionEvent>(capacity);
    tokio::spawn(async move {
        dispatch(workspace, cmd_rx, evt_tx).await;
    });
    (cmd_tx, evt_rx)
}

async fn dispatch<R: Remote + 'static>(
    workspace: Arc<Workspace<R>>,
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    evt_tx: mpsc::Sender<SessionEvent>,
) {
    while let Some(cmd) = cmd_rx.recv().await {
        if cmd == SessionCommand::Shutdown {
            tracing::info!("session dispatcher shutting down");
            break;
        }
        tracing::debug!(?cmd, "dispatching");
        let ws = Arc::clone(&workspace);
        let tx = evt_tx.clone();
        tokio::spawn(async move {
            run(&ws, cmd, &tx).await;
        });
    }
}

async fn run<R: Remote>(
    ws: &Workspace<R>,
    cmd: SessionCommand,
    tx: &mpsc::Sender<SessionEvent>,
) {
    let mut events = Vec::new();
    match cmd {
        SessionCommand::Load(collection) => push_refresh(&mut events, ws.load(collection).await),
        SessionCommand::LoadAll => {
            for refresh in ws.load_all().await {
                push_refresh(&mut events, refresh);
            }
        }
        SessionCommand::Create(kind) => {
            let result = ws.create_kind(kind).await;
            push_mutation(&mut events, kind, Mutation::Create, result);
        }
        SessionCommand::SubmitEdit(kind) => {
            let result = ws.submit_edit_kind(kind).await;
            push_mutation(&mut events, kind, Mutation::Update, result);
        }
        SessionCommand::Delete { kind, id } => {
            let result = ws.delete_kind(kind, &id).await;
            push_mutation(&mut events, kind, Mutation::Delete, result);
        }
        SessionCommand::RefreshMetrics => push_metrics(&mut events, ws.refresh_metrics().await),
        SessionCommand::Shutdown => {}
    }

    for event in events {
        if tx.send(event).await.is_err() {
            // UI dropped the receiver.
            break;
        }
    }
}

fn push_refresh(events: &mut Vec<SessionEvent>, refresh: Refresh) {
    let collection = refresh.collection;
    events.push(match refresh.outcome {
        Ok(outcome) => SessionEvent::Loaded {
            collection,
            outcome,
        },
        Err(e) => SessionEvent::LoadFailed {
            collection,
            error: e.to_string(),
        },
    });
    if let Some(metrics) = refresh.metrics {
        push_metrics(events, metrics);
    }
}

fn push_metrics(events: &mut Vec<SessionEvent>, result: Result<MetricsOutcome, MetricsError>) {
    events.push(match result {
        Ok(outcome) => SessionEvent::MetricsUpdated(outcome),
        Err(e) => SessionEvent::MetricsFailed(e.to_string()),
    });
}

fn push_mutation(
    events: &mut Vec<SessionEvent>,
    kind: EntityKind,
    mutation: Mutation,
    result: Result<MutationReport, MutationError>,
) {
    match result {
        Ok(report) => {
            let fully_refreshed = report.fully_refreshed();
            let id = report.id;
            for refresh in report.refreshed {
                push_refresh(events, refresh);
            }
            events.push(SessionEvent::MutationSucceeded {
                kind,
                mutation,
                id,
                fully_refreshed,
            });
        }
        Err(e) => events.push(SessionEvent::MutationFailed {
            kind,
            mutation,
            error: e.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::loopback::LoopbackRemote;
    use serde_json::json;
    use taskflow_proto::Task;

    fn workspace() -> Arc<Workspace<LoopbackRemote>> {
        let remote = LoopbackRemote::new();
        remote.serve("/tasks", json!([]));
        remote.serve("/activity", json!([]));
        remote.serve("/metrics", json!({}));
        Arc::new(Workspace::new(remote, "local-user"))
    }

    #[tokio::test]
    async fn load_reports_collection_then_metrics() {
        let (cmd_tx, mut evt_rx) = spawn_session(workspace(), 16);
        cmd_tx
            .send(SessionCommand::Load(CollectionName::Tasks))
            .await
            .unwrap();

        assert_eq!(
            evt_rx.recv().await.unwrap(),
            SessionEvent::Loaded {
                collection: CollectionName::Tasks,
                outcome: LoadOutcome::Applied { count: 0 },
            }
        );
        assert_eq!(
            evt_rx.recv().await.unwrap(),
            SessionEvent::MetricsUpdated(MetricsOutcome::Updated)
        );
    }

    #[tokio::test]
    async fn rejected_create_reports_failure() {
        let (cmd_tx, mut evt_rx) = spawn_session(workspace(), 16);
        cmd_tx
            .send(SessionCommand::Create(EntityKind::Task))
            .await
            .unwrap();

        let event = evt_rx.recv().await.unwrap();
        let SessionEvent::MutationFailed {
            kind,
            mutation,
            error,
        } = event
        else {
            panic!("unexpected event {event:?}");
        };
        assert_eq!(kind, EntityKind::Task);
        assert_eq!(mutation, Mutation::Create);
        assert_eq!(error, "task title cannot be empty");
    }

    #[tokio::test]
    async fn mutation_success_follows_its_refreshes() {
        let ws = workspace();
        ws.set_form::<Task>(taskflow_proto::TaskFields::titled("Ship"));
        let (cmd_tx, mut evt_rx) = spawn_session(Arc::clone(&ws), 16);
        cmd_tx
            .send(SessionCommand::Create(EntityKind::Task))
            .await
            .unwrap();

        let mut events = Vec::new();
        while let Some(event) = evt_rx.recv().await {
            let done = matches!(event, SessionEvent::MutationSucceeded { .. });
            events.push(event);
            if done {
                break;
            }
        }
        let collections: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Loaded { collection, .. } => Some(*collection),
                _ => None,
            })
            .collect();
        assert_eq!(
            collections,
            [CollectionName::Tasks, CollectionName::Activity]
        );
        assert!(matches!(
            events.last(),
            Some(SessionEvent::MutationSucceeded {
                fully_refreshed: true,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn shutdown_closes_event_stream() {
        let (cmd_tx, mut evt_rx) = spawn_session(workspace(), 16);
        cmd_tx.send(SessionCommand::Shutdown).await.unwrap();
        assert!(evt_rx.recv().await.is_none());
    }
}
