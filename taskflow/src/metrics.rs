//! Metrics loader.
//!
//! Holds the latest [`MetricsSnapshot`] and decides when to fetch a new
//! one: whenever the task collection's record count differs from the count
//! last observed. Count-preserving edits and member or project changes do
//! not trigger a fetch.

use parking_lot::RwLock;

use taskflow_proto::{METRICS_PATH, MetricsSnapshot};

use crate::remote::{Remote, RemoteError, Request};
use crate::store::ticket::{Settled, TicketBook};

/// Errors from fetching the metrics snapshot.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// The request failed.
    #[error("fetching metrics failed: {0}")]
    Remote(#[from] RemoteError),

    /// The body was JSON but not a metrics snapshot.
    #[error("metrics response has an unexpected shape: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// What happened to a metrics fetch that completed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricsOutcome {
    /// The snapshot was replaced.
    Updated,
    /// A newer snapshot was already held; the response was discarded.
    Stale,
}

struct MetricsState {
    snapshot: Option<MetricsSnapshot>,
    tickets: TicketBook,
    observed_tasks: Option<usize>,
}

/// Latest metrics snapshot plus the bookkeeping that decides refetches.
pub struct MetricsLoader {
    state: RwLock<MetricsState>,
}

impl Default for MetricsLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsLoader {
    /// A loader with no snapshot and no task count observed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: RwLock::new(MetricsState {
                snapshot: None,
                tickets: TicketBook::new(),
                observed_tasks: None,
            }),
        }
    }

    /// The latest snapshot, if one has loaded.
    #[must_use]
    pub fn snapshot(&self) -> Option<MetricsSnapshot> {
        self.state.read().snapshot.clone()
    }

    /// Whether a fetch is in flight or nothing has loaded yet.
    #[must_use]
    pub fn loading(&self) -> bool {
        self.state.read().tickets.loading()
    }

    /// Records the task count of a freshly applied task snapshot.
    ///
    /// Returns `true` when the count differs from the last one observed,
    /// meaning the caller should fetch metrics. The first observation always
    /// returns `true`.
    pub fn observe_task_count(&self, count: usize) -> bool {
        let mut state = self.state.write();
        let changed = state.observed_tasks != Some(count);
        state.observed_tasks = Some(count);
        changed
    }

    /// Fetches a new snapshot.
    ///
    /// A response older than the snapshot already held is discarded. On
    /// failure the previous snapshot is kept.
    ///
    /// # Errors
    ///
    /// Returns [`MetricsError`] if the request fails or the body does not
    /// decode.
    pub async fn refresh<R: Remote>(&self, remote: &R) -> Result<MetricsOutcome, MetricsError> {
        let ticket = self.state.write().tickets.issue();
        tracing::debug!(ticket, "fetching metrics");

        let result = match remote.execute(Request::get(METRICS_PATH)).await {
            Ok(body) => {
                serde_json::from_value::<MetricsSnapshot>(body).map_err(MetricsError::from)
            }
            Err(e) => Err(MetricsError::from(e)),
        };

        let mut state = self.state.write();
        match result {
            Ok(snapshot) => match state.tickets.succeed(ticket) {
                Settled::Apply => {
                    state.snapshot = Some(snapshot);
                    Ok(MetricsOutcome::Updated)
                }
                Settled::Discard => {
                    tracing::debug!(ticket, "discarded stale metrics");
                    Ok(MetricsOutcome::Stale)
                }
            },
            Err(e) => {
                state.tickets.fail(ticket);
                tracing::warn!(ticket, error = %e, "metrics fetch failed");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::Method;
    use crate::remote::loopback::LoopbackRemote;
    use serde_json::json;

    #[test]
    fn first_observation_triggers() {
        let loader = MetricsLoader::new();
        assert!(loader.observe_task_count(0));
        assert!(!loader.observe_task_count(0));
        assert!(loader.observe_task_count(1));
        assert!(!loader.observe_task_count(1));
        assert!(loader.observe_task_count(0));
    }

    #[tokio::test]
    async fn refresh_stores_snapshot() {
        let remote = LoopbackRemote::new();
        remote.serve(
            METRICS_PATH,
            json!({
                "completed_today": 2,
                "pending_vs_completed": {"pending": 3, "completed": 2},
                "overdue": 1,
                "project_progress": [],
                "member_productivity": [],
            }),
        );
        let loader = MetricsLoader::new();
        assert!(loader.loading());
        assert_eq!(
            loader.refresh(&remote).await.unwrap(),
            MetricsOutcome::Updated
        );
        let snapshot = loader.snapshot().unwrap();
        assert_eq!(snapshot.completed_today, 2);
        assert_eq!(snapshot.pending_vs_completed.pending, 3);
        assert!(!loader.loading());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_previous_snapshot() {
        let remote = LoopbackRemote::new();
        remote.serve(METRICS_PATH, json!({"overdue": 4}));
        let loader = MetricsLoader::new();
        loader.refresh(&remote).await.unwrap();

        remote.fail(Method::Get, METRICS_PATH, RemoteError::Transport("down".into()));
        let err = loader.refresh(&remote).await.unwrap_err();
        assert!(matches!(err, MetricsError::Remote(_)));
        assert_eq!(loader.snapshot().unwrap().overdue, 4);
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let remote = LoopbackRemote::new();
        remote.serve(METRICS_PATH, json!("not metrics"));
        let loader = MetricsLoader::new();
        assert!(matches!(
            loader.refresh(&remote).await,
            Err(MetricsError::Malformed(_))
        ));
        assert!(loader.snapshot().is_none());
    }
}
