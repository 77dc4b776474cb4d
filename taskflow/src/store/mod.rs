//! Collection store: the four server-backed record sets held in memory.
//!
//! Every load replaces a collection wholesale; there is no partial update.
//! Loads of the same collection may overlap and resolve in any order, so
//! each load carries a ticket (see [`ticket`]) and a response older than
//! the snapshot already held is discarded instead of applied.

pub mod ticket;

use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::RwLock;
use serde::de::DeserializeOwned;

use taskflow_proto::{ActivityEntry, CollectionName, Member, Project, Task};

use crate::remote::{Remote, RemoteError, Request};

use ticket::{Settled, TicketBook};

/// Errors that can occur while loading a collection.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The request failed.
    #[error("loading {collection} failed: {source}")]
    Remote {
        /// Collection being loaded.
        collection: CollectionName,
        /// Underlying failure.
        source: RemoteError,
    },

    /// The response was JSON but not a list of the expected records.
    #[error("{collection} response has an unexpected shape: {source}")]
    Malformed {
        /// Collection being loaded.
        collection: CollectionName,
        /// Decoding error.
        source: serde_json::Error,
    },
}

/// What happened to a load that completed successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response replaced the collection.
    Applied {
        /// Number of records now held.
        count: usize,
    },
    /// A newer load had already been applied; the response was discarded.
    Stale,
}

/// Loading state of one collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionStatus {
    /// A load is in flight, or the collection has never loaded.
    pub loading: bool,
    /// At least one load has been applied.
    pub loaded: bool,
    /// Number of records held.
    pub len: usize,
}

struct CollectionState<T> {
    items: Arc<[T]>,
    tickets: TicketBook,
}

/// One named collection and its loading state.
pub struct Collection<T> {
    name: CollectionName,
    state: RwLock<CollectionState<T>>,
}

impl<T> Collection<T> {
    /// Creates an empty, not-yet-loaded collection.
    #[must_use]
    pub fn new(name: CollectionName) -> Self {
        Self {
            name,
            state: RwLock::new(CollectionState {
                items: Arc::from(Vec::new()),
                tickets: TicketBook::new(),
            }),
        }
    }

    /// Which collection this is.
    #[must_use]
    pub const fn name(&self) -> CollectionName {
        self.name
    }

    /// The current snapshot. Cheap to clone; never changes once returned.
    #[must_use]
    pub fn snapshot(&self) -> Arc<[T]> {
        Arc::clone(&self.state.read().items)
    }

    /// Current loading state.
    #[must_use]
    pub fn status(&self) -> CollectionStatus {
        let state = self.state.read();
        CollectionStatus {
            loading: state.tickets.loading(),
            loaded: state.tickets.has_applied(),
            len: state.items.len(),
        }
    }

    /// Marks a load as started and returns its ticket.
    fn begin(&self) -> u64 {
        self.state.write().tickets.issue()
    }

    /// Settles a load, replacing the contents if its response is the newest.
    fn settle(
        &self,
        ticket: u64,
        result: Result<Vec<T>, LoadError>,
    ) -> Result<LoadOutcome, LoadError> {
        let mut state = self.state.write();
        match result {
            Ok(items) => match state.tickets.succeed(ticket) {
                Settled::Apply => {
                    let count = items.len();
                    state.items = Arc::from(items);
                    Ok(LoadOutcome::Applied { count })
                }
                Settled::Discard => Ok(LoadOutcome::Stale),
            },
            Err(e) => {
                state.tickets.fail(ticket);
                Err(e)
            }
        }
    }
}

impl<T: DeserializeOwned> Collection<T> {
    /// Reads the whole collection from the service and replaces the snapshot.
    ///
    /// The loading flag is raised for the duration. On failure the prior
    /// snapshot is kept.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the request fails or the body does not
    /// decode as a list of `T`.
    pub async fn load<R: Remote>(&self, remote: &R) -> Result<LoadOutcome, LoadError> {
        let ticket = self.begin();
        let collection = self.name;
        tracing::debug!(%collection, ticket, "loading collection");

        let result = match remote.execute(Request::get(collection.path())).await {
            Ok(body) => serde_json::from_value::<Vec<T>>(body)
                .map_err(|source| LoadError::Malformed { collection, source }),
            Err(source) => Err(LoadError::Remote { collection, source }),
        };

        let outcome = self.settle(ticket, result);
        match &outcome {
            Ok(LoadOutcome::Applied { count }) => {
                tracing::debug!(%collection, ticket, count, "collection replaced");
            }
            Ok(LoadOutcome::Stale) => {
                tracing::debug!(%collection, ticket, "discarded stale response");
            }
            Err(e) => tracing::warn!(%collection, ticket, error = %e, "collection load failed"),
        }
        outcome
    }
}

/// Holds the four collections of a workspace session.
pub struct CollectionStore {
    /// Tasks.
    pub tasks: Collection<Task>,
    /// Team members.
    pub members: Collection<Member>,
    /// Projects.
    pub projects: Collection<Project>,
    /// Activity log, newest first as served.
    pub activity: Collection<ActivityEntry>,
}

impl Default for CollectionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CollectionStore {
    /// Creates a store with every collection not yet loaded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tasks: Collection::new(CollectionName::Tasks),
            members: Collection::new(CollectionName::Members),
            projects: Collection::new(CollectionName::Projects),
            activity: Collection::new(CollectionName::Activity),
        }
    }

    /// Loads one collection by name.
    ///
    /// # Errors
    ///
    /// Returns [`LoadError`] if the load fails; the prior snapshot is kept.
    pub async fn load<R: Remote>(
        &self,
        remote: &R,
        name: CollectionName,
    ) -> Result<LoadOutcome, LoadError> {
        match name {
            CollectionName::Tasks => self.tasks.load(remote).await,
            CollectionName::Members => self.members.load(remote).await,
            CollectionName::Projects => self.projects.load(remote).await,
            CollectionName::Activity => self.activity.load(remote).await,
        }
    }

    /// Loads all four collections concurrently.
    ///
    /// Returns each collection's outcome in [`CollectionName::ALL`] order.
    pub async fn load_all<R: Remote>(
        &self,
        remote: &R,
    ) -> Vec<(CollectionName, Result<LoadOutcome, LoadError>)> {
        let loads = CollectionName::ALL
            .map(|name| async move { (name, self.load(remote, name).await) });
        join_all(loads).await
    }

    /// Loading state of a collection by name.
    #[must_use]
    pub fn status(&self, name: CollectionName) -> CollectionStatus {
        match name {
            CollectionName::Tasks => self.tasks.status(),
            CollectionName::Members => self.members.status(),
            CollectionName::Projects => self.projects.status(),
            CollectionName::Activity => self.activity.status(),
        }
    }
}
