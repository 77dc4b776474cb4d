//! `TaskFlow`: client-side state for a shared task, team, and project
//! workspace backed by a remote record service.
//!
//! The [`workspace::Workspace`] is the entry point. It owns the collection
//! snapshots, the task filter, per-kind create forms and edit state, and
//! the metrics panel, and it coordinates writes with the reloads that make
//! them visible.

pub mod cli;
pub mod config;
pub mod edit;
pub mod filter;
pub mod metrics;
pub mod remote;
pub mod session;
pub mod store;
pub mod views;
pub mod workspace;

pub use remote::{Remote, RemoteError};
pub use workspace::Workspace;
