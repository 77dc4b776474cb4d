//! `TaskFlow` reference server library.
//!
//! An in-memory implementation of the record service the client talks to.
//! Exposed as a library so tests can start it in-process.

pub mod config;
pub mod service;
pub mod store;
