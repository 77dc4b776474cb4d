//! Remote service abstraction for `TaskFlow`.
//!
//! Defines the [`Remote`] trait the workspace issues every request through.
//! Concrete implementations:
//! - [`http::HttpRemote`]: JSON over HTTP via `reqwest`
//! - [`loopback::LoopbackRemote`]: scripted in-process remote for testing

pub mod http;
pub mod loopback;

use std::fmt;

use serde_json::Value;

/// HTTP verb of a [`Request`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// Read a collection or snapshot.
    Get,
    /// Create a record.
    Post,
    /// Replace a record's mutable fields.
    Put,
    /// Remove a record.
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// One request against the service.
#[derive(Debug, Clone, PartialEq)]
pub struct Request {
    /// HTTP verb.
    pub method: Method,
    /// Collection path relative to the service base, e.g. `/tasks`.
    pub path: String,
    /// Record id appended to `path` as one opaque segment, for `PUT` and
    /// `DELETE`.
    pub id: Option<String>,
    /// JSON body, for `POST` and `PUT`.
    pub body: Option<Value>,
}

impl Request {
    /// `GET path`.
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            path: path.into(),
            id: None,
            body: None,
        }
    }

    /// `POST path` with a JSON body.
    pub fn post(path: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            path: path.into(),
            id: None,
            body: Some(body),
        }
    }

    /// `PUT path/id` with a JSON body.
    pub fn put(path: impl Into<String>, id: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Put,
            path: path.into(),
            id: Some(id.into()),
            body: Some(body),
        }
    }

    /// `DELETE path/id`.
    pub fn delete(path: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            path: path.into(),
            id: Some(id.into()),
            body: None,
        }
    }

    /// The addressed resource as one string, e.g. `/tasks/t1`.
    ///
    /// For logs and lookups only; the id is not escaped.
    #[must_use]
    pub fn target(&self) -> String {
        match &self.id {
            Some(id) => format!("{}/{id}", self.path),
            None => self.path.clone(),
        }
    }
}

/// Ways a request can fail.
///
/// The workspace does not distinguish between these beyond "the operation
/// did not succeed"; they exist for logging and for tests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RemoteError {
    /// The request never reached the service, or no response came back.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The service answered with a non-success status.
    #[error("{method} {path} returned status {status}")]
    Status {
        /// Verb of the failed request.
        method: Method,
        /// Target of the failed request.
        path: String,
        /// HTTP status code.
        status: u16,
    },

    /// The response body was not valid JSON.
    #[error("malformed response body: {0}")]
    Malformed(String),

    /// The configured base address cannot be used.
    #[error("invalid service address {0:?}")]
    InvalidBase(String),
}

/// Async request executor.
///
/// Implementations carry one JSON request to the service and hand back the
/// decoded JSON response. They never interpret the body: shaping requests
/// and decoding responses into entities happens in the workspace.
pub trait Remote: Send + Sync {
    /// Executes a request and returns the response body.
    ///
    /// An empty response body is returned as [`Value::Null`].
    fn execute(
        &self,
        request: Request,
    ) -> impl std::future::Future<Output = Result<Value, RemoteError>> + Send;
}
