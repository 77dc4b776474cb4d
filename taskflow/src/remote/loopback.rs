//! Scripted in-process remote for testing.
//!
//! [`LoopbackRemote`] answers requests from a table of canned responses,
//! records every request it sees, and can hold individual responses back
//! until the test releases them. Holding responses is how tests reproduce
//! overlapping loads that resolve out of issue order.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;

use super::{Method, Remote, RemoteError, Request};

type Reply = Result<Value, RemoteError>;

/// In-process remote driven by a response script.
///
/// Unscripted `GET`s fail with a 404 status; unscripted writes succeed and
/// echo their body back (or `null` for `DELETE`).
#[derive(Default)]
pub struct LoopbackRemote {
    /// Standing answers, keyed by verb and path.
    replies: Mutex<HashMap<(Method, String), Reply>>,
    /// Answers that the test releases by hand, consumed in FIFO order.
    held: Mutex<HashMap<(Method, String), VecDeque<oneshot::Receiver<Reply>>>>,
    /// Every request executed, in arrival order.
    log: Mutex<Vec<Request>>,
}

impl LoopbackRemote {
    /// Creates a remote with no scripted responses.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the standing answer for `method path`.
    ///
    /// `path` is matched against [`Request::target`], id included.
    pub fn reply(&self, method: Method, path: &str, reply: Reply) {
        self.replies.lock().insert((method, path.to_string()), reply);
    }

    /// Sets the standing answer for `GET path` to a successful body.
    pub fn serve(&self, path: &str, body: Value) {
        self.reply(Method::Get, path, Ok(body));
    }

    /// Makes every `method path` request fail with the given error.
    pub fn fail(&self, method: Method, path: &str, error: RemoteError) {
        self.reply(method, path, Err(error));
    }

    /// Holds back the next `method path` response.
    ///
    /// The matching request suspends until the returned sender is used.
    /// Dropping the sender fails the request with a transport error.
    pub fn hold(&self, method: Method, path: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.held
            .lock()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(rx);
        tx
    }

    /// Returns a copy of every request executed so far.
    #[must_use]
    pub fn requests(&self) -> Vec<Request> {
        self.log.lock().clone()
    }

    /// Returns the requests that were not plain reads.
    #[must_use]
    pub fn writes(&self) -> Vec<Request> {
        self.log
            .lock()
            .iter()
            .filter(|r| r.method != Method::Get)
            .cloned()
            .collect()
    }

    /// Forgets the request log.
    pub fn clear_log(&self) {
        self.log.lock().clear();
    }

    fn standing_reply(&self, request: &Request) -> Reply {
        let key = (request.method, request.target());
        if let Some(reply) = self.replies.lock().get(&key) {
            return reply.clone();
        }
        match request.method {
            Method::Get => Err(RemoteError::Status {
                method: request.method,
                path: request.target(),
                status: 404,
            }),
            Method::Post | Method::Put => Ok(request.body.clone().unwrap_or(Value::Null)),
            Method::Delete => Ok(Value::Null),
        }
    }
}

impl Remote for LoopbackRemote {
    async fn execute(&self, request: Request) -> Result<Value, RemoteError> {
        self.log.lock().push(request.clone());

        let held = {
            let mut held = self.held.lock();
            held.get_mut(&(request.method, request.target()))
                .and_then(VecDeque::pop_front)
        };

        match held {
            Some(rx) => rx
                .await
                .unwrap_or_else(|_| Err(RemoteError::Transport("held reply dropped".into()))),
            None => self.standing_reply(&request),
        }
    }
}
