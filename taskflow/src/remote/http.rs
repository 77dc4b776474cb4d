//! HTTP remote backed by `reqwest`.

use std::time::Duration;

use serde_json::Value;
use url::Url;

use super::{Method, Remote, RemoteError, Request};

/// Talks JSON to the service at a fixed base address.
#[derive(Debug, Clone)]
pub struct HttpRemote {
    client: reqwest::Client,
    base: Url,
}

impl HttpRemote {
    /// Creates a remote for the given base address (e.g. `http://localhost:8000`).
    ///
    /// A request path is appended to the base, so a base with a path prefix
    /// such as `http://host/api` addresses `http://host/api/tasks`.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::InvalidBase`] if the address does not parse or
    /// cannot carry a path, and [`RemoteError::Transport`] if the HTTP client
    /// cannot be built.
    pub fn new(base: &str, timeout: Option<Duration>) -> Result<Self, RemoteError> {
        let base = Url::parse(base).map_err(|_| RemoteError::InvalidBase(base.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(RemoteError::InvalidBase(base.to_string()));
        }
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        Ok(Self { client, base })
    }

    /// Base address requests are resolved against.
    #[must_use]
    pub const fn base(&self) -> &Url {
        &self.base
    }

    /// Resolves a collection path and optional record id against the base.
    ///
    /// Each segment is percent-encoded. The id is always one segment, so a
    /// `/` inside it is escaped rather than starting a new one.
    fn url_for(&self, path: &str, id: Option<&str>) -> Result<Url, RemoteError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| RemoteError::InvalidBase(self.base.to_string()))?;
            segments.pop_if_empty();
            segments.extend(path.split('/').filter(|s| !s.is_empty()));
            if let Some(id) = id {
                segments.push(id);
            }
        }
        Ok(url)
    }
}

impl Remote for HttpRemote {
    async fn execute(&self, request: Request) -> Result<Value, RemoteError> {
        let url = self.url_for(&request.path, request.id.as_deref())?;
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                method: request.method,
                path: request.target(),
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        if bytes.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&bytes).map_err(|e| RemoteError::Malformed(e.to_string()))
    }
}
