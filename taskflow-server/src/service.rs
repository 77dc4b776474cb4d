//! HTTP surface of the reference server.
//!
//! ```text
//! GET    /tasks[?assignee_id&project_id&status&priority&due_before&due_after&search]
//! GET    /team-members | /projects | /metrics | /activity[?limit=1..=200]
//! POST   /tasks | /team-members | /projects
//! PUT    /tasks/{id} | /team-members/{id} | /projects/{id}
//! DELETE /tasks/{id} | /team-members/{id} | /projects/{id}
//! ```
//!
//! Unknown ids answer 404 and rejected fields 422, each with a
//! `{"detail": ...}` body.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{Value, json};

use taskflow_proto::{
    ActivityEntry, CollectionName, METRICS_PATH, Member, MemberFields, MetricsSnapshot, Project,
    ProjectFields, Task, TaskPayload,
};

use crate::store::{
    DEFAULT_ACTIVITY_LIMIT, MAX_ACTIVITY_LIMIT, RecordStore, StoreError, TaskQuery,
};

/// Shared server state.
#[derive(Debug)]
pub struct ServiceState {
    /// The record sheets.
    pub store: RecordStore,
    /// Page size of `GET /activity` when the request gives none.
    activity_limit: usize,
}

impl Default for ServiceState {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceState {
    /// Creates an empty state with the default activity page size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_activity_limit(DEFAULT_ACTIVITY_LIMIT)
    }

    /// Creates an empty state with a custom activity page size.
    #[must_use]
    pub fn with_activity_limit(activity_limit: usize) -> Self {
        Self {
            store: RecordStore::new(),
            activity_limit,
        }
    }
}

/// Errors returned by handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// A store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// `?limit` outside the accepted range.
    #[error("limit must be between 1 and 200")]
    BadLimit,
}

impl ServiceError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Store(StoreError::NotFound { .. }) => StatusCode::NOT_FOUND,
            Self::Store(StoreError::Invalid(_)) | Self::BadLimit => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(%status, error = %self, "request rejected");
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

type Shared = State<Arc<ServiceState>>;

/// Builds the router over `state`.
pub fn router(state: Arc<ServiceState>) -> Router {
    let item = |c: CollectionName| format!("{}/{{id}}", c.path());
    Router::new()
        .route(
            CollectionName::Tasks.path(),
            get(list_tasks).post(create_task),
        )
        .route(
            &item(CollectionName::Tasks),
            put(update_task).delete(delete_task),
        )
        .route(
            CollectionName::Members.path(),
            get(list_members).post(create_member),
        )
        .route(
            &item(CollectionName::Members),
            put(update_member).delete(delete_member),
        )
        .route(
            CollectionName::Projects.path(),
            get(list_projects).post(create_project),
        )
        .route(
            &item(CollectionName::Projects),
            put(update_project).delete(delete_project),
        )
        .route(CollectionName::Activity.path(), get(list_activity))
        .route(METRICS_PATH, get(metrics))
        .with_state(state)
}

/// Starts the server with a fresh, empty state.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    start_server_with_state(addr, Arc::new(ServiceState::new())).await
}

/// Starts the server over a pre-built [`ServiceState`].
///
/// Returns the bound address (useful with port 0) and the serving task.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_state(
    addr: &str,
    state: Arc<ServiceState>,
) -> Result<
    (std::net::SocketAddr, tokio::task::JoinHandle<()>),
    Box<dyn std::error::Error + Send + Sync>,
> {
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server error");
        }
    });

    Ok((bound_addr, handle))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn list_tasks(State(state): Shared, Query(query): Query<TaskQuery>) -> Json<Vec<Task>> {
    Json(state.store.list_tasks(&query).await)
}

async fn create_task(
    State(state): Shared,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<Task>, ServiceError> {
    Ok(Json(state.store.create_task(payload).await?))
}

async fn update_task(
    State(state): Shared,
    Path(id): Path<String>,
    Json(payload): Json<TaskPayload>,
) -> Result<Json<Task>, ServiceError> {
    Ok(Json(state.store.update_task(&id, payload).await?))
}

async fn delete_task(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    state.store.delete_task(&id).await?;
    Ok(deleted())
}

async fn list_members(State(state): Shared) -> Json<Vec<Member>> {
    Json(state.store.list_members().await)
}

async fn create_member(
    State(state): Shared,
    Json(fields): Json<MemberFields>,
) -> Result<Json<Member>, ServiceError> {
    Ok(Json(state.store.create_member(fields).await?))
}

async fn update_member(
    State(state): Shared,
    Path(id): Path<String>,
    Json(fields): Json<MemberFields>,
) -> Result<Json<Member>, ServiceError> {
    Ok(Json(state.store.update_member(&id, fields).await?))
}

async fn delete_member(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    state.store.delete_member(&id).await?;
    Ok(deleted())
}

async fn list_projects(State(state): Shared) -> Json<Vec<Project>> {
    Json(state.store.list_projects().await)
}

async fn create_project(
    State(state): Shared,
    Json(fields): Json<ProjectFields>,
) -> Result<Json<Project>, ServiceError> {
    Ok(Json(state.store.create_project(fields).await?))
}

async fn update_project(
    State(state): Shared,
    Path(id): Path<String>,
    Json(fields): Json<ProjectFields>,
) -> Result<Json<Project>, ServiceError> {
    Ok(Json(state.store.update_project(&id, fields).await?))
}

async fn delete_project(
    State(state): Shared,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServiceError> {
    state.store.delete_project(&id).await?;
    Ok(deleted())
}

#[derive(Debug, Default, serde::Deserialize)]
struct ActivityQuery {
    limit: Option<usize>,
}

async fn list_activity(
    State(state): Shared,
    Query(query): Query<ActivityQuery>,
) -> Result<Json<Vec<ActivityEntry>>, ServiceError> {
    let limit = page_size(query.limit, state.activity_limit)?;
    Ok(Json(state.store.activity(limit).await))
}

async fn metrics(State(state): Shared) -> Json<MetricsSnapshot> {
    Json(state.store.metrics().await)
}

fn deleted() -> Json<Value> {
    Json(json!({ "status": "deleted" }))
}

fn page_size(requested: Option<usize>, default: usize) -> Result<usize, ServiceError> {
    match requested {
        None => Ok(default),
        Some(n) if (1..=MAX_ACTIVITY_LIMIT).contains(&n) => Ok(n),
        Some(_) => Err(ServiceError::BadLimit),
    }
}
