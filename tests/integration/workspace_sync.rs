//! Integration tests: the workspace over real HTTP against the reference
//! server.
//!
//! Each test starts `taskflow-server` on `127.0.0.1:0` and drives a
//! `Workspace<HttpRemote>` through loads, edits, and mutations.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use taskflow::edit::EditState;
use taskflow::remote::RemoteError;
use taskflow::remote::http::HttpRemote;
use taskflow::store::LoadOutcome;
use taskflow::views::{TaskRow, UNASSIGNED};
use taskflow::workspace::{MutationError, Workspace};
use taskflow_proto::{
    CollectionName, Member, MemberFields, Project, ProjectFields, Task, TaskFields, TaskPriority,
    TaskStatus,
};
use taskflow_server::service::{ServiceState, start_server_with_state};
use taskflow_server::store::TaskQuery;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Harness {
    ws: Workspace<HttpRemote>,
    state: Arc<ServiceState>,
    _server: tokio::task::JoinHandle<()>,
}

async fn start() -> Harness {
    let state = Arc::new(ServiceState::new());
    let (addr, server) = start_server_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .expect("failed to start server");
    let remote = HttpRemote::new(&format!("http://{addr}"), Some(Duration::from_secs(5)))
        .expect("valid base address");
    Harness {
        ws: Workspace::new(remote, "integration"),
        state,
        _server: server,
    }
}

async fn create_member(ws: &Workspace<HttpRemote>, name: &str) -> String {
    ws.set_form::<Member>(MemberFields::new(name, "Engineer", "dev@example.com"));
    ws.create::<Member>().await.unwrap().id.unwrap()
}

async fn create_task(ws: &Workspace<HttpRemote>, fields: TaskFields) -> String {
    ws.set_form::<Task>(fields);
    ws.create::<Task>().await.unwrap().id.unwrap()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fresh_workspace_loads_empty_collections() {
    let h = start().await;
    for refresh in h.ws.load_all().await {
        assert!(matches!(
            refresh.outcome,
            Ok(LoadOutcome::Applied { count: 0 })
        ));
    }
    for name in CollectionName::ALL {
        let status = h.ws.store().status(name);
        assert!(status.loaded);
        assert!(!status.loading);
    }
    // First task load always pulls metrics.
    assert!(h.ws.metrics().is_some());
}

#[tokio::test]
async fn unreachable_service_reports_load_failure() {
    // Nothing listens on a port we just released.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let remote = HttpRemote::new(&format!("http://{addr}"), Some(Duration::from_secs(2))).unwrap();
    let ws = Workspace::new(remote, "integration");
    let refresh = ws.load(CollectionName::Tasks).await;
    assert!(refresh.outcome.is_err());
    assert!(refresh.metrics.is_none());

    let status = ws.store().status(CollectionName::Tasks);
    assert!(!status.loaded);
    assert!(status.loading);
    assert!(ws.store().tasks.snapshot().is_empty());
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_task_shows_up_after_refresh() {
    let h = start().await;
    let mut fields = TaskFields::titled("Fix login");
    fields.priority = TaskPriority::Urgent;
    fields.due_date = NaiveDate::from_ymd_opt(2030, 6, 1);
    h.ws.set_form::<Task>(fields);

    let report = h.ws.create::<Task>().await.unwrap();
    assert!(report.fully_refreshed());
    assert_eq!(h.ws.form::<Task>(), TaskFields::default());

    let tasks = h.ws.store().tasks.snapshot();
    assert_eq!(tasks.len(), 1);
    assert_eq!(Some(tasks[0].id.as_str()), report.id.as_deref());
    assert_eq!(tasks[0].fields.priority, TaskPriority::Urgent);
    assert_eq!(tasks[0].fields.due_date, NaiveDate::from_ymd_opt(2030, 6, 1));
    assert!(tasks[0].history.ends_with("integration created task"));

    let activity = h.ws.store().activity.snapshot();
    assert_eq!(activity[0].details, "Added Fix login");
    assert_eq!(activity[0].entity_type, "task");
}

#[tokio::test]
async fn empty_title_never_reaches_the_server() {
    let h = start().await;
    h.ws.set_form::<Task>(TaskFields::titled(""));
    let err = h.ws.create::<Task>().await.unwrap_err();
    assert!(matches!(err, MutationError::Invalid(_)));
    assert!(h.state.store.list_tasks(&TaskQuery::default()).await.is_empty());
    assert!(h.state.store.activity(10).await.is_empty());
}

#[tokio::test]
async fn edit_round_trip_returns_to_idle() {
    let h = start().await;
    let id = create_task(&h.ws, TaskFields::titled("Draft")).await;

    h.ws.begin_edit::<Task>(&id).unwrap();
    h.ws.edit::<Task>(|b| {
        b.title = "Final".into();
        b.status = TaskStatus::Completed;
    });
    h.ws.submit_edit::<Task>().await.unwrap();

    assert_eq!(h.ws.edit_state::<Task>(), EditState::Idle);
    let tasks = h.ws.store().tasks.snapshot();
    assert_eq!(tasks[0].fields.title, "Final");
    assert_eq!(tasks[0].fields.status, TaskStatus::Completed);
    assert_eq!(tasks[0].history.lines().count(), 2);
}

#[tokio::test]
async fn update_of_vanished_record_keeps_edit_mode() {
    let h = start().await;
    let id = create_task(&h.ws, TaskFields::titled("Doomed")).await;
    h.ws.begin_edit::<Task>(&id).unwrap();
    h.ws.edit::<Task>(|b| b.title = "Saved?".into());

    // Someone else deletes it first.
    h.state.store.delete_task(&id).await.unwrap();

    let err = h.ws.submit_edit::<Task>().await.unwrap_err();
    let MutationError::Remote { source, .. } = err else {
        panic!("expected remote failure, got {err:?}");
    };
    assert!(matches!(source, RemoteError::Status { status: 404, .. }));
    assert_eq!(h.ws.edit_state::<Task>().editing_id(), Some(id.as_str()));
    assert_eq!(h.ws.edit_state::<Task>().buffer().unwrap().title, "Saved?");
}

#[tokio::test]
async fn deleting_member_leaves_dangling_reference() {
    let h = start().await;
    let ada = create_member(&h.ws, "Ada").await;
    let mut fields = TaskFields::titled("Review");
    fields.assignee_id = Some(ada.clone());
    create_task(&h.ws, fields).await;

    h.ws.load(CollectionName::Members).await;
    assert_eq!(h.ws.store().members.snapshot()[0].workload, 1);

    h.ws.delete::<Member>(&ada).await.unwrap();
    h.ws.load(CollectionName::Tasks).await;

    let tasks = h.ws.store().tasks.snapshot();
    assert_eq!(tasks[0].fields.assignee_id.as_deref(), Some(ada.as_str()));
    let members = h.ws.store().members.snapshot();
    assert!(members.is_empty());
    let row = TaskRow::build(&tasks[0], &members, &[]);
    assert_eq!(row.assignee, UNASSIGNED);
}

#[tokio::test]
async fn project_edit_and_delete() {
    let h = start().await;
    h.ws.set_form::<Project>(ProjectFields::named("Apollo"));
    let id = h.ws.create::<Project>().await.unwrap().id.unwrap();
    assert_eq!(h.ws.store().projects.snapshot()[0].fields.status, "Active");

    h.ws.begin_edit::<Project>(&id).unwrap();
    h.ws.edit::<Project>(|b| b.status = "Paused".into());
    h.ws.submit_edit::<Project>().await.unwrap();
    assert_eq!(h.ws.store().projects.snapshot()[0].fields.status, "Paused");

    h.ws.delete::<Project>(&id).await.unwrap();
    assert!(h.ws.store().projects.snapshot().is_empty());
    let activity = h.ws.store().activity.snapshot();
    let actions: Vec<_> = activity.iter().map(|e| e.action.as_str()).collect();
    assert_eq!(actions, ["delete", "update", "create"]);
}

// ---------------------------------------------------------------------------
// Metrics and filtering
// ---------------------------------------------------------------------------

#[tokio::test]
async fn metrics_follow_task_count() {
    let h = start().await;
    h.ws.load(CollectionName::Tasks).await;
    assert_eq!(h.ws.metrics().unwrap().pending_vs_completed.pending, 0);

    let report = {
        h.ws.set_form::<Task>(TaskFields::titled("One"));
        h.ws.create::<Task>().await.unwrap()
    };
    // The task reload saw a new count and refetched metrics.
    assert!(report.refreshed[0].metrics.is_some());
    assert_eq!(h.ws.metrics().unwrap().pending_vs_completed.pending, 1);

    // Same count: no refetch.
    let refresh = h.ws.load(CollectionName::Tasks).await;
    assert!(refresh.metrics.is_none());
}

#[tokio::test]
async fn filter_scenario_over_loaded_tasks() {
    let h = start().await;
    let mut t1 = TaskFields::titled("t1");
    t1.priority = TaskPriority::High;
    let mut t2 = TaskFields::titled("t2");
    t2.priority = TaskPriority::High;
    t2.status = TaskStatus::Completed;
    create_task(&h.ws, t1).await;
    create_task(&h.ws, t2).await;

    h.ws.update_filter(|f| f.set_status(Some(TaskStatus::Pending)));
    let titles: Vec<_> = h
        .ws
        .filtered_tasks()
        .into_iter()
        .map(|t| t.fields.title)
        .collect();
    assert_eq!(titles, ["t1"]);

    h.ws.update_filter(|f| {
        f.clear();
        f.set_priority(Some(TaskPriority::High));
    });
    let titles: Vec<_> = h
        .ws
        .filtered_tasks()
        .into_iter()
        .map(|t| t.fields.title)
        .collect();
    assert_eq!(titles, ["t1", "t2"]);
}
