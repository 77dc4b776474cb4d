//! Integration tests for the session bridge: commands in, events out, with
//! the workspace talking HTTP to the reference server.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::timeout;

use taskflow::metrics::MetricsOutcome;
use taskflow::remote::http::HttpRemote;
use taskflow::session::{SessionCommand, SessionEvent, spawn_session};
use taskflow::store::LoadOutcome;
use taskflow::workspace::{Mutation, Workspace};
use taskflow_proto::{
    CollectionName, EntityKind, Member, MemberFields, Project, ProjectFields, Task, TaskFields,
};
use taskflow_server::service::start_server;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn workspace() -> Arc<Workspace<HttpRemote>> {
    let (addr, _handle) = start_server("127.0.0.1:0")
        .await
        .expect("failed to start server");
    let remote = HttpRemote::new(&format!("http://{addr}"), Some(Duration::from_secs(5)))
        .expect("valid base address");
    Arc::new(Workspace::new(remote, "session-test"))
}

/// Receives events until `done` matches one, returning everything received.
async fn collect_until(
    rx: &mut mpsc::Receiver<SessionEvent>,
    mut done: impl FnMut(&SessionEvent) -> bool,
) -> Vec<SessionEvent> {
    let mut events = Vec::new();
    loop {
        let event = timeout(Duration::from_secs(5), rx.recv())
            .await
            .expect("timed out waiting for session event")
            .expect("event stream closed");
        let finished = done(&event);
        events.push(event);
        if finished {
            return events;
        }
    }
}

fn is_mutation_result(event: &SessionEvent) -> bool {
    matches!(
        event,
        SessionEvent::MutationSucceeded { .. } | SessionEvent::MutationFailed { .. }
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn load_all_reports_every_collection() {
    let ws = workspace().await;
    let (tx, mut rx) = spawn_session(ws, 16);
    tx.send(SessionCommand::LoadAll).await.unwrap();

    let mut loaded = Vec::new();
    let events = collect_until(&mut rx, |e| {
        if let SessionEvent::Loaded { collection, .. } = e {
            loaded.push(*collection);
        }
        loaded.len() == CollectionName::ALL.len()
    })
    .await;
    assert!(events.iter().all(|e| !matches!(e, SessionEvent::LoadFailed { .. })));
    assert!(events.contains(&SessionEvent::MetricsUpdated(MetricsOutcome::Updated)));
}

#[tokio::test]
async fn create_reports_refreshes_then_success() {
    let ws = workspace().await;
    ws.set_form::<Task>(TaskFields::titled("From the UI"));
    let (tx, mut rx) = spawn_session(Arc::clone(&ws), 16);
    tx.send(SessionCommand::Create(EntityKind::Task)).await.unwrap();

    let events = collect_until(&mut rx, is_mutation_result).await;
    assert_eq!(
        events[0],
        SessionEvent::Loaded {
            collection: CollectionName::Tasks,
            outcome: LoadOutcome::Applied { count: 1 },
        }
    );
    assert_eq!(
        events[1],
        SessionEvent::MetricsUpdated(MetricsOutcome::Updated)
    );
    assert_eq!(
        events[2],
        SessionEvent::Loaded {
            collection: CollectionName::Activity,
            outcome: LoadOutcome::Applied { count: 1 },
        }
    );
    let SessionEvent::MutationSucceeded {
        kind,
        mutation,
        id,
        fully_refreshed,
    } = &events[3]
    else {
        panic!("unexpected event {:?}", events[3]);
    };
    assert_eq!(*kind, EntityKind::Task);
    assert_eq!(*mutation, Mutation::Create);
    assert!(*fully_refreshed);
    assert_eq!(id.as_deref(), Some(ws.store().tasks.snapshot()[0].id.as_str()));
}

#[tokio::test]
async fn edit_submitted_through_session() {
    let ws = workspace().await;
    ws.set_form::<Member>(MemberFields::new("Ada", "Engineer", "ada@example.com"));
    let id = ws.create::<Member>().await.unwrap().id.unwrap();

    ws.begin_edit::<Member>(&id).unwrap();
    ws.edit::<Member>(|b| b.role = "Lead".into());
    let (tx, mut rx) = spawn_session(Arc::clone(&ws), 16);
    tx.send(SessionCommand::SubmitEdit(EntityKind::Member))
        .await
        .unwrap();

    let events = collect_until(&mut rx, is_mutation_result).await;
    assert!(matches!(
        events.last(),
        Some(SessionEvent::MutationSucceeded {
            mutation: Mutation::Update,
            ..
        })
    ));
    assert!(!ws.edit_state::<Member>().is_editing());
    assert_eq!(ws.store().members.snapshot()[0].fields.role, "Lead");
}

#[tokio::test]
async fn delete_of_unknown_id_fails() {
    let ws = workspace().await;
    let (tx, mut rx) = spawn_session(ws, 16);
    tx.send(SessionCommand::Delete {
        kind: EntityKind::Project,
        id: "missing".into(),
    })
    .await
    .unwrap();

    let events = collect_until(&mut rx, is_mutation_result).await;
    let [SessionEvent::MutationFailed { kind, error, .. }] = events.as_slice() else {
        panic!("unexpected events {events:?}");
    };
    assert_eq!(*kind, EntityKind::Project);
    assert!(error.contains("404"), "error was {error}");
}

#[tokio::test]
async fn independent_mutations_both_land() {
    let ws = workspace().await;
    ws.set_form::<Member>(MemberFields::new("Grace", "Engineer", "grace@example.com"));
    ws.set_form::<Project>(ProjectFields::named("Apollo"));
    let (tx, mut rx) = spawn_session(Arc::clone(&ws), 16);
    tx.send(SessionCommand::Create(EntityKind::Member))
        .await
        .unwrap();
    tx.send(SessionCommand::Create(EntityKind::Project))
        .await
        .unwrap();

    let mut finished = 0;
    let events = collect_until(&mut rx, |e| {
        if is_mutation_result(e) {
            finished += 1;
        }
        finished == 2
    })
    .await;
    let succeeded = events
        .iter()
        .filter(|e| matches!(e, SessionEvent::MutationSucceeded { .. }))
        .count();
    assert_eq!(succeeded, 2);

    ws.load(CollectionName::Activity).await;
    assert_eq!(ws.store().activity.snapshot().len(), 2);
}

#[tokio::test]
async fn dropping_commands_stops_dispatcher() {
    let ws = workspace().await;
    let (tx, mut rx) = spawn_session(ws, 16);
    drop(tx);
    let next = timeout(Duration::from_secs(5), rx.recv()).await.unwrap();
    assert!(next.is_none());
}
