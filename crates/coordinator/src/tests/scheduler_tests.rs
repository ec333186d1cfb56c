use super::*;
use crate::test_support::{employee, fields, FakeDirectory};
use client_core::DirectoryError;
use tokio::sync::mpsc;

#[tokio::test]
async fn fetch_emits_listed_records_with_its_sequence() {
    let directory = FakeDirectory::with_records(vec![employee("1", "Ann", 0)]);
    let scheduler = EffectScheduler::new(directory);

    let outcome = scheduler.perform(Effect::Fetch { seq: 1 }).await;
    assert_eq!(
        outcome,
        Some(Action::FetchSucceeded {
            seq: 1,
            records: vec![employee("1", "Ann", 0)],
        })
    );
    assert_eq!(scheduler.latest_fetch(), 1);
}

#[tokio::test]
async fn superseded_fetch_outcome_is_not_emitted() {
    let directory = FakeDirectory::with_records(Vec::new());
    let release_first = directory
        .script_list(Ok(vec![employee("1", "Stale", 0)]))
        .await;
    directory
        .script_list_now(Ok(vec![employee("2", "Fresh", 1)]))
        .await;
    let scheduler = EffectScheduler::new(directory);

    let slow = tokio::spawn({
        let scheduler = scheduler.clone();
        async move { scheduler.perform(Effect::Fetch { seq: 1 }).await }
    });
    tokio::task::yield_now().await;

    let fresh = scheduler.perform(Effect::Fetch { seq: 2 }).await;
    assert!(matches!(fresh, Some(Action::FetchSucceeded { seq: 2, .. })));

    release_first.send(()).expect("release");
    let stale = slow.await.expect("join");
    assert_eq!(stale, None);
    assert_eq!(scheduler.latest_fetch(), 2);
}

#[tokio::test]
async fn fetch_failure_is_normalized() {
    let directory = FakeDirectory::with_records(Vec::new());
    directory
        .fail("list", DirectoryError::transport("connection refused"))
        .await;
    let scheduler = EffectScheduler::new(directory);

    match scheduler.perform(Effect::Fetch { seq: 1 }).await {
        Some(Action::FetchFailed { seq, error }) => {
            assert_eq!(seq, 1);
            assert_eq!(error.kind, ErrorKind::Transport);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn add_distinguishes_server_rejection_from_transport() {
    let directory = FakeDirectory::with_records(Vec::new());
    directory
        .fail(
            "create",
            DirectoryError::Rejected {
                status: 400,
                message: "Invalid email address!".into(),
            },
        )
        .await;
    let scheduler = EffectScheduler::new(directory.clone());

    match scheduler.perform(Effect::Add { fields: fields("Cy") }).await {
        Some(Action::AddFailed(error)) => {
            assert_eq!(error.kind, ErrorKind::ServerRejected);
            assert_eq!(error.status, Some(400));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    match scheduler.perform(Effect::Add { fields: fields("Cy") }).await {
        Some(Action::AddSucceeded(record)) => assert_eq!(record.name, "Cy"),
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(directory.calls().await, vec!["create", "create"]);
}

#[tokio::test]
async fn update_of_missing_record_fails_with_not_found() {
    let scheduler = EffectScheduler::new(FakeDirectory::with_records(Vec::new()));

    let outcome = scheduler
        .perform(Effect::Update {
            id: EmployeeId::new("9"),
            fields: fields("Nobody"),
        })
        .await;
    match outcome {
        Some(Action::UpdateFailed { id, error }) => {
            assert_eq!(id, EmployeeId::new("9"));
            assert_eq!(error.kind, ErrorKind::NotFound);
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
}

#[tokio::test]
async fn delete_of_absent_record_is_success() {
    let directory = FakeDirectory::with_records(vec![employee("1", "Ann", 0)]);
    let scheduler = EffectScheduler::new(directory.clone());
    let id = EmployeeId::new("1");

    for _ in 0..2 {
        assert_eq!(
            scheduler.perform(Effect::Delete { id: id.clone() }).await,
            Some(Action::DeleteSucceeded(id.clone()))
        );
    }
    assert!(directory.records().await.is_empty());
}

#[tokio::test]
async fn delete_rejection_is_failure() {
    let directory = FakeDirectory::with_records(vec![employee("1", "Ann", 0)]);
    directory
        .fail(
            "remove:1",
            DirectoryError::Rejected {
                status: 500,
                message: "boom".into(),
            },
        )
        .await;
    let scheduler = EffectScheduler::new(directory);

    assert!(matches!(
        scheduler
            .perform(Effect::Delete {
                id: EmployeeId::new("1")
            })
            .await,
        Some(Action::DeleteFailed { .. })
    ));
}

#[tokio::test]
async fn spawned_effect_reports_panics_as_failures() {
    let directory = FakeDirectory::with_records(Vec::new());
    directory.panic_on("create").await;
    let scheduler = EffectScheduler::new(directory);
    let (tx, mut rx) = mpsc::unbounded_channel();

    scheduler
        .spawn(Effect::Add { fields: fields("Cy") }, tx)
        .await
        .expect("task completes");

    match rx.recv().await {
        Some(Some(Action::AddFailed(error))) => assert_eq!(error.kind, ErrorKind::Transport),
        other => panic!("unexpected completion: {other:?}"),
    }
}

#[test]
fn resume_starts_from_settled_fetch() {
    let mut state = RosterState::default();
    state.fetches.issued = 4;
    state.fetches.settled = 3;

    let scheduler = EffectScheduler::resume(FakeDirectory::with_records(Vec::new()), &state);
    assert_eq!(scheduler.latest_fetch(), 3);
}

#[test]
fn failure_intent_matches_effect() {
    let error = ErrorInfo::new(ErrorKind::Transport, "offline");
    assert_eq!(
        Effect::Fetch { seq: 3 }.failed(error.clone()),
        Action::FetchFailed {
            seq: 3,
            error: error.clone()
        }
    );
    assert_eq!(
        Effect::Delete {
            id: EmployeeId::new("1")
        }
        .failed(error.clone()),
        Action::DeleteFailed {
            id: EmployeeId::new("1"),
            error
        }
    );
}
