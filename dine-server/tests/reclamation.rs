mod common;

use std::time::Duration;

use common::{create_table, guest, set_last_activity, setup};
use dine_server::SessionError;
use dine_server::db::repository::dining_table;
use dine_server::sessions::{SessionReclaimScheduler, run_manual_cleanup};
use shared::models::{SessionStatus, TableAvailability};
use shared::util::{hours_to_millis, now_millis};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn idle_sessions_past_threshold_are_abandoned() {
    let (_dir, state) = setup().await;
    let stale_table = create_table(&state, 1, "T1").await;
    let fresh_table = create_table(&state, 1, "T2").await;

    let stale = state
        .sessions
        .create_or_get_session(stale_table.id, 1, &guest("a"))
        .await
        .unwrap()
        .session;
    let fresh = state
        .sessions
        .create_or_get_session(fresh_table.id, 1, &guest("b"))
        .await
        .unwrap()
        .session;

    let now = now_millis();
    set_last_activity(&state, stale.id, now - hours_to_millis(4) - 1_000).await;
    // A minute inside the window
    set_last_activity(&state, fresh.id, now - hours_to_millis(4) + 60_000).await;

    let report = state.sessions.cleanup_abandoned_sessions(4).await.unwrap();
    assert_eq!(report.cleaned, 1);
    assert_eq!(report.sessions[0].session_id, stale.id);
    assert!(report.sessions[0].last_activity_at <= report.cutoff);

    let stale = state.sessions.find_by_id(stale.id).await.unwrap();
    assert_eq!(stale.status, SessionStatus::Abandoned);
    let t = dining_table::find_by_id(&state.pool, stale_table.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(t.availability, TableAvailability::Available);

    let fresh = state.sessions.find_by_id(fresh.id).await.unwrap();
    assert_eq!(fresh.status, SessionStatus::Active);
}

#[tokio::test]
async fn idle_for_exactly_the_threshold_is_abandoned() {
    let (_dir, state) = setup().await;
    let at_table = create_table(&state, 1, "T1").await;
    let inside_table = create_table(&state, 1, "T2").await;

    let at = state
        .sessions
        .create_or_get_session(at_table.id, 1, &guest("a"))
        .await
        .unwrap()
        .session;
    let inside = state
        .sessions
        .create_or_get_session(inside_table.id, 1, &guest("b"))
        .await
        .unwrap()
        .session;

    let now = now_millis();
    set_last_activity(&state, at.id, now - hours_to_millis(4)).await;
    set_last_activity(&state, inside.id, now - hours_to_millis(4) + 1).await;

    let report = state
        .sessions
        .cleanup_abandoned_sessions_at(4, now)
        .await
        .unwrap();
    assert_eq!(report.cutoff, now - hours_to_millis(4));
    assert_eq!(report.cleaned, 1);
    assert_eq!(report.sessions[0].session_id, at.id);

    let inside = state.sessions.find_by_id(inside.id).await.unwrap();
    assert_eq!(inside.status, SessionStatus::Active);
}

#[tokio::test]
async fn cleanup_is_reentrant() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let session = state
        .sessions
        .create_or_get_session(table.id, 1, &guest("a"))
        .await
        .unwrap()
        .session;
    set_last_activity(&state, session.id, now_millis() - hours_to_millis(5)).await;

    assert_eq!(state.sessions.cleanup_abandoned_sessions(4).await.unwrap().cleaned, 1);
    let second = state.sessions.cleanup_abandoned_sessions(4).await.unwrap();
    assert_eq!(second.cleaned, 0);
    assert!(second.sessions.is_empty());
}

#[tokio::test]
async fn abandoned_session_rejects_orders_and_table_reopens() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let old = state
        .sessions
        .create_or_get_session(table.id, 1, &guest("a"))
        .await
        .unwrap()
        .session;
    set_last_activity(&state, old.id, now_millis() - hours_to_millis(10)).await;
    state.sessions.cleanup_abandoned_sessions(4).await.unwrap();

    let err = state
        .sessions
        .add_order_to_session(old.id, "late", 3.0)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        SessionError::InvalidState {
            status: SessionStatus::Abandoned,
            ..
        }
    ));
    let token = old.session_token.as_str().to_string();
    assert!(state.sessions.validate_session(&token, table.id).await.is_none());

    let fresh = state
        .sessions
        .create_or_get_session(table.id, 1, &guest("b"))
        .await
        .unwrap();
    assert!(fresh.is_new);
}

#[tokio::test]
async fn manual_cleanup_refuses_to_overlap() {
    let (_dir, state) = setup().await;

    let permit = state.reclaim_guard.try_acquire().unwrap();
    let err = run_manual_cleanup(&state.sessions, &state.reclaim_guard, 4)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::CleanupInProgress));

    // A scheduled tick while busy is skipped
    let scheduler = SessionReclaimScheduler::new(
        state.sessions.clone(),
        state.reclaim_guard.clone(),
        4,
        Duration::from_secs(3600),
        CancellationToken::new(),
    );
    assert!(scheduler.sweep().await.is_none());

    drop(permit);
    let report = run_manual_cleanup(&state.sessions, &state.reclaim_guard, 4)
        .await
        .unwrap();
    assert_eq!(report.cleaned, 0);
    assert!(scheduler.sweep().await.is_some());
}

#[tokio::test]
async fn scheduler_sweeps_at_startup_and_stops_on_shutdown() {
    let (_dir, state) = setup().await;
    let table = create_table(&state, 1, "T1").await;
    let session = state
        .sessions
        .create_or_get_session(table.id, 1, &guest("a"))
        .await
        .unwrap()
        .session;
    set_last_activity(&state, session.id, now_millis() - hours_to_millis(6)).await;

    let shutdown = CancellationToken::new();
    let scheduler = SessionReclaimScheduler::new(
        state.sessions.clone(),
        state.reclaim_guard.clone(),
        4,
        Duration::from_secs(3600),
        shutdown.clone(),
    );
    let handle = tokio::spawn(scheduler.run());

    let mut abandoned = false;
    for _ in 0..50 {
        let s = state.sessions.find_by_id(session.id).await.unwrap();
        if s.status == SessionStatus::Abandoned {
            abandoned = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(abandoned);

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn failed_sweeps_are_contained_and_the_loop_keeps_running() {
    let (_dir, state) = setup().await;
    let shutdown = CancellationToken::new();
    let scheduler = SessionReclaimScheduler::new(
        state.sessions.clone(),
        state.reclaim_guard.clone(),
        4,
        Duration::from_millis(20),
        shutdown.clone(),
    );

    // Every storage call fails from here on
    state.pool.close().await;

    assert!(scheduler.sweep().await.is_none());
    // The permit is released after a failed run
    assert!(!state.reclaim_guard.is_running());

    let handle = tokio::spawn(scheduler.run());
    tokio::time::sleep(Duration::from_millis(150)).await;
    assert!(!handle.is_finished());

    shutdown.cancel();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .unwrap()
        .unwrap();
}
