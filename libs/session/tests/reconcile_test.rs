mod common;

use std::time::Duration;

use gridmates_session::reconcile::{self, SessionEvent};
use gridmates_session::store::SessionStore;
use gridmates_session::{CoordinatorConfig, SessionError};

use common::{coordinator_with_config, create_request, profile};

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig {
        reconnect_backoff: Duration::from_millis(10),
        max_reconnect_attempts: 2,
        ..CoordinatorConfig::default()
    }
}

#[tokio::test]
async fn subscribe_to_unknown_session_fails() {
    let (coord, _) = coordinator_with_config(fast_config());
    let err = reconcile::subscribe(coord.store(), "ses_missing", coord.config())
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::SessionNotFound));
}

#[tokio::test]
async fn initial_snapshot_exposes_the_logical_grid_shape() {
    let (coord, _) = coordinator_with_config(fast_config());
    let session_id = coord
        .create(create_request("plr_a", &["CHAT", "CHIEN"], 4))
        .await
        .unwrap();

    let mut sub = reconcile::subscribe(coord.store(), &session_id, coord.config())
        .await
        .unwrap();

    match sub.next().await.unwrap() {
        SessionEvent::Snapshot(view) => {
            let size = view.session.grid.size as usize;
            assert_eq!(view.grid_rows.len(), size);
            assert!(view.grid_rows.iter().all(|row| row.len() == size));
            // Row 0 starts with the first placed word.
            let spelled: String = view.grid_rows[0][..4].iter().map(|c| c.letter).collect();
            assert_eq!(spelled, "CHAT");
        }
        other => panic!("expected initial snapshot, got {other:?}"),
    }
}

#[tokio::test]
async fn every_applied_update_is_pushed_to_subscribers() {
    let (coord, store) = coordinator_with_config(fast_config());
    let session_id = coord
        .create(create_request("plr_a", &["CHAT"], 4))
        .await
        .unwrap();
    let code = store.get(&session_id).await.unwrap().unwrap().room_code;

    let mut sub = reconcile::subscribe(coord.store(), &session_id, coord.config())
        .await
        .unwrap();
    // Drain the initial snapshot.
    assert!(matches!(
        sub.next().await.unwrap(),
        SessionEvent::Snapshot(_)
    ));

    coord
        .join_by_code(&code, "plr_b", profile("Bea"))
        .await
        .unwrap();

    match sub.next().await.unwrap() {
        SessionEvent::Snapshot(view) => {
            assert_eq!(view.session.players.len(), 2);
            assert_eq!(view.session.players[1].id, "plr_b");
        }
        other => panic!("expected snapshot after join, got {other:?}"),
    }
}

#[tokio::test]
async fn lost_subscription_backs_off_then_goes_terminal() {
    let (coord, store) = coordinator_with_config(fast_config());
    let session_id = coord
        .create(create_request("plr_a", &["CHAT"], 4))
        .await
        .unwrap();

    let mut sub = reconcile::subscribe(coord.store(), &session_id, coord.config())
        .await
        .unwrap();
    assert!(matches!(
        sub.next().await.unwrap(),
        SessionEvent::Snapshot(_)
    ));

    // The document disappears out from under the subscriber.
    store.delete(&session_id).await.unwrap();

    assert!(matches!(
        sub.next().await.unwrap(),
        SessionEvent::Reconnecting { attempt: 1 }
    ));
    assert!(matches!(
        sub.next().await.unwrap(),
        SessionEvent::Reconnecting { attempt: 2 }
    ));
    assert!(matches!(sub.next().await.unwrap(), SessionEvent::Lost));
    // Task is done; the stream ends.
    assert!(sub.next().await.is_none());
}

#[tokio::test]
async fn resubscribe_within_the_window_recovers_with_a_snapshot() {
    let (coord, store) = coordinator_with_config(CoordinatorConfig {
        reconnect_backoff: Duration::from_millis(100),
        max_reconnect_attempts: 3,
        ..CoordinatorConfig::default()
    });
    let session_id = coord
        .create(create_request("plr_a", &["CHAT"], 4))
        .await
        .unwrap();
    let snapshot = store.get(&session_id).await.unwrap().unwrap();

    let mut sub = reconcile::subscribe(coord.store(), &session_id, coord.config())
        .await
        .unwrap();
    assert!(matches!(
        sub.next().await.unwrap(),
        SessionEvent::Snapshot(_)
    ));

    store.delete(&session_id).await.unwrap();
    assert!(matches!(
        sub.next().await.unwrap(),
        SessionEvent::Reconnecting { attempt: 1 }
    ));

    // The document comes back while the backoff window is still open.
    store.insert(snapshot).await.unwrap();

    match sub.next().await.unwrap() {
        SessionEvent::Snapshot(view) => assert_eq!(view.session.id, session_id),
        other => panic!("expected recovery snapshot, got {other:?}"),
    }
}
