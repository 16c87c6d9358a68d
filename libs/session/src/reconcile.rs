//! Client-side reconciliation of the pushed session document.
//!
//! Wraps a store subscription: rebuilds the logical 2D grid from the flat
//! store shape before exposing it, tolerates lagged fan-out by skipping to
//! the newest state, and recovers from subscription loss with a bounded
//! backoff-and-resubscribe loop before declaring the session lost. The
//! terminal [`SessionEvent::Lost`] leaves the reconnect-or-exit decision
//! to the caller — retrying means calling [`subscribe`] again; there is no
//! server-side recovery to invoke.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::CoordinatorConfig;
use crate::error::{SessionError, StoreError};
use crate::models::{Cell, CooperativeSession};
use crate::store::SessionStore;

/// Buffered events between the reconciliation task and the caller.
const EVENT_BUFFER: usize = 64;

/// A pushed document in its logical shape.
#[derive(Debug, Clone)]
pub struct SessionView {
    pub session: Arc<CooperativeSession>,
    /// Row-major 2D grid reconstructed from the flat store shape.
    pub grid_rows: Vec<Vec<Cell>>,
}

impl SessionView {
    fn new(session: Arc<CooperativeSession>) -> Self {
        let grid_rows = session.grid.rows();
        Self { session, grid_rows }
    }
}

/// Events delivered to the subscribing client.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The full current document (initial snapshot and every change).
    Snapshot(SessionView),
    /// The subscription dropped; a resubscribe attempt is pending.
    Reconnecting { attempt: u32 },
    /// Terminal: all resubscribe attempts failed. The caller chooses
    /// between leaving and subscribing again.
    Lost,
}

/// Handle to a live reconciliation task. Dropping it cancels the task and
/// unsubscribes (already-applied writes are never reverted).
pub struct SessionSubscription {
    events: mpsc::Receiver<SessionEvent>,
    task: JoinHandle<()>,
}

impl SessionSubscription {
    /// Next event, or `None` once the task has finished after `Lost`.
    pub async fn next(&mut self) -> Option<SessionEvent> {
        self.events.recv().await
    }
}

impl fmt::Debug for SessionSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionSubscription").finish_non_exhaustive()
    }
}

impl Drop for SessionSubscription {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Subscribe to a session document. Fails with `SESSION_NOT_FOUND` when
/// the document does not exist; afterwards the returned handle yields an
/// initial snapshot followed by one snapshot per document change.
pub async fn subscribe(
    store: Arc<dyn SessionStore>,
    session_id: &str,
    config: &CoordinatorConfig,
) -> Result<SessionSubscription, SessionError> {
    let (snapshot, rx) = store.subscribe(session_id).await.map_err(|err| match err {
        StoreError::NotFound => SessionError::SessionNotFound,
        other => SessionError::Store(other),
    })?;

    let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
    let task = tokio::spawn(run(
        store,
        session_id.to_string(),
        snapshot,
        rx,
        events_tx,
        config.reconnect_backoff,
        config.max_reconnect_attempts,
    ));

    Ok(SessionSubscription {
        events: events_rx,
        task,
    })
}

async fn run(
    store: Arc<dyn SessionStore>,
    session_id: String,
    snapshot: Arc<CooperativeSession>,
    mut rx: broadcast::Receiver<Arc<CooperativeSession>>,
    events: mpsc::Sender<SessionEvent>,
    backoff: Duration,
    max_attempts: u32,
) {
    if events
        .send(SessionEvent::Snapshot(SessionView::new(snapshot)))
        .await
        .is_err()
    {
        return;
    }

    loop {
        match rx.recv().await {
            Ok(doc) => {
                if events
                    .send(SessionEvent::Snapshot(SessionView::new(doc)))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                // The next recv skips to the newest retained state.
                tracing::warn!(%session_id, skipped, "subscriber lagged behind session fan-out");
            }
            Err(broadcast::error::RecvError::Closed) => {
                match resubscribe(&store, &session_id, &events, backoff, max_attempts).await {
                    Some(new_rx) => rx = new_rx,
                    None => {
                        let _ = events.send(SessionEvent::Lost).await;
                        return;
                    }
                }
            }
        }
    }
}

/// Bounded backoff-and-resubscribe. Emits a `Reconnecting` event per
/// attempt and a fresh snapshot on success.
async fn resubscribe(
    store: &Arc<dyn SessionStore>,
    session_id: &str,
    events: &mpsc::Sender<SessionEvent>,
    backoff: Duration,
    max_attempts: u32,
) -> Option<broadcast::Receiver<Arc<CooperativeSession>>> {
    for attempt in 1..=max_attempts {
        if events
            .send(SessionEvent::Reconnecting { attempt })
            .await
            .is_err()
        {
            return None;
        }
        time::sleep(backoff).await;

        match store.subscribe(session_id).await {
            Ok((snapshot, rx)) => {
                tracing::info!(session_id, attempt, "session subscription re-established");
                if events
                    .send(SessionEvent::Snapshot(SessionView::new(snapshot)))
                    .await
                    .is_err()
                {
                    return None;
                }
                return Some(rx);
            }
            Err(err) => {
                tracing::debug!(session_id, attempt, ?err, "resubscribe failed");
            }
        }
    }
    tracing::warn!(session_id, max_attempts, "session subscription lost");
    None
}
