//! In-memory session store.
//!
//! Uses `DashMap` for shard-level concurrency and `parking_lot::Mutex` per
//! document for non-poisoning, fast locking; each document carries its own
//! `tokio::sync::broadcast` channel for push fan-out. Patches are applied
//! under the document lock, which is what makes guards a real
//! compare-and-swap.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::models::{CooperativeSession, SessionStatus};
use crate::room_code;

use super::{Guard, SessionOp, SessionPatch, SessionStore};

/// Per-document fan-out capacity. Subscribers that fall behind skip to
/// newer states (`RecvError::Lagged`).
const FANOUT_CAPACITY: usize = 256;

struct SessionDoc {
    session: Arc<CooperativeSession>,
    tx: broadcast::Sender<Arc<CooperativeSession>>,
}

/// DashMap-backed [`SessionStore`] for single-process deployments and tests.
#[derive(Default)]
pub struct MemorySessionStore {
    docs: DashMap<String, Mutex<SessionDoc>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn insert(&self, session: CooperativeSession) -> Result<(), StoreError> {
        let (tx, _) = broadcast::channel(FANOUT_CAPACITY);
        let id = session.id.clone();
        self.docs.insert(
            id,
            Mutex::new(SessionDoc {
                session: Arc::new(session),
                tx,
            }),
        );
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<CooperativeSession>, StoreError> {
        Ok(self
            .docs
            .get(id)
            .map(|doc| CooperativeSession::clone(&doc.lock().session)))
    }

    async fn find_waiting_by_code(
        &self,
        room_code: &str,
    ) -> Result<Option<CooperativeSession>, StoreError> {
        let code = room_code::normalize(room_code);
        for entry in self.docs.iter() {
            let doc = entry.lock();
            if doc.session.status == SessionStatus::Waiting && doc.session.room_code == code {
                return Ok(Some(CooperativeSession::clone(&doc.session)));
            }
        }
        Ok(None)
    }

    async fn apply(&self, id: &str, patch: SessionPatch) -> Result<CooperativeSession, StoreError> {
        let entry = self.docs.get(id).ok_or(StoreError::NotFound)?;
        let mut doc = entry.lock();

        for guard in &patch.guards {
            if !guard_holds(guard, &doc.session) {
                return Err(StoreError::PreconditionFailed(guard.clone()));
            }
        }

        let mut session = CooperativeSession::clone(&doc.session);
        for op in patch.ops {
            apply_op(&mut session, op);
        }
        session.updated_at = Utc::now();

        let session = Arc::new(session);
        doc.session = session.clone();
        // send() errs when nobody is subscribed — that's fine.
        let _ = doc.tx.send(session.clone());

        Ok(CooperativeSession::clone(&session))
    }

    async fn delete(&self, id: &str) -> Result<(), StoreError> {
        // Dropping the entry drops the sender; subscribers see Closed.
        self.docs.remove(id).ok_or(StoreError::NotFound)?;
        Ok(())
    }

    async fn delete_if(&self, id: &str, guards: Vec<Guard>) -> Result<(), StoreError> {
        let mut failed: Option<Guard> = None;
        // remove_if holds the shard lock across the check, so a patch
        // cannot land between the guard evaluation and the removal.
        let removed = self.docs.remove_if(id, |_, doc| {
            let doc = doc.lock();
            match guards.iter().find(|g| !guard_holds(g, &doc.session)) {
                Some(guard) => {
                    failed = Some(guard.clone());
                    false
                }
                None => true,
            }
        });
        match (removed, failed) {
            (Some(_), _) => Ok(()),
            (None, Some(guard)) => Err(StoreError::PreconditionFailed(guard)),
            (None, None) => Err(StoreError::NotFound),
        }
    }

    async fn subscribe(
        &self,
        id: &str,
    ) -> Result<(Arc<CooperativeSession>, broadcast::Receiver<Arc<CooperativeSession>>), StoreError>
    {
        let entry = self.docs.get(id).ok_or(StoreError::NotFound)?;
        let doc = entry.lock();
        Ok((doc.session.clone(), doc.tx.subscribe()))
    }
}

fn guard_holds(guard: &Guard, session: &CooperativeSession) -> bool {
    match guard {
        Guard::BelowCapacity => !session.is_full(),
        Guard::WordUnclaimed(word) => !session.word_claimed(word),
        Guard::StatusIs(status) => session.status == *status,
        Guard::NoPlayers => session.players.is_empty(),
    }
}

fn apply_op(session: &mut CooperativeSession, op: SessionOp) {
    match op {
        SessionOp::PushPlayer(player) => {
            if session.player(&player.id).is_none() {
                session.players.push(player);
            }
        }
        SessionOp::RemovePlayer(player_id) => {
            session.players.retain(|p| p.id != player_id);
            if session.host_id == player_id {
                if let Some(next) = session.players.first() {
                    session.host_id = next.id.clone();
                }
            }
        }
        SessionOp::SetPlayers(players) => session.players = players,
        SessionOp::SetStatus(status) => session.status = status,
        SessionOp::SetStartedAt(at) => session.started_at = Some(at),
        SessionOp::SetTimeRemaining(secs) => session.time_remaining = secs,
        SessionOp::AppendSessionWord(word) => {
            if !session.word_claimed(&word) {
                session.words_found.push(word);
            }
        }
        SessionOp::CreditPlayer {
            player_id,
            word,
            score,
        } => {
            if let Some(player) = session.players.iter_mut().find(|p| p.id == player_id) {
                if !player.words_found.contains(&word) {
                    player.words_found.push(word);
                    player.score += score;
                }
            }
        }
        SessionOp::SetCursor {
            player_id,
            position,
        } => {
            if let Some(player) = session.players.iter_mut().find(|p| p.id == player_id) {
                player.cursor_position = position;
            }
        }
        SessionOp::SetSelection {
            player_id,
            selection,
        } => {
            session.active_selections.insert(player_id, selection);
        }
        SessionOp::ClearSelection(player_id) => {
            session.active_selections.remove(&player_id);
        }
        SessionOp::CompleteIfAllFound(at) => {
            if session.status != SessionStatus::Completed && session.all_words_found() {
                session.status = SessionStatus::Completed;
                session.completed_at = Some(at);
            }
        }
    }
}
