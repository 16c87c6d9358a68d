//! The session persistence abstraction.
//!
//! One document per session. The store offers per-document atomic updates
//! expressed as typed field operations ([`SessionOp`]), optional update
//! guards (the compare-and-swap primitive word-submission arbitration
//! relies on), and a push-based subscription that delivers the full
//! document to every subscriber after each change.
//!
//! Backed by [`memory::MemorySessionStore`] in this repository and in
//! tests; a hosted document store can implement the same trait.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;

use crate::error::StoreError;
use crate::models::{CooperativeSession, CursorPosition, Player, Selection, SessionStatus};

pub use memory::MemorySessionStore;

/// A precondition checked atomically with the patch that carries it.
/// If the guard does not hold against the current document, the patch is
/// rejected with [`StoreError::PreconditionFailed`] and nothing changes.
#[derive(Debug, Clone, PartialEq)]
pub enum Guard {
    /// The session still has a free player slot.
    BelowCapacity,
    /// The given canonical word is not yet in the session's `words_found`.
    WordUnclaimed(String),
    /// The session is still in the given status.
    StatusIs(SessionStatus),
    /// No players remain in the session.
    NoPlayers,
}

/// One atomic field operation on the session document.
#[derive(Debug, Clone)]
pub enum SessionOp {
    /// Array-append, union by player id: a no-op if the id is present.
    PushPlayer(Player),
    /// Array-remove by player id. If the removed player was the host and
    /// players remain, the first remaining player (join order) becomes
    /// host in the same update.
    RemovePlayer(String),
    /// Whole-array write (read-modify-write callers such as `set_ready`).
    SetPlayers(Vec<Player>),
    SetStatus(SessionStatus),
    SetStartedAt(DateTime<Utc>),
    SetTimeRemaining(u32),
    /// Append a canonical word to the session-level `words_found`.
    AppendSessionWord(String),
    /// Append a word to a player's `words_found` and add to their score.
    CreditPlayer {
        player_id: String,
        word: String,
        score: u32,
    },
    /// Sub-path write of a single player's cursor.
    SetCursor {
        player_id: String,
        position: Option<CursorPosition>,
    },
    /// Sub-path write of a single player's ephemeral selection.
    SetSelection {
        player_id: String,
        selection: Selection,
    },
    ClearSelection(String),
    /// Set `completed`/`completed_at` iff every target word is now found.
    CompleteIfAllFound(DateTime<Utc>),
}

/// A guarded batch of operations applied atomically to one document.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub guards: Vec<Guard>,
    pub ops: Vec<SessionOp>,
}

impl SessionPatch {
    pub fn new(ops: Vec<SessionOp>) -> Self {
        Self { guards: Vec::new(), ops }
    }

    pub fn guarded(guards: Vec<Guard>, ops: Vec<SessionOp>) -> Self {
        Self { guards, ops }
    }
}

/// Document CRUD + subscribe contract for cooperative sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a freshly created session document.
    async fn insert(&self, session: CooperativeSession) -> Result<(), StoreError>;

    /// Fetch the current document, if it exists.
    async fn get(&self, id: &str) -> Result<Option<CooperativeSession>, StoreError>;

    /// Find the single `waiting` session with this (normalized) room code.
    async fn find_waiting_by_code(
        &self,
        room_code: &str,
    ) -> Result<Option<CooperativeSession>, StoreError>;

    /// Apply a guarded patch atomically and fan the new document out to
    /// every subscriber. Returns the updated document.
    async fn apply(&self, id: &str, patch: SessionPatch) -> Result<CooperativeSession, StoreError>;

    /// Remove the document. Subscribers observe their stream closing.
    async fn delete(&self, id: &str) -> Result<(), StoreError>;

    /// Remove the document only if every guard still holds, atomically
    /// with the check. Used for the empty-session cleanup, where a
    /// concurrent join must win over the delete.
    async fn delete_if(&self, id: &str, guards: Vec<Guard>) -> Result<(), StoreError>;

    /// Subscribe to document changes. Returns the current document (the
    /// initial snapshot) plus a receiver that yields the full document
    /// after every subsequent change.
    async fn subscribe(
        &self,
        id: &str,
    ) -> Result<(Arc<CooperativeSession>, broadcast::Receiver<Arc<CooperativeSession>>), StoreError>;
}
