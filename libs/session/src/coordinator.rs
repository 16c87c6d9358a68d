//! Stateless session lifecycle, arbitration, and broadcast operations.
//!
//! Every participating client runs these same operations against the same
//! shared document; the store's atomic patch application is the only
//! serialization point. No operation retries automatically — validation
//! failures are returned to the caller, and a lost `submit_word` race is a
//! normal `false` result, not an error.

use std::sync::Arc;

use chrono::Utc;
use rand::thread_rng;

use crate::config::CoordinatorConfig;
use crate::error::{SessionError, StoreError};
use crate::models::{
    Cell, CooperativeSession, CursorPosition, Difficulty, GridProvider, Player, PlayerProfile,
    Selection, SessionStatus,
};
use crate::room_code;
use crate::store::{Guard, SessionOp, SessionPatch, SessionStore};
use crate::words;

/// Minimum and maximum party size.
pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 8;

/// Everything needed to open a new session.
#[derive(Debug, Clone)]
pub struct CreateSessionRequest {
    pub host_id: String,
    pub host_profile: PlayerProfile,
    pub difficulty: Difficulty,
    pub theme_id: String,
    pub level_id: Option<String>,
    /// Theme word list handed to the grid provider.
    pub words: Vec<String>,
    pub max_players: usize,
    /// Defaults to the configured time limit when `None`.
    pub time_limit_secs: Option<u32>,
}

/// Service entry point for all cooperative-session operations.
pub struct SessionCoordinator {
    store: Arc<dyn SessionStore>,
    grids: Arc<dyn GridProvider>,
    config: CoordinatorConfig,
}

impl SessionCoordinator {
    pub fn new(
        store: Arc<dyn SessionStore>,
        grids: Arc<dyn GridProvider>,
        config: CoordinatorConfig,
    ) -> Self {
        Self {
            store,
            grids,
            config,
        }
    }

    pub fn store(&self) -> Arc<dyn SessionStore> {
        self.store.clone()
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Create a session: allocate a room code by rejection sampling,
    /// generate the grid exactly once, and persist the document with the
    /// host as its first (already ready) player. Returns the session id.
    pub async fn create(&self, req: CreateSessionRequest) -> Result<String, SessionError> {
        let code = self.allocate_room_code().await?;

        let difficulty_config = req.difficulty.config();
        let grid = self.grids.generate(&req.words, &difficulty_config);

        // Targets are the words the provider actually placed, in canonical
        // (case-folded, diacritic-free) form.
        let targets: Vec<String> = grid.words.iter().map(|w| words::normalize(&w.text)).collect();

        let host_profile = PlayerProfile::normalized(
            req.host_profile.name,
            req.host_profile.photo_url,
            req.host_profile.avatar_emoji,
        );
        let host = Player::new(req.host_id.clone(), host_profile, true);

        let time_limit = req
            .time_limit_secs
            .unwrap_or(self.config.default_time_limit_secs);
        let now = Utc::now();

        let session = CooperativeSession {
            id: gridmates_common::id::prefixed_ulid(gridmates_common::id::prefix::SESSION),
            room_code: code.clone(),
            host_id: req.host_id,
            max_players: req.max_players.clamp(MIN_PLAYERS, MAX_PLAYERS),
            status: SessionStatus::Waiting,
            players: vec![host],
            grid,
            words: targets,
            words_found: Vec::new(),
            active_selections: Default::default(),
            difficulty: req.difficulty,
            theme_id: req.theme_id,
            level_id: req.level_id,
            time_limit,
            time_remaining: time_limit,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        };

        let id = session.id.clone();
        self.store.insert(session).await?;

        tracing::info!(session_id = %id, room_code = %code, "cooperative session created");
        Ok(id)
    }

    /// Join the waiting session with this room code.
    ///
    /// Idempotent per player id (a rejoin after refresh returns the same
    /// session without mutation). Rejects a second slot for what looks
    /// like the same human: an existing player with the same display name
    /// or avatar URL under a different id.
    pub async fn join_by_code(
        &self,
        code: &str,
        player_id: &str,
        profile: PlayerProfile,
    ) -> Result<String, SessionError> {
        let session = self
            .store
            .find_waiting_by_code(code)
            .await?
            .ok_or(SessionError::SessionNotFound)?;

        if session.player(player_id).is_some() {
            tracing::debug!(session_id = %session.id, player_id, "rejoin of existing player");
            return Ok(session.id);
        }
        if session.is_full() {
            return Err(SessionError::SessionFull);
        }

        let profile = PlayerProfile::normalized(profile.name, profile.photo_url, profile.avatar_emoji);
        // Fold names the same way submitted words are folded, so accented
        // variants of one display name count as the same identity.
        let folded_name = words::normalize(&profile.name);
        let duplicate = session.players.iter().any(|p| {
            words::normalize(&p.profile.name) == folded_name
                || (p.profile.photo_url.is_some() && p.profile.photo_url == profile.photo_url)
        });
        if duplicate {
            return Err(SessionError::DuplicateIdentity);
        }

        let player = Player::new(player_id, profile, false);
        let patch = SessionPatch::guarded(
            vec![Guard::BelowCapacity],
            vec![SessionOp::PushPlayer(player)],
        );
        match self.store.apply(&session.id, patch).await {
            Ok(_) => {
                tracing::info!(session_id = %session.id, player_id, "player joined");
                Ok(session.id)
            }
            // A concurrent join took the last slot between our read and
            // the guarded write.
            Err(StoreError::PreconditionFailed(Guard::BelowCapacity)) => {
                Err(SessionError::SessionFull)
            }
            Err(StoreError::NotFound) => Err(SessionError::SessionNotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Flip one player's ready flag (read-modify-write of the players
    /// array).
    pub async fn set_ready(
        &self,
        session_id: &str,
        player_id: &str,
        is_ready: bool,
    ) -> Result<(), SessionError> {
        let session = self.fetch(session_id).await?;
        let players: Vec<Player> = session
            .players
            .into_iter()
            .map(|mut p| {
                if p.id == player_id {
                    p.is_ready = is_ready;
                }
                p
            })
            .collect();

        self.apply(session_id, SessionPatch::new(vec![SessionOp::SetPlayers(players)]))
            .await?;
        Ok(())
    }

    /// Start the game. Host-only; requires at least two players, all
    /// ready. None of these failures are retried automatically.
    ///
    /// Status only ever moves forward: a session that is already playing
    /// or completed cannot be restarted, and the accepting write is
    /// guarded on the session still waiting so a racing second `start`
    /// cannot rewrite `startedAt`.
    pub async fn start(&self, session_id: &str, caller_id: &str) -> Result<(), SessionError> {
        let session = self.fetch(session_id).await?;

        if session.status != SessionStatus::Waiting {
            tracing::debug!(session_id, status = ?session.status, "start on a non-waiting session ignored");
            return Ok(());
        }
        if session.host_id != caller_id {
            return Err(SessionError::NotHost);
        }
        if session.players.len() < MIN_PLAYERS {
            return Err(SessionError::InsufficientPlayers);
        }
        if session.players.iter().any(|p| !p.is_ready) {
            return Err(SessionError::PlayersNotReady);
        }

        let patch = SessionPatch::guarded(
            vec![Guard::StatusIs(SessionStatus::Waiting)],
            vec![
                SessionOp::SetStatus(SessionStatus::Playing),
                SessionOp::SetStartedAt(Utc::now()),
                SessionOp::SetTimeRemaining(session.time_limit),
            ],
        );
        match self.store.apply(session_id, patch).await {
            Ok(_) => {
                tracing::info!(session_id, players = session.players.len(), "game started");
                Ok(())
            }
            // A concurrent start won the race; the game is running.
            Err(StoreError::PreconditionFailed(Guard::StatusIs(_))) => Ok(()),
            Err(StoreError::NotFound) => Err(SessionError::SessionNotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Broadcast a pointer position. Fire-and-forget: sub-path write only,
    /// no ordering guarantee relative to other players' updates.
    pub async fn update_cursor_position(
        &self,
        session_id: &str,
        player_id: &str,
        position: Option<CursorPosition>,
    ) -> Result<(), SessionError> {
        self.apply(
            session_id,
            SessionPatch::new(vec![SessionOp::SetCursor {
                player_id: player_id.to_string(),
                position,
            }]),
        )
        .await?;
        Ok(())
    }

    /// Broadcast the cells a player is dragging over. An empty selection
    /// clears the player's entry.
    pub async fn update_player_selection(
        &self,
        session_id: &str,
        player_id: &str,
        cells: Vec<Cell>,
    ) -> Result<(), SessionError> {
        let op = if cells.is_empty() {
            SessionOp::ClearSelection(player_id.to_string())
        } else {
            SessionOp::SetSelection {
                player_id: player_id.to_string(),
                selection: Selection {
                    cells,
                    timestamp: Utc::now(),
                },
            }
        };
        self.apply(session_id, SessionPatch::new(vec![op])).await?;
        Ok(())
    }

    /// Claim a word. Returns `Ok(false)` for an unknown word, a word that
    /// is already claimed, or a lost arbitration race — all silent,
    /// stateless negatives.
    ///
    /// The accepting write is a single guarded patch keyed on the word
    /// being unclaimed, so two racing submissions can never both grow
    /// `words_found` or double-credit a player.
    pub async fn submit_word(
        &self,
        session_id: &str,
        player_id: &str,
        word: &str,
        cells: &[Cell],
    ) -> Result<bool, SessionError> {
        // Freshest available read immediately before the guarded write.
        let session = self.fetch(session_id).await?;

        let submitted = words::normalize(word);
        if submitted.is_empty() {
            return Ok(false);
        }
        // The selected cells must actually spell the submitted word.
        if !cells.is_empty() {
            let spelled: String = cells.iter().map(|c| c.letter).collect();
            if words::normalize(&spelled) != submitted {
                return Ok(false);
            }
        }

        let Some(canonical) = session
            .words
            .iter()
            .find(|w| words::normalize(w) == submitted)
            .cloned()
        else {
            return Ok(false);
        };
        if session.word_claimed(&canonical) {
            return Ok(false);
        }

        let score = words::score_for(&canonical);
        let patch = SessionPatch::guarded(
            vec![Guard::WordUnclaimed(canonical.clone())],
            vec![
                SessionOp::AppendSessionWord(canonical.clone()),
                SessionOp::CreditPlayer {
                    player_id: player_id.to_string(),
                    word: canonical.clone(),
                    score,
                },
                SessionOp::ClearSelection(player_id.to_string()),
                SessionOp::CompleteIfAllFound(Utc::now()),
            ],
        );

        match self.store.apply(session_id, patch).await {
            Ok(updated) => {
                tracing::info!(
                    session_id,
                    player_id,
                    word = %canonical,
                    score,
                    completed = updated.status == SessionStatus::Completed,
                    "word claimed"
                );
                Ok(true)
            }
            // Another player claimed the word between our read and write.
            Err(StoreError::PreconditionFailed(Guard::WordUnclaimed(_))) => Ok(false),
            Err(StoreError::NotFound) => Err(SessionError::SessionNotFound),
            Err(other) => Err(other.into()),
        }
    }

    /// Remove a player. Deletes the document when the last player leaves;
    /// host departure hands the host role to the first remaining player in
    /// join order (applied atomically with the removal).
    pub async fn leave(&self, session_id: &str, player_id: &str) -> Result<(), SessionError> {
        let session = match self.store.get(session_id).await? {
            Some(s) => s,
            // Already gone — nothing to undo.
            None => return Ok(()),
        };
        if session.player(player_id).is_none() {
            return Ok(());
        }

        let was_host = session.host_id == player_id;
        let patch = SessionPatch::new(vec![
            SessionOp::RemovePlayer(player_id.to_string()),
            SessionOp::ClearSelection(player_id.to_string()),
        ]);
        match self.store.apply(session_id, patch).await {
            Ok(updated) if updated.players.is_empty() => {
                // Guarded cleanup: a join landing after the removal keeps
                // the session alive and wins over the delete.
                match self.store.delete_if(session_id, vec![Guard::NoPlayers]).await {
                    Ok(()) => {
                        tracing::info!(session_id, "last player left; session deleted");
                        Ok(())
                    }
                    Err(StoreError::NotFound | StoreError::PreconditionFailed(_)) => Ok(()),
                    Err(other) => Err(other.into()),
                }
            }
            Ok(updated) => {
                if was_host {
                    tracing::info!(session_id, new_host = %updated.host_id, "host migrated");
                }
                Ok(())
            }
            Err(StoreError::NotFound) => Ok(()),
            Err(other) => Err(other.into()),
        }
    }

    async fn allocate_room_code(&self) -> Result<String, SessionError> {
        for _ in 0..self.config.max_room_code_attempts {
            let code = {
                let mut rng = thread_rng();
                room_code::generate(&mut rng)
            };
            if self.store.find_waiting_by_code(&code).await?.is_none() {
                return Ok(code);
            }
        }
        Err(SessionError::RoomCodeExhausted)
    }

    async fn fetch(&self, session_id: &str) -> Result<CooperativeSession, SessionError> {
        self.store
            .get(session_id)
            .await?
            .ok_or(SessionError::SessionNotFound)
    }

    async fn apply(
        &self,
        session_id: &str,
        patch: SessionPatch,
    ) -> Result<CooperativeSession, SessionError> {
        self.store.apply(session_id, patch).await.map_err(|err| match err {
            StoreError::NotFound => SessionError::SessionNotFound,
            other => SessionError::Store(other),
        })
    }
}
