use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::grid::{Cell, Difficulty, Grid};
use super::player::Player;

/// Session lifecycle. Transitions only ever move forward:
/// `waiting -> playing -> completed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Playing,
    Completed,
}

/// The cells a player is currently dragging over. Ephemeral: superseded by
/// the next broadcast and cleared when a submission resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub cells: Vec<Cell>,
    pub timestamp: DateTime<Utc>,
}

/// The shared session document — the root aggregate every participant
/// mutates through the store and observes through its subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CooperativeSession {
    pub id: String,
    /// 6-character shareable code; unique among `waiting` sessions.
    pub room_code: String,
    /// The player currently authorized to start the game; reassigned on
    /// host departure.
    pub host_id: String,
    pub max_players: usize,
    pub status: SessionStatus,
    /// Join order; defines deterministic color/slot assignment.
    pub players: Vec<Player>,
    /// Write-once at creation.
    pub grid: Grid,
    /// Canonical target words, derived from `grid` at creation. Write-once.
    pub words: Vec<String>,
    /// Append-only, duplicate-free subset of `words`.
    pub words_found: Vec<String>,
    /// Ephemeral per-player selections, keyed by player id.
    pub active_selections: HashMap<String, Selection>,
    pub difficulty: Difficulty,
    pub theme_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level_id: Option<String>,
    pub time_limit: u32,
    /// Advisory client-side countdown; not authoritative.
    pub time_remaining: u32,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl CooperativeSession {
    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn word_claimed(&self, canonical: &str) -> bool {
        self.words_found.iter().any(|w| w == canonical)
    }

    pub fn all_words_found(&self) -> bool {
        self.words_found.len() == self.words.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayerProfile;

    fn session_with_players(ids: &[&str]) -> CooperativeSession {
        let now = Utc::now();
        CooperativeSession {
            id: "ses_test".to_string(),
            room_code: "ABCDEF".to_string(),
            host_id: ids.first().unwrap_or(&"").to_string(),
            max_players: 4,
            status: SessionStatus::Waiting,
            players: ids
                .iter()
                .map(|id| {
                    Player::new(*id, PlayerProfile::normalized(*id, None, None), false)
                })
                .collect(),
            grid: Grid {
                cells: vec![],
                size: 0,
                words: vec![],
            },
            words: vec!["CHAT".to_string(), "CHIEN".to_string()],
            words_found: vec![],
            active_selections: HashMap::new(),
            difficulty: Difficulty::Easy,
            theme_id: "animals".to_string(),
            level_id: None,
            time_limit: 300,
            time_remaining: 300,
            created_at: now,
            started_at: None,
            completed_at: None,
            updated_at: now,
        }
    }

    #[test]
    fn player_lookup_and_capacity() {
        let session = session_with_players(&["plr_a", "plr_b"]);
        assert!(session.player("plr_a").is_some());
        assert!(session.player("plr_z").is_none());
        assert!(!session.is_full());
    }

    #[test]
    fn completion_tracks_word_count() {
        let mut session = session_with_players(&["plr_a"]);
        assert!(!session.all_words_found());
        session.words_found = session.words.clone();
        assert!(session.all_words_found());
        assert!(session.word_claimed("CHAT"));
    }

    #[test]
    fn document_shape_is_camel_case() {
        let session = session_with_players(&["plr_a"]);
        let doc = serde_json::to_value(&session).unwrap();
        assert!(doc.get("roomCode").is_some());
        assert!(doc.get("hostId").is_some());
        assert!(doc.get("maxPlayers").is_some());
        assert!(doc.get("wordsFound").is_some());
        assert!(doc.get("activeSelections").is_some());
        assert!(doc.get("timeRemaining").is_some());
        // Unset timestamps are omitted, set ones present.
        assert!(doc.get("startedAt").is_none());
        assert!(doc.get("createdAt").is_some());
        // Absent avatar serializes as an explicit null, never undefined.
        assert!(doc["players"][0]["profile"]["photoURL"].is_null());
    }
}
