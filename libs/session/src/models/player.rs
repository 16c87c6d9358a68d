use serde::{Deserialize, Serialize};

/// Display identity for a participant. The avatar is either a photo URL or
/// an emoji marker; absent values are explicit `None` (serialized `null`)
/// because the document store rejects undefined fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub name: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub avatar_emoji: Option<String>,
}

impl PlayerProfile {
    /// Normalize a profile for storage: trimmed name, empty avatar
    /// references collapsed to `None`.
    pub fn normalized(name: impl Into<String>, photo_url: Option<String>, avatar_emoji: Option<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            photo_url: photo_url.filter(|u| !u.trim().is_empty()),
            avatar_emoji: avatar_emoji.filter(|e| !e.trim().is_empty()),
        }
    }
}

/// Last broadcast pointer location, in grid coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPosition {
    pub row: u32,
    pub col: u32,
}

/// One participant embedded in the session document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    /// Stable identity of the participant, not the connection id.
    pub id: String,
    pub profile: PlayerProfile,
    /// Gates game start.
    pub is_ready: bool,
    pub cursor_position: Option<CursorPosition>,
    /// Words this player personally claimed (subset of the session's
    /// `words_found`).
    pub words_found: Vec<String>,
    /// Monotonically non-decreasing.
    pub score: u32,
}

impl Player {
    pub fn new(id: impl Into<String>, profile: PlayerProfile, is_ready: bool) -> Self {
        Self {
            id: id.into(),
            profile,
            is_ready,
            cursor_position: None,
            words_found: Vec::new(),
            score: 0,
        }
    }
}
