use crate::store::Guard;

/// Errors surfaced by the session store.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("session document not found")]
    NotFound,
    #[error("update precondition failed: {0:?}")]
    PreconditionFailed(Guard),
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Caller-visible coordinator errors.
///
/// All of these are validation failures the caller must react to; none are
/// retried automatically. Losing a `submit_word` race is *not* an error —
/// that call returns `Ok(false)`.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no waiting session matches that room code")]
    SessionNotFound,
    #[error("the session is already full")]
    SessionFull,
    #[error("a player with the same name or avatar is already in the session")]
    DuplicateIdentity,
    #[error("only the host can start the game")]
    NotHost,
    #[error("at least two players are required to start")]
    InsufficientPlayers,
    #[error("every player must be ready before the game can start")]
    PlayersNotReady,
    #[error("could not allocate an unused room code")]
    RoomCodeExhausted,
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::SessionFull => "SESSION_FULL",
            Self::DuplicateIdentity => "DUPLICATE_IDENTITY",
            Self::NotHost => "NOT_HOST",
            Self::InsufficientPlayers => "INSUFFICIENT_PLAYERS",
            Self::PlayersNotReady => "PLAYERS_NOT_READY",
            Self::RoomCodeExhausted => "ROOM_CODE_EXHAUSTED",
            Self::Store(_) => "STORE_ERROR",
        }
    }
}
