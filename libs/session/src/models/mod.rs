pub mod grid;
pub mod player;
pub mod session;

pub use grid::{Cell, Difficulty, DifficultyConfig, Grid, GridProvider, PlacedWord};
pub use player::{CursorPosition, Player, PlayerProfile};
pub use session::{CooperativeSession, Selection, SessionStatus};
