use std::sync::Arc;

use gridmates_session::coordinator::CreateSessionRequest;
use gridmates_session::models::{
    Cell, Difficulty, DifficultyConfig, Grid, GridProvider, PlacedWord, PlayerProfile,
};
use gridmates_session::store::{MemorySessionStore, SessionStore};
use gridmates_session::{words, CoordinatorConfig, SessionCoordinator};

/// Deterministic grid provider for tests: each word occupies its own row,
/// left to right, with `X` filler everywhere else.
pub struct RowGridProvider;

impl GridProvider for RowGridProvider {
    fn generate(&self, word_list: &[String], config: &DifficultyConfig) -> Grid {
        let size = config.grid_size as usize;
        let mut rows = Vec::with_capacity(size);
        let mut placed = Vec::new();

        for row in 0..size {
            let letters: Vec<char> = word_list
                .get(row)
                .map(|w| words::normalize(w).chars().collect())
                .unwrap_or_default();
            let cells: Vec<Cell> = (0..size)
                .map(|col| Cell {
                    row: row as u32,
                    col: col as u32,
                    letter: letters.get(col).copied().unwrap_or('X'),
                })
                .collect();
            if !letters.is_empty() {
                placed.push(PlacedWord {
                    text: word_list[row].clone(),
                    cells: cells[..letters.len()].to_vec(),
                });
            }
            rows.push(cells);
        }

        Grid::from_rows(rows, placed)
    }
}

pub fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Coordinator backed by a fresh in-memory store.
pub fn coordinator() -> (SessionCoordinator, Arc<MemorySessionStore>) {
    coordinator_with_config(CoordinatorConfig::default())
}

pub fn coordinator_with_config(
    config: CoordinatorConfig,
) -> (SessionCoordinator, Arc<MemorySessionStore>) {
    init_tracing();
    let store = Arc::new(MemorySessionStore::new());
    let coord = SessionCoordinator::new(store.clone(), Arc::new(RowGridProvider), config);
    (coord, store)
}

pub fn profile(name: &str) -> PlayerProfile {
    PlayerProfile::normalized(name, None, None)
}

pub fn create_request(host_id: &str, words: &[&str], max_players: usize) -> CreateSessionRequest {
    CreateSessionRequest {
        host_id: host_id.to_string(),
        host_profile: profile("Host"),
        difficulty: Difficulty::Easy,
        theme_id: "animals".to_string(),
        level_id: None,
        words: words.iter().map(|w| w.to_string()).collect(),
        max_players,
        time_limit_secs: Some(300),
    }
}

/// Create a two-player session (host `plr_a`, guest `plr_b` named "Bea"),
/// both ready, game started. Returns the session id.
pub async fn started_two_player_session(
    coord: &SessionCoordinator,
    words: &[&str],
) -> String {
    let session_id = coord
        .create(create_request("plr_a", words, 4))
        .await
        .expect("create");
    let code = {
        let session = coord
            .store()
            .get(&session_id)
            .await
            .expect("get")
            .expect("session");
        session.room_code
    };
    coord
        .join_by_code(&code, "plr_b", profile("Bea"))
        .await
        .expect("join");
    coord
        .set_ready(&session_id, "plr_b", true)
        .await
        .expect("ready");
    coord.start(&session_id, "plr_a").await.expect("start");
    session_id
}
