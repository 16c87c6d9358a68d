//! The immutable word-search grid and the external provider that builds it.

use serde::{Deserialize, Serialize};

/// One letter tile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cell {
    pub row: u32,
    pub col: u32,
    pub letter: char,
}

/// A target word and the cells it occupies (placement metadata from the
/// grid provider).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedWord {
    pub text: String,
    pub cells: Vec<Cell>,
}

/// The grid in its document (store) shape: a row-major flat cell list plus
/// the side length. Some document stores cannot persist nested arrays, so
/// this flat shape is the persistence contract; [`Grid::rows`] rebuilds the
/// logical 2D shape on the client side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grid {
    pub cells: Vec<Cell>,
    pub size: u32,
    pub words: Vec<PlacedWord>,
}

impl Grid {
    /// Flatten a logical row-major 2D grid into the store shape.
    pub fn from_rows(rows: Vec<Vec<Cell>>, words: Vec<PlacedWord>) -> Self {
        let size = rows.len() as u32;
        let cells = rows.into_iter().flatten().collect();
        Self { cells, size, words }
    }

    /// Reconstruct the logical 2D shape from the flat cell list.
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        let size = self.size as usize;
        let mut rows = Vec::with_capacity(size);
        for chunk in self.cells.chunks(size.max(1)) {
            rows.push(chunk.to_vec());
        }
        rows
    }
}

/// Named difficulty presets exposed to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Grid-generation parameters for this preset.
    pub fn config(self) -> DifficultyConfig {
        match self {
            Self::Easy => DifficultyConfig {
                grid_size: 8,
                allow_diagonals: false,
                allow_reverse: false,
            },
            Self::Medium => DifficultyConfig {
                grid_size: 10,
                allow_diagonals: true,
                allow_reverse: false,
            },
            Self::Hard => DifficultyConfig {
                grid_size: 12,
                allow_diagonals: true,
                allow_reverse: true,
            },
        }
    }
}

/// Parameters handed to the grid provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyConfig {
    pub grid_size: u32,
    pub allow_diagonals: bool,
    pub allow_reverse: bool,
}

/// External grid generation seam. The coordinator consumes this exactly
/// once per session; it never implements grid layout itself.
pub trait GridProvider: Send + Sync {
    fn generate(&self, words: &[String], config: &DifficultyConfig) -> Grid;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cell(row: u32, col: u32, letter: char) -> Cell {
        Cell { row, col, letter }
    }

    #[test]
    fn rows_reconstructs_row_major_order() {
        let rows = vec![
            vec![cell(0, 0, 'A'), cell(0, 1, 'B')],
            vec![cell(1, 0, 'C'), cell(1, 1, 'D')],
        ];
        let grid = Grid::from_rows(rows.clone(), vec![]);

        assert_eq!(grid.size, 2);
        assert_eq!(grid.cells.len(), 4);
        assert_eq!(grid.rows(), rows);
    }

    #[test]
    fn difficulty_presets_scale_up() {
        assert!(Difficulty::Easy.config().grid_size < Difficulty::Hard.config().grid_size);
        assert!(Difficulty::Hard.config().allow_reverse);
        assert!(!Difficulty::Easy.config().allow_diagonals);
    }
}
