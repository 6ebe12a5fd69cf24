//! World layout: grid size, obstacles and terminal cells.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cell::Cell;

/// Errors found while validating a [`World`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WorldError {
    #[error("world must have at least one column and one row (got {cols}x{rows})")]
    EmptyGrid { cols: u32, rows: u32 },

    #[error("obstacle {0} lies outside the grid")]
    ObstacleOutOfBounds(Cell),

    #[error("terminal {0} lies outside the grid")]
    TerminalOutOfBounds(Cell),

    #[error("cell {0} is both an obstacle and a terminal")]
    ObstacleIsTerminal(Cell),

    #[error("terminal {0} is listed more than once")]
    DuplicateTerminal(Cell),

    #[error("terminal {cell} has a non-finite reward ({reward})")]
    NonFiniteReward { cell: Cell, reward: f64 },

    #[error("world has no open non-terminal cell to act from")]
    NoFreeCells,
}

/// An absorbing cell with a fixed payoff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Terminal {
    pub cell: Cell,
    pub reward: f64,
}

/// A rectangular grid world.
///
/// Missing fields when deserializing fall back to the classic layout, so an
/// empty `[world]` table describes the familiar 4x3 problem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct World {
    pub cols: u32,
    pub rows: u32,
    pub obstacles: Vec<Cell>,
    pub terminals: Vec<Terminal>,
}

impl Default for World {
    fn default() -> Self {
        Self::classic()
    }
}

impl World {
    /// The 4x3 world: one obstacle at (2,2), +1 at (4,3) and -1 at (4,2).
    pub fn classic() -> Self {
        Self {
            cols: 4,
            rows: 3,
            obstacles: vec![Cell::new(2, 2)],
            terminals: vec![
                Terminal {
                    cell: Cell::new(4, 3),
                    reward: 1.0,
                },
                Terminal {
                    cell: Cell::new(4, 2),
                    reward: -1.0,
                },
            ],
        }
    }

    pub fn validate(&self) -> Result<(), WorldError> {
        if self.cols == 0 || self.rows == 0 {
            return Err(WorldError::EmptyGrid {
                cols: self.cols,
                rows: self.rows,
            });
        }

        for &obstacle in &self.obstacles {
            if !self.contains(obstacle) {
                return Err(WorldError::ObstacleOutOfBounds(obstacle));
            }
        }

        let mut seen = HashSet::new();
        for terminal in &self.terminals {
            let cell = terminal.cell;
            if !self.contains(cell) {
                return Err(WorldError::TerminalOutOfBounds(cell));
            }
            if self.obstacles.contains(&cell) {
                return Err(WorldError::ObstacleIsTerminal(cell));
            }
            if !seen.insert(cell) {
                return Err(WorldError::DuplicateTerminal(cell));
            }
            if !terminal.reward.is_finite() {
                return Err(WorldError::NonFiniteReward {
                    cell,
                    reward: terminal.reward,
                });
            }
        }

        if !self
            .states()
            .iter()
            .any(|&c| self.terminal_reward(c).is_none())
        {
            return Err(WorldError::NoFreeCells);
        }

        Ok(())
    }

    pub fn contains(&self, cell: Cell) -> bool {
        (1..=self.cols).contains(&cell.x) && (1..=self.rows).contains(&cell.y)
    }

    pub fn is_obstacle(&self, cell: Cell) -> bool {
        self.obstacles.contains(&cell)
    }

    pub fn terminal_reward(&self, cell: Cell) -> Option<f64> {
        self.terminals
            .iter()
            .find(|t| t.cell == cell)
            .map(|t| t.reward)
    }

    pub fn is_terminal(&self, cell: Cell) -> bool {
        self.terminal_reward(cell).is_some()
    }

    /// In bounds and not blocked.
    pub fn is_open(&self, cell: Cell) -> bool {
        self.contains(cell) && !self.is_obstacle(cell)
    }

    /// Every open cell, top row first and left to right within a row.
    pub fn states(&self) -> Vec<Cell> {
        (1..=self.rows)
            .rev()
            .flat_map(|y| (1..=self.cols).map(move |x| Cell::new(x, y)))
            .filter(|&c| !self.is_obstacle(c))
            .collect()
    }
}
