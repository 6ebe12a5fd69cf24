//! Grid coordinates and agent actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A grid cell in 1-based coordinates.
///
/// `x` counts columns left to right, `y` counts rows bottom to top, so
/// moving "up" increases `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[u32; 2]", into = "[u32; 2]")]
pub struct Cell {
    pub x: u32,
    pub y: u32,
}

impl Cell {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The raw neighbour in the given direction.
    ///
    /// Returns `None` only when the step would leave the positive quadrant;
    /// whether the neighbour is inside the world is the world's business.
    pub fn step(self, action: Action) -> Option<Cell> {
        let (dx, dy) = action.delta();
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        if x == 0 || y == 0 {
            return None;
        }
        Some(Cell { x, y })
    }
}

impl From<[u32; 2]> for Cell {
    fn from([x, y]: [u32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Cell> for [u32; 2] {
    fn from(cell: Cell) -> Self {
        [cell.x, cell.y]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// One of the four compass moves available in every non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
}

impl Action {
    /// All actions in canonical order. Greedy choices break ties in this order.
    pub const ALL: [Action; 4] = [Action::Up, Action::Down, Action::Left, Action::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Action::Up => (0, 1),
            Action::Down => (0, -1),
            Action::Left => (-1, 0),
            Action::Right => (1, 0),
        }
    }

    /// The two directions the agent may slip into when attempting this action.
    pub fn perpendicular(self) -> [Action; 2] {
        match self {
            Action::Up | Action::Down => [Action::Left, Action::Right],
            Action::Left | Action::Right => [Action::Up, Action::Down],
        }
    }

    pub fn arrow(self) -> char {
        match self {
            Action::Up => '↑',
            Action::Down => '↓',
            Action::Left => '←',
            Action::Right => '→',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Action::Up => "up",
            Action::Down => "down",
            Action::Left => "left",
            Action::Right => "right",
        }
    }

    /// Position of this action within [`Action::ALL`].
    pub fn index(self) -> usize {
        match self {
            Action::Up => 0,
            Action::Down => 1,
            Action::Left => 2,
            Action::Right => 3,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown action '{0}' (expected up, down, left or right)")]
pub struct ParseActionError(pub String);

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Action::Up),
            "down" => Ok(Action::Down),
            "left" => Ok(Action::Left),
            "right" => Ok(Action::Right),
            _ => Err(ParseActionError(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_match_compass() {
        assert_eq!(Action::Up.delta(), (0, 1));
        assert_eq!(Action::Down.delta(), (0, -1));
        assert_eq!(Action::Left.delta(), (-1, 0));
        assert_eq!(Action::Right.delta(), (1, 0));
    }

    #[test]
    fn perpendicular_directions() {
        assert_eq!(Action::Up.perpendicular(), [Action::Left, Action::Right]);
        assert_eq!(Action::Down.perpendicular(), [Action::Left, Action::Right]);
        assert_eq!(Action::Left.perpendicular(), [Action::Up, Action::Down]);
        assert_eq!(Action::Right.perpendicular(), [Action::Up, Action::Down]);
    }

    #[test]
    fn perpendicular_never_contains_self_or_opposite() {
        for action in Action::ALL {
            for slip in action.perpendicular() {
                let (ax, ay) = action.delta();
                let (sx, sy) = slip.delta();
                assert_eq!(ax * sx + ay * sy, 0, "{action} vs {slip}");
            }
        }
    }

    #[test]
    fn index_matches_canonical_order() {
        for (i, action) in Action::ALL.iter().enumerate() {
            assert_eq!(action.index(), i);
        }
    }

    #[test]
    fn step_moves_in_direction() {
        let c = Cell::new(2, 2);
        assert_eq!(c.step(Action::Up), Some(Cell::new(2, 3)));
        assert_eq!(c.step(Action::Down), Some(Cell::new(2, 1)));
        assert_eq!(c.step(Action::Left), Some(Cell::new(1, 2)));
        assert_eq!(c.step(Action::Right), Some(Cell::new(3, 2)));
    }

    #[test]
    fn step_off_origin_edge_is_none() {
        let c = Cell::new(1, 1);
        assert_eq!(c.step(Action::Left), None);
        assert_eq!(c.step(Action::Down), None);
    }

    #[test]
    fn parse_action_case_insensitive() {
        assert_eq!("UP".parse::<Action>().unwrap(), Action::Up);
        assert_eq!(" right ".parse::<Action>().unwrap(), Action::Right);
        assert!("north".parse::<Action>().is_err());
    }

    #[test]
    fn cell_serializes_as_pair() {
        let json = serde_json::to_string(&Cell::new(4, 3)).unwrap();
        assert_eq!(json, "[4,3]");
        let back: Cell = serde_json::from_str("[2,1]").unwrap();
        assert_eq!(back, Cell::new(2, 1));
    }

    #[test]
    fn action_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Action::Left).unwrap(), "\"left\"");
    }

    #[test]
    fn cell_display() {
        assert_eq!(Cell::new(3, 1).to_string(), "(3,1)");
    }
}
