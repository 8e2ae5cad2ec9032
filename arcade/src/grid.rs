use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ArcadeError;

/// Board coordinate. `y` grows downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    pub fn in_bounds(self, size: i32) -> bool {
        (0..size).contains(&self.x) && (0..size).contains(&self.y)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Direction::Up | Direction::Down)
    }

    /// A turn is only legal onto the other axis.
    pub fn is_perpendicular(self, other: Direction) -> bool {
        self.is_vertical() != other.is_vertical()
    }
}

impl FromStr for Direction {
    type Err = ArcadeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" | "u" | "w" => Ok(Direction::Up),
            "down" | "s" => Ok(Direction::Down),
            "left" | "l" | "a" => Ok(Direction::Left),
            "right" | "r" | "d" => Ok(Direction::Right),
            other => Err(ArcadeError::UnknownMove(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn perpendicular_means_other_axis() {
        assert!(Direction::Up.is_perpendicular(Direction::Left));
        assert!(Direction::Right.is_perpendicular(Direction::Down));
        assert!(!Direction::Up.is_perpendicular(Direction::Down));
        assert!(!Direction::Left.is_perpendicular(Direction::Left));
    }

    #[test]
    fn cell_bounds() {
        assert!(Cell::new(0, 19).in_bounds(20));
        assert!(!Cell::new(20, 0).in_bounds(20));
        assert!(!Cell::new(0, 0).step(Direction::Up).in_bounds(20));
    }

    #[test]
    fn parses_move_names() {
        assert_eq!("Left".parse::<Direction>().unwrap(), Direction::Left);
        let wasd: Vec<Direction> = ["w", "a", "s", "d"]
            .iter()
            .map(|key| key.parse().unwrap())
            .collect();
        assert_eq!(
            wasd,
            [Direction::Up, Direction::Left, Direction::Down, Direction::Right]
        );
        assert!("sideways".parse::<Direction>().is_err());
    }
}
