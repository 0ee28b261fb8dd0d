//! Grid coordinates and cardinal directions.
//!
//! y grows upward: `Up` is `(0, +1)`. The renderer flips rows so that
//! row 0 is drawn at the bottom of the board.

use std::fmt;
use std::ops::{Add, Sub};

use serde::Deserialize;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Deserialize)]
#[serde(from = "[i32; 2]")]
pub struct GridCoord {
    pub x: i32,
    pub y: i32,
}

impl GridCoord {
    pub const ZERO: GridCoord = GridCoord { x: 0, y: 0 };

    pub const fn new(x: i32, y: i32) -> Self {
        GridCoord { x, y }
    }

    /// max(|dx|, |dy|): the metric of a candle holder's light square.
    pub fn chebyshev(self, other: GridCoord) -> i32 {
        (self.x - other.x).abs().max((self.y - other.y).abs())
    }

    pub fn manhattan(self, other: GridCoord) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }
}

impl From<[i32; 2]> for GridCoord {
    fn from([x, y]: [i32; 2]) -> Self {
        GridCoord { x, y }
    }
}

impl Add for GridCoord {
    type Output = GridCoord;

    fn add(self, rhs: GridCoord) -> GridCoord {
        GridCoord::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for GridCoord {
    type Output = GridCoord;

    fn sub(self, rhs: GridCoord) -> GridCoord {
        GridCoord::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Add<Direction> for GridCoord {
    type Output = GridCoord;

    fn add(self, dir: Direction) -> GridCoord {
        self + dir.offset()
    }
}

impl fmt::Display for GridCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Down, Direction::Left, Direction::Right];

    pub const fn offset(self) -> GridCoord {
        match self {
            Direction::Up => GridCoord::new(0, 1),
            Direction::Down => GridCoord::new(0, -1),
            Direction::Left => GridCoord::new(-1, 0),
            Direction::Right => GridCoord::new(1, 0),
        }
    }

    pub fn reverse(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    /// Inverse of `offset` for unit vectors.
    pub fn from_offset(offset: GridCoord) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| d.offset() == offset)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::Up => "Up",
            Direction::Down => "Down",
            Direction::Left => "Left",
            Direction::Right => "Right",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_unit_and_reversible() {
        for d in Direction::ALL {
            let o = d.offset();
            assert_eq!(o.manhattan(GridCoord::ZERO), 1);
            assert_eq!(o + d.reverse().offset(), GridCoord::ZERO);
            assert_eq!(Direction::from_offset(o), Some(d));
        }
    }

    #[test]
    fn up_grows_y() {
        assert_eq!(GridCoord::new(2, 2) + Direction::Up, GridCoord::new(2, 3));
        assert_eq!(GridCoord::new(2, 2) + Direction::Down, GridCoord::new(2, 1));
    }

    #[test]
    fn chebyshev_vs_manhattan() {
        let a = GridCoord::new(0, 0);
        let b = GridCoord::new(2, -3);
        assert_eq!(a.chebyshev(b), 3);
        assert_eq!(a.manhattan(b), 5);
    }

    #[test]
    fn non_unit_offset_has_no_direction() {
        assert_eq!(Direction::from_offset(GridCoord::new(1, 1)), None);
        assert_eq!(Direction::from_offset(GridCoord::ZERO), None);
    }
}
