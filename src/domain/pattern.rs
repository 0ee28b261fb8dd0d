//! Exhibit movement patterns.
//!
//! Every variant is a finite cyclic sequence of unit steps. The exhibit
//! owns the step counter; a pattern only answers "which way at step n"
//! and "how long is the cycle".
//!
//! | Variant    | Cycle                                      | Period       |
//! |------------|--------------------------------------------|--------------|
//! | Horizontal | d × Right, d × Left                        | 2d           |
//! | Circular   | (s−1) × Right, Down, Left, Up              | 4(s−1)       |
//! | Vertical   | (d−1) × Up, (d−1) × Down                   | 2(d−1)       |
//! | Patterned  | the listed steps                           | len(steps)   |

use serde::Deserialize;
use thiserror::Error;

use super::coord::{Direction, GridCoord};

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MovementPattern {
    Horizontal { move_distance: i32 },
    Circular { circle_size: i32 },
    Vertical { move_distance: i32 },
    Patterned { steps: Vec<Direction> },
}

#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("horizontal move distance must be at least 1, got {0}")]
    HorizontalDistance(i32),
    #[error("circle size must be at least 1, got {0}")]
    CircleSize(i32),
    #[error("vertical move distance must be greater than 1, got {0}")]
    VerticalDistance(i32),
    #[error("patterned exhibit has no steps")]
    EmptySteps,
}

impl MovementPattern {
    pub fn validate(&self) -> Result<(), PatternError> {
        match self {
            MovementPattern::Horizontal { move_distance } if *move_distance < 1 => {
                Err(PatternError::HorizontalDistance(*move_distance))
            }
            MovementPattern::Circular { circle_size } if *circle_size < 1 => {
                Err(PatternError::CircleSize(*circle_size))
            }
            MovementPattern::Vertical { move_distance } if *move_distance <= 1 => {
                Err(PatternError::VerticalDistance(*move_distance))
            }
            MovementPattern::Patterned { steps } if steps.is_empty() => Err(PatternError::EmptySteps),
            _ => Ok(()),
        }
    }

    /// The no-op pattern installed when a configuration is rejected.
    pub fn empty() -> Self {
        MovementPattern::Patterned { steps: Vec::new() }
    }

    pub fn pattern_length(&self) -> usize {
        if self.validate().is_err() {
            return 0;
        }
        match self {
            MovementPattern::Horizontal { move_distance } => 2 * *move_distance as usize,
            MovementPattern::Circular { circle_size } => 4 * (*circle_size as usize - 1),
            MovementPattern::Vertical { move_distance } => 2 * (*move_distance as usize - 1),
            MovementPattern::Patterned { steps } => steps.len(),
        }
    }

    /// Direction taken at `step`. `None` for an empty pattern.
    pub fn next_direction(&self, step: usize) -> Option<Direction> {
        let len = self.pattern_length();
        if len == 0 {
            return None;
        }
        let step = step % len;
        let dir = match self {
            MovementPattern::Horizontal { move_distance } => {
                if step < *move_distance as usize { Direction::Right } else { Direction::Left }
            }
            MovementPattern::Circular { circle_size } => {
                let side = *circle_size as usize - 1;
                match step / side {
                    0 => Direction::Right,
                    1 => Direction::Down,
                    2 => Direction::Left,
                    _ => Direction::Up,
                }
            }
            MovementPattern::Vertical { move_distance } => {
                if step < *move_distance as usize - 1 { Direction::Up } else { Direction::Down }
            }
            MovementPattern::Patterned { steps } => steps[step],
        };
        Some(dir)
    }

    pub fn next_offset(&self, step: usize) -> GridCoord {
        self.next_direction(step).map_or(GridCoord::ZERO, Direction::offset)
    }

    /// Step counter after one committed advance, kept in `[0, len)`.
    pub fn advance(&self, step: usize) -> usize {
        match self.pattern_length() {
            0 => 0,
            len => (step + 1) % len,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MovementPattern::Horizontal { .. } => "horizontal",
            MovementPattern::Circular { .. } => "circular",
            MovementPattern::Vertical { .. } => "vertical",
            MovementPattern::Patterned { .. } => "patterned",
        }
    }
}
