//! Push rules: truth-table driven.
//!
//! Pure functions over a read-only board view. They decide whether a
//! player move is legal and what it pushes, without performing it.
//!
//! ## Player Move Truth Table
//!
//! ┌──────────────────────────────────────────┬────────┬───────────────────┐
//! │ Condition (checked in order)             │ Allow? │ Notes             │
//! ├──────────────────────────────────────────┼────────┼───────────────────┤
//! │ Target off-grid or obstacle              │ DENY   │ PlayerBlocked     │
//! │ Target empty                             │ ALLOW  │ plain step        │
//! │ Pushed entity's dest off-grid / obstacle │ DENY   │ PushBlocked       │
//! │ Candle holder pushed into any entity     │ DENY   │ PushOccupied      │
//! │ Exhibit pushed into candle holder        │ DENY   │ PushOccupied      │
//! │ Exhibit pushed into exhibit              │ ALLOW  │ ends in collision │
//! │ Otherwise                                │ ALLOW  │ push              │
//! └──────────────────────────────────────────┴────────┴───────────────────┘
//!
//! A denied move is a full no-op: nothing moves and no turn is consumed.

use thiserror::Error;

use super::coord::{Direction, GridCoord};
use super::entity::{Exhibit, Player};
use super::grid::Grid;
use super::light::{self, CandleHolder};

/// Immutable view of everything on the board.
pub struct BoardView<'a> {
    pub grid: &'a Grid,
    pub player: &'a Player,
    pub exhibits: &'a [Exhibit],
    pub candles: &'a [CandleHolder],
}

impl<'a> BoardView<'a> {
    pub fn exhibit_at(&self, coord: GridCoord) -> Option<usize> {
        self.exhibits.iter().position(|e| e.position == coord)
    }

    pub fn candle_at(&self, coord: GridCoord) -> Option<usize> {
        self.candles.iter().position(|c| c.position == coord)
    }

    pub fn is_pushable_at(&self, coord: GridCoord) -> bool {
        self.exhibit_at(coord).is_some() || self.candle_at(coord).is_some()
    }

    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        self.player.position == coord || self.is_pushable_at(coord)
    }

    pub fn is_frozen(&self, coord: GridCoord) -> bool {
        light::is_frozen(self.candles, coord)
    }
}

/// What the player's step shoves along with it.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Push {
    Nothing,
    Exhibit { index: usize, to: GridCoord },
    Candle { index: usize, to: GridCoord },
}

/// A validated player move.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct MovePlan {
    pub direction: Direction,
    pub player_target: GridCoord,
    pub push: Push,
}

impl MovePlan {
    pub fn pushed_exhibit(&self) -> Option<(usize, GridCoord)> {
        match self.push {
            Push::Exhibit { index, to } => Some((index, to)),
            _ => None,
        }
    }

    pub fn pushed_candle(&self) -> Option<(usize, GridCoord)> {
        match self.push {
            Push::Candle { index, to } => Some((index, to)),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum TurnRejected {
    #[error("game has already ended")]
    GameEnded,
    #[error("a turn is already being resolved")]
    TurnInProgress,
    #[error("player cannot step onto {target}")]
    PlayerBlocked { target: GridCoord },
    #[error("cannot push onto {destination}: wall or obstacle")]
    PushBlocked { destination: GridCoord },
    #[error("cannot push onto {destination}: tile is occupied")]
    PushOccupied { destination: GridCoord },
}

pub fn plan_move(board: &BoardView, direction: Direction) -> Result<MovePlan, TurnRejected> {
    let player_target = board.player.position + direction;
    if !board.grid.is_walkable(player_target) {
        return Err(TurnRejected::PlayerBlocked { target: player_target });
    }

    let destination = player_target + direction;
    let push = if let Some(index) = board.exhibit_at(player_target) {
        if !board.grid.is_walkable(destination) {
            return Err(TurnRejected::PushBlocked { destination });
        }
        if board.candle_at(destination).is_some() {
            return Err(TurnRejected::PushOccupied { destination });
        }
        Push::Exhibit { index, to: destination }
    } else if let Some(index) = board.candle_at(player_target) {
        if !board.grid.is_walkable(destination) {
            return Err(TurnRejected::PushBlocked { destination });
        }
        if board.is_occupied(destination) {
            return Err(TurnRejected::PushOccupied { destination });
        }
        Push::Candle { index, to: destination }
    } else {
        Push::Nothing
    };

    Ok(MovePlan { direction, player_target, push })
}

/// The direction an exhibit would show as its next move, ignoring the
/// player (who may step aside before the turn resolves).
pub fn exhibit_preview(board: &BoardView, index: usize) -> Option<Direction> {
    let exhibit = board.exhibits.get(index)?;
    let dir = exhibit.next_direction()?;
    let next = exhibit.position + dir;
    let free = board.grid.is_walkable(next)
        && board.exhibit_at(next).is_none()
        && board.candle_at(next).is_none();
    (free && !board.is_frozen(exhibit.position)).then_some(dir)
}
