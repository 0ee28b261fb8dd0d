//! Events emitted while resolving a turn.
//! The presentation layer consumes these for animation and status text.

use crate::domain::coord::GridCoord;

use super::evaluate::Collision;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GameEvent {
    PlayerMoved { from: GridCoord, to: GridCoord },
    ExhibitPushed { id: usize, from: GridCoord, to: GridCoord },
    ExhibitMoved { id: usize, from: GridCoord, to: GridCoord },
    ExhibitFrozen { id: usize, at: GridCoord },
    ExhibitYielded { id: usize, at: GridCoord },
    ExhibitBumped { id: usize, at: GridCoord, toward: GridCoord },
    CandlePushed { id: usize, from: GridCoord, to: GridCoord },
    FlameOut { id: usize, at: GridCoord },
    Collided { kind: Collision, at: GridCoord },
    LevelWon,
    TimeExpired,
}
