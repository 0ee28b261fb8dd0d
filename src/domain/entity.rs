//! Entities: Player, Exhibit, Obstacle. Candle holders live in `light`.
//!
//! Positions are only written by the turn engine (`sim::step`) or by the
//! constructors below. Nothing here moves itself.

use tracing::warn;

use super::coord::{Direction, GridCoord};
use super::grid::Grid;
use super::pattern::MovementPattern;

/// What the player sprite shows: facing and whether it is mid-push.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PlayerPose {
    pub facing: Direction,
    pub pushing: bool,
}

impl Default for PlayerPose {
    fn default() -> Self {
        PlayerPose { facing: Direction::Down, pushing: false }
    }
}

#[derive(Clone, Debug)]
pub struct Player {
    pub position: GridCoord,
    /// Last accepted move direction. Cosmetic.
    pub facing: Direction,
    /// Pose cached by the turn that produced it.
    pub pending_pose: PlayerPose,
    /// Pose on display: always one resolved turn behind `pending_pose`.
    pub applied_pose: PlayerPose,
}

impl Player {
    pub fn new(position: GridCoord) -> Self {
        Player {
            position,
            facing: Direction::Down,
            pending_pose: PlayerPose::default(),
            applied_pose: PlayerPose::default(),
        }
    }

    pub fn cache_pose(&mut self, pose: PlayerPose) {
        self.pending_pose = pose;
    }

    pub fn apply_cached_pose(&mut self) {
        self.applied_pose = self.pending_pose;
    }
}

#[derive(Clone, Debug)]
pub struct Exhibit {
    pub id: usize,
    pub position: GridCoord,
    pub pattern: MovementPattern,
    /// Always in `[0, pattern_length)`, or 0 for an empty pattern.
    pub step: usize,
    pub start: GridCoord,
    pub target: Option<GridCoord>,
}

impl Exhibit {
    /// Rejected pattern parameters are logged and replaced by the
    /// empty pattern; the exhibit then only moves when pushed.
    pub fn new(id: usize, position: GridCoord, pattern: MovementPattern, target: Option<GridCoord>) -> Self {
        let pattern = match pattern.validate() {
            Ok(()) => pattern,
            Err(e) => {
                warn!(id, %position, pattern = pattern.label(), error = %e, "invalid movement pattern, exhibit will stay put");
                MovementPattern::empty()
            }
        };
        Exhibit { id, position, pattern, step: 0, start: position, target }
    }

    pub fn next_direction(&self) -> Option<Direction> {
        self.pattern.next_direction(self.step)
    }

    /// Where the pattern would take this exhibit this turn.
    pub fn next_position(&self) -> GridCoord {
        self.position + self.pattern.next_offset(self.step)
    }

    pub fn advance_pattern(&mut self) {
        self.step = self.pattern.advance(self.step);
    }

    pub fn at_target(&self) -> bool {
        self.target.map_or(false, |t| t == self.position)
    }
}

/// Fixed blocker. Registered into the grid on placement and removed from
/// it again by `remove`.
#[derive(Clone, Debug)]
pub struct Obstacle {
    pub position: GridCoord,
}

impl Obstacle {
    pub fn place(grid: &mut Grid, position: GridCoord) -> Option<Self> {
        grid.register_obstacle(position).then_some(Obstacle { position })
    }

    pub fn remove(self, grid: &mut Grid) {
        grid.unregister_obstacle(self.position);
    }
}
