//! Bounded tile grid and its obstacle registry.
//!
//! Queries never fail: anything outside the board is simply "not valid".
//! The obstacle set only ever holds coordinates that passed the bounds
//! check, so `is_blocked` implies `is_valid_position`.

use std::collections::HashSet;

use tracing::warn;

use super::coord::GridCoord;

#[derive(Clone, Debug)]
pub struct Grid {
    pub width: i32,
    pub height: i32,
    /// Presentation scale for `grid_to_world`; turn logic never reads it.
    pub tile_size: f32,
    obstacles: HashSet<GridCoord>,
}

impl Grid {
    pub fn new(width: i32, height: i32, tile_size: f32) -> Self {
        Grid {
            width,
            height,
            tile_size,
            obstacles: HashSet::new(),
        }
    }

    pub fn is_valid_position(&self, coord: GridCoord) -> bool {
        coord.x >= 0 && coord.x < self.width && coord.y >= 0 && coord.y < self.height
    }

    pub fn is_blocked(&self, coord: GridCoord) -> bool {
        self.obstacles.contains(&coord)
    }

    pub fn is_walkable(&self, coord: GridCoord) -> bool {
        self.is_valid_position(coord) && !self.is_blocked(coord)
    }

    /// Idempotent. Returns false (and leaves the set untouched) for
    /// coordinates outside the board.
    pub fn register_obstacle(&mut self, coord: GridCoord) -> bool {
        if !self.is_valid_position(coord) {
            warn!(%coord, "refusing to register obstacle outside the grid");
            return false;
        }
        self.obstacles.insert(coord);
        true
    }

    pub fn unregister_obstacle(&mut self, coord: GridCoord) {
        self.obstacles.remove(&coord);
    }

    pub fn obstacles(&self) -> impl Iterator<Item = GridCoord> + '_ {
        self.obstacles.iter().copied()
    }

    pub fn grid_distance(&self, a: GridCoord, b: GridCoord) -> i32 {
        a.manhattan(b)
    }

    // ── Presentation transform (board centred on the world origin) ──

    fn origin(&self) -> (f32, f32) {
        let t = self.tile_size;
        (
            -(self.width as f32 * t) / 2.0 + t / 2.0,
            -(self.height as f32 * t) / 2.0 + t / 2.0,
        )
    }

    pub fn grid_to_world(&self, coord: GridCoord) -> (f32, f32) {
        let (ox, oy) = self.origin();
        (ox + coord.x as f32 * self.tile_size, oy + coord.y as f32 * self.tile_size)
    }

    pub fn world_to_grid(&self, (wx, wy): (f32, f32)) -> GridCoord {
        let (ox, oy) = self.origin();
        GridCoord::new(
            ((wx - ox) / self.tile_size).round() as i32,
            ((wy - oy) / self.tile_size).round() as i32,
        )
    }
}
