//! Candle holders: light radius, flame decay, relight.
//!
//! Two states:
//!   - **Lit**: freezes exhibits standing within `radius` (Chebyshev).
//!     Each `on_turn_end` burns one flame turn.
//!   - **Unlit**: reached automatically when the flame has burned
//!     `max_flame_turns`. Only `relight` brings it back.

use tracing::{info, warn};

use super::coord::GridCoord;
use super::grid::Grid;

#[derive(Clone, Debug)]
pub struct CandleHolder {
    pub id: usize,
    pub position: GridCoord,
    lit: bool,
    pub radius: i32,
    flame_turns: u32,
    max_flame_turns: u32,
}

impl CandleHolder {
    pub fn new(id: usize, position: GridCoord, lit: bool, radius: i32, max_flame_turns: u32) -> Self {
        let max_flame_turns = if max_flame_turns == 0 {
            warn!(id, %position, "max_flame_turns must be at least 1, using 1");
            1
        } else {
            max_flame_turns
        };
        CandleHolder {
            id,
            position,
            lit,
            radius: radius.max(0),
            // An unlit holder counts as burnt out.
            flame_turns: if lit { 0 } else { max_flame_turns },
            max_flame_turns,
        }
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn flame_turns(&self) -> u32 {
        self.flame_turns
    }

    pub fn max_flame_turns(&self) -> u32 {
        self.max_flame_turns
    }

    /// Flame turns left before the candle goes out.
    pub fn remaining_flame(&self) -> u32 {
        self.max_flame_turns - self.flame_turns
    }

    pub fn is_in_light_area(&self, coord: GridCoord) -> bool {
        self.lit && self.position.chebyshev(coord) <= self.radius
    }

    /// Burn one turn. Returns true exactly when this call put the flame out.
    pub fn on_turn_end(&mut self) -> bool {
        if !self.lit {
            return false;
        }
        self.flame_turns += 1;
        if self.flame_turns >= self.max_flame_turns {
            self.flame_turns = self.max_flame_turns;
            self.lit = false;
            info!(id = self.id, position = %self.position, "candle flame went out");
            return true;
        }
        false
    }

    /// Returns whether the holder was unlit. A lit holder is left as is.
    pub fn relight(&mut self) -> bool {
        if self.lit {
            return false;
        }
        self.lit = true;
        self.flame_turns = 0;
        info!(id = self.id, position = %self.position, "candle relit");
        true
    }

    /// Valid tiles currently lit by this holder.
    pub fn lit_tiles<'a>(&'a self, grid: &'a Grid) -> impl Iterator<Item = GridCoord> + 'a {
        let r = if self.lit { self.radius } else { -1 };
        (-r..=r)
            .flat_map(move |dx| (-r..=r).map(move |dy| self.position + GridCoord::new(dx, dy)))
            .filter(move |c| grid.is_valid_position(*c))
    }
}

/// Is `coord` inside the light of any lit holder?
pub fn is_frozen(holders: &[CandleHolder], coord: GridCoord) -> bool {
    holders.iter().any(|h| h.is_in_light_area(coord))
}
