//! WorldState: the complete snapshot of a running gallery.
//!
//! One `WorldState` per loaded level. It owns the grid, every entity and
//! the turn bookkeeping, and is passed by reference to the turn engine,
//! the evaluator and the renderer. There is no other game state.
//!
//! ## Spawn order
//!
//! `from_level` spawns player, exhibits, obstacles, then candle holders.
//! A spawn that lands off the grid or on an occupied tile is skipped with
//! a warning; later spawns see earlier ones as occupants.

use thiserror::Error;
use tracing::{info, warn};

use crate::config::GameConfig;
use crate::domain::coord::GridCoord;
use crate::domain::entity::{Exhibit, Obstacle, Player};
use crate::domain::grid::Grid;
use crate::domain::light::CandleHolder;
use crate::domain::rules::BoardView;
use crate::sim::evaluate::Goal;
use crate::sim::level::LevelDef;

/// Terminal-screen tile size. Only feeds the grid/world transform.
pub const TILE_SIZE: f32 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Phase {
    Playing,
    Won,
    TimeExpired,
    Collided,
}

/// Where every entity stands, in spawn order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Positions {
    pub player: GridCoord,
    pub exhibits: Vec<GridCoord>,
    pub candles: Vec<GridCoord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum RelightError {
    #[error("game has already ended")]
    GameEnded,
    #[error("no candle holder #{index}")]
    NoSuchCandle { index: usize },
    #[error("candle holder #{index} is still burning")]
    AlreadyLit { index: usize },
    #[error("no relights left")]
    BudgetExhausted,
}

pub struct WorldState {
    // ── Board ──
    pub grid: Grid,
    pub player: Player,
    pub exhibits: Vec<Exhibit>,
    pub candles: Vec<CandleHolder>,
    pub obstacles: Vec<Obstacle>,

    // ── Turn tracking ──
    pub turn: u32,
    pub max_turns: u32,
    pub relights_remaining: u32,
    pub goal: Goal,
    /// Set only while `resolve_turn` runs.
    pub turn_in_progress: bool,

    // ── Meta ──
    pub phase: Phase,
    pub level_name: String,
    pub message: String,

    // ── Restart source ──
    def: LevelDef,
    config: GameConfig,
}

// ── Construction ──

impl WorldState {
    pub fn from_level(def: &LevelDef, config: &GameConfig) -> Self {
        let mut grid = Grid::new(def.width, def.height, TILE_SIZE);

        if !grid.is_valid_position(def.player) {
            warn!(level = %def.name, position = %def.player, "player spawns off the grid");
        }
        let player = Player::new(def.player);

        let mut exhibits: Vec<Exhibit> = Vec::with_capacity(def.exhibits.len());
        for spawn in &def.exhibits {
            let pos = spawn.spawn;
            if !grid.is_valid_position(pos) || pos == player.position || exhibits.iter().any(|e| e.position == pos) {
                warn!(level = %def.name, position = %pos, "exhibit spawn is off the grid or occupied, skipped");
                continue;
            }
            if let Some(tile) = spawn.target.filter(|t| !grid.is_valid_position(*t)) {
                warn!(level = %def.name, target_tile = %tile, "exhibit target is off the grid and can never be reached");
            }
            exhibits.push(Exhibit::new(exhibits.len(), pos, spawn.pattern.clone(), spawn.target));
        }

        let mut obstacles = Vec::with_capacity(def.obstacles.len());
        for &pos in &def.obstacles {
            if pos == player.position || exhibits.iter().any(|e| e.position == pos) {
                warn!(level = %def.name, position = %pos, "obstacle spawn is occupied, skipped");
                continue;
            }
            if let Some(obstacle) = Obstacle::place(&mut grid, pos) {
                obstacles.push(obstacle);
            }
        }

        let mut candles: Vec<CandleHolder> = Vec::with_capacity(def.candles.len());
        for spawn in &def.candles {
            let pos = spawn.spawn;
            let occupied = pos == player.position
                || exhibits.iter().any(|e| e.position == pos)
                || candles.iter().any(|c| c.position == pos);
            if !grid.is_walkable(pos) || occupied {
                warn!(level = %def.name, position = %pos, "candle holder spawn is blocked or occupied, skipped");
                continue;
            }
            candles.push(CandleHolder::new(
                candles.len(),
                pos,
                spawn.lit,
                spawn.radius.unwrap_or(config.light.radius),
                spawn.max_flame_turns.unwrap_or(config.light.max_flame_turns),
            ));
        }

        WorldState {
            grid,
            player,
            exhibits,
            candles,
            obstacles,
            turn: 0,
            max_turns: def.max_turns.unwrap_or(config.turn.max_turns),
            relights_remaining: def.relights.unwrap_or(config.light.relights),
            goal: def.goal,
            turn_in_progress: false,
            phase: Phase::Playing,
            level_name: def.name.clone(),
            message: String::new(),
            def: def.clone(),
            config: config.clone(),
        }
    }

    /// Tear the level down and rebuild every entity from its definition.
    pub fn restart(&mut self) {
        for obstacle in self.obstacles.drain(..) {
            obstacle.remove(&mut self.grid);
        }
        *self = WorldState::from_level(&self.def, &self.config);
        info!(level = %self.level_name, "level restarted");
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = msg.into();
    }
}

// ── Queries ──

impl WorldState {
    pub fn is_ended(&self) -> bool {
        self.phase != Phase::Playing
    }

    pub fn board(&self) -> BoardView<'_> {
        BoardView {
            grid: &self.grid,
            player: &self.player,
            exhibits: &self.exhibits,
            candles: &self.candles,
        }
    }

    pub fn positions(&self) -> Positions {
        Positions {
            player: self.player.position,
            exhibits: self.exhibits.iter().map(|e| e.position).collect(),
            candles: self.candles.iter().map(|c| c.position).collect(),
        }
    }

    pub fn has_targets(&self) -> bool {
        self.exhibits.iter().any(|e| e.target.is_some())
    }
}

// ── Relight ──

impl WorldState {
    /// Relight holder `index`. Costs one relight, never a turn.
    pub fn relight(&mut self, index: usize) -> Result<(), RelightError> {
        if self.is_ended() {
            return Err(RelightError::GameEnded);
        }
        let candle = self.candles.get_mut(index).ok_or(RelightError::NoSuchCandle { index })?;
        if candle.is_lit() {
            return Err(RelightError::AlreadyLit { index });
        }
        if self.relights_remaining == 0 {
            return Err(RelightError::BudgetExhausted);
        }
        candle.relight();
        self.relights_remaining -= 1;
        info!(index, remaining = self.relights_remaining, "relight spent");
        Ok(())
    }
}
