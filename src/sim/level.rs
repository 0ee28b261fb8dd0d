/// Level loader.
///
/// ## Sources (priority order):
///   1. `levels/` directory (`config.levels_dir`), every `*.toml` file,
///      sorted by file name
///   2. Built-in embedded galleries
///
/// A file that fails to read or parse is logged and skipped; the embedded
/// set is only used when the directory yields no level at all.
///
/// ## Level format (`.toml`):
///   ```toml
///   name = "Gallery 1 - Night Shift"   # defaults to the file stem
///   width = 9
///   height = 9
///   max_turns = 20                     # optional, else [turn] max_turns
///   relights = 3                       # optional, else [light] relights
///   goal = "targets"                   # or "restore_start"
///   player = [5, 4]
///   obstacles = [[0, 0], [8, 8]]
///
///   [[exhibits]]
///   spawn = [6, 2]
///   target = [6, 1]                    # optional
///   pattern = { kind = "horizontal", move_distance = 3 }
///
///   [[candles]]
///   spawn = [4, 4]
///   lit = true                         # optional, default true
///   radius = 1                         # optional, else [light] radius
///   max_flame_turns = 5                # optional, else [light] max_flame_turns
///   ```
///
/// Coordinates are `[x, y]` with y growing upward.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::GameConfig;
use crate::domain::coord::GridCoord;
use crate::domain::pattern::MovementPattern;
use crate::sim::evaluate::Goal;

#[derive(Clone, Debug, Deserialize)]
pub struct LevelDef {
    #[serde(default)]
    pub name: String,
    pub width: i32,
    pub height: i32,
    pub max_turns: Option<u32>,
    pub relights: Option<u32>,
    #[serde(default)]
    pub goal: Goal,
    pub player: GridCoord,
    #[serde(default)]
    pub obstacles: Vec<GridCoord>,
    #[serde(default)]
    pub exhibits: Vec<ExhibitDef>,
    #[serde(default)]
    pub candles: Vec<CandleDef>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ExhibitDef {
    pub spawn: GridCoord,
    pub target: Option<GridCoord>,
    pub pattern: MovementPattern,
}

#[derive(Clone, Debug, Deserialize)]
pub struct CandleDef {
    pub spawn: GridCoord,
    #[serde(default = "default_lit")]
    pub lit: bool,
    pub radius: Option<i32>,
    pub max_flame_turns: Option<u32>,
}

fn default_lit() -> bool { true }

impl Default for LevelDef {
    fn default() -> Self {
        LevelDef {
            name: "Untitled".into(),
            width: 9,
            height: 9,
            max_turns: None,
            relights: None,
            goal: Goal::default(),
            player: GridCoord::ZERO,
            obstacles: vec![],
            exhibits: vec![],
            candles: vec![],
        }
    }
}

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid level file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("grid must be at least 1x1, got {width}x{height}")]
    BadDimensions { width: i32, height: i32 },
    #[error("player spawn {0} is outside the grid")]
    PlayerOffGrid(GridCoord),
}

// ══════════════════════════════════════════════════════════════
// Public API
// ══════════════════════════════════════════════════════════════

impl LevelDef {
    pub fn parse(text: &str) -> Result<Self, LevelError> {
        let def: LevelDef = toml::from_str(text)?;
        def.validate()?;
        Ok(def)
    }

    /// Structural checks only. Bad spawns are reported later, per entity,
    /// when the level is built.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.width < 1 || self.height < 1 {
            return Err(LevelError::BadDimensions { width: self.width, height: self.height });
        }
        let p = self.player;
        if p.x < 0 || p.y < 0 || p.x >= self.width || p.y >= self.height {
            return Err(LevelError::PlayerOffGrid(p));
        }
        Ok(())
    }
}

/// Read one level file. The file stem names a level that has no `name`.
pub fn load_level_file(path: &Path) -> Result<LevelDef, LevelError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| LevelError::Io { path: path.to_path_buf(), source })?;
    let mut def = LevelDef::parse(&text)?;
    if def.name.is_empty() {
        def.name = path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
    }
    Ok(def)
}

/// All playable levels, directory first, embedded as fallback.
pub fn load_levels(config: &GameConfig) -> Vec<LevelDef> {
    let from_dir = load_from_directory(&config.levels_dir);
    if !from_dir.is_empty() {
        debug!(dir = %config.levels_dir.display(), count = from_dir.len(), "levels loaded from directory");
        return from_dir;
    }
    debug!(dir = %config.levels_dir.display(), "no level files found, using embedded galleries");
    embedded_levels()
}

// ══════════════════════════════════════════════════════════════
// Directory loading (individual .toml files)
// ══════════════════════════════════════════════════════════════

fn load_from_directory(dir: &Path) -> Vec<LevelDef> {
    let entries = match std::fs::read_dir(dir) {
        Ok(e) => e,
        Err(_) => return vec![],
    };

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().map_or(false, |e| e == "toml"))
        .collect();
    paths.sort();

    paths
        .iter()
        .filter_map(|path| match load_level_file(path) {
            Ok(def) => Some(def),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping level file");
                None
            }
        })
        .collect()
}

// ══════════════════════════════════════════════════════════════
// Embedded fallback levels
// ══════════════════════════════════════════════════════════════

const EMBEDDED: &[&str] = &[
    include_str!("../../levels/01_night_shift.toml"),
    include_str!("../../levels/02_rotunda.toml"),
    include_str!("../../levels/03_restoration.toml"),
];

fn embedded_levels() -> Vec<LevelDef> {
    EMBEDDED
        .iter()
        .filter_map(|text| match LevelDef::parse(text) {
            Ok(def) => Some(def),
            Err(e) => {
                warn!(error = %e, "embedded level is broken");
                None
            }
        })
        .collect()
}
