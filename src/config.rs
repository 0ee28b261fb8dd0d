//! External configuration loader.
//!
//! Reads `config.toml` from the executable's directory (or CWD).
//! Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct GameConfig {
    pub turn: TurnConfig,
    pub light: LightConfig,
    pub levels_dir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct TurnConfig {
    pub max_turns: u32,
    pub turn_delay_ms: u64, // input ignored this long after a turn resolves
}

#[derive(Clone, Debug)]
pub struct LightConfig {
    pub radius: i32,
    pub max_flame_turns: u32,
    pub relights: u32, // per level, shared by all holders
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    turn: TomlTurn,
    #[serde(default)]
    light: TomlLight,
    #[serde(default)]
    general: TomlGeneral,
}

#[derive(Deserialize, Debug)]
struct TomlTurn {
    #[serde(default = "default_max_turns")]
    max_turns: u32,
    #[serde(default = "default_turn_delay")]
    turn_delay_ms: u64,
}

#[derive(Deserialize, Debug)]
struct TomlLight {
    #[serde(default = "default_radius")]
    radius: i32,
    #[serde(default = "default_max_flame")]
    max_flame_turns: u32,
    #[serde(default = "default_relights")]
    relights: u32,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default = "default_levels_dir")]
    levels_dir: String,
}

// ── Defaults ──

fn default_max_turns() -> u32 { 20 }
fn default_turn_delay() -> u64 { 100 }
fn default_radius() -> i32 { 1 }      // 3x3 light square
fn default_max_flame() -> u32 { 5 }
fn default_relights() -> u32 { 3 }
fn default_levels_dir() -> String { "levels".into() }

impl Default for TomlTurn {
    fn default() -> Self {
        TomlTurn {
            max_turns: default_max_turns(),
            turn_delay_ms: default_turn_delay(),
        }
    }
}

impl Default for TomlLight {
    fn default() -> Self {
        TomlLight {
            radius: default_radius(),
            max_flame_turns: default_max_flame(),
            relights: default_relights(),
        }
    }
}

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            levels_dir: default_levels_dir(),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig::from_toml(TomlConfig::default(), &[])
    }
}

// ── Loading ──

impl GameConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        GameConfig::from_toml(toml_cfg, &search_dirs)
    }

    /// Parse config text directly. Errors fall back to defaults.
    pub fn parse(text: &str) -> Self {
        let toml_cfg = match toml::from_str::<TomlConfig>(text) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(error = %e, "config.toml parse error, using default settings");
                TomlConfig::default()
            }
        };
        GameConfig::from_toml(toml_cfg, &[])
    }

    fn from_toml(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // Resolve levels directory
        let levels_dir_str = &toml_cfg.general.levels_dir;
        let levels_dir = if PathBuf::from(levels_dir_str).is_absolute() {
            PathBuf::from(levels_dir_str)
        } else {
            search_dirs.iter()
                .map(|d| d.join(levels_dir_str))
                .find(|p| p.is_dir())
                .unwrap_or_else(|| PathBuf::from(levels_dir_str))
        };

        GameConfig {
            turn: TurnConfig {
                max_turns: toml_cfg.turn.max_turns,
                turn_delay_ms: toml_cfg.turn.turn_delay_ms,
            },
            light: LightConfig {
                radius: toml_cfg.light.radius,
                max_flame_turns: toml_cfg.light.max_flame_turns,
                relights: toml_cfg.light.relights,
            },
            levels_dir,
        }
    }
}

/// Candidate directories to search: exe dir + CWD + system paths (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/nightwatch)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/nightwatch");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    // 4. System data directory (/usr/share/nightwatch)
    let sys = PathBuf::from("/usr/share/nightwatch");
    if sys.is_dir() && !dirs.iter().any(|d| d == &sys) {
        dirs.push(sys);
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => match toml::from_str::<TomlConfig>(&text) {
                    Ok(cfg) => return cfg,
                    Err(e) => {
                        warn!(path = %path.display(), error = %e, "config.toml parse error, using default settings");
                        return TomlConfig::default();
                    }
                },
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "could not read config file");
                }
            }
        }
    }
    TomlConfig::default()
}
