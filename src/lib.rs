//! Nightwatch: turn-resolution engine for a grid museum puzzle.
//!
//! `domain` holds the pure rules (grid, patterns, light, push legality),
//! `sim` owns the per-level context and the turn step, `config` loads
//! `config.toml`. The terminal front-end lives in the binary.

pub mod config;
pub mod domain;
pub mod sim;
