//! Entry point and game loop.

mod ui;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use tracing::{debug, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use nightwatch::config::GameConfig;
use nightwatch::domain::rules::TurnRejected;
use nightwatch::sim::event::GameEvent;
use nightwatch::sim::level::{load_levels, LevelDef};
use nightwatch::sim::step;
use nightwatch::sim::world::WorldState;
use ui::input::{InputState, KEYS_NEXT, KEYS_PREV, KEYS_QUIT, KEYS_RESTART};
use ui::renderer::Renderer;

const FRAME_SLEEP: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    let _guard = setup_logging()?;

    let config = GameConfig::load();
    let levels = load_levels(&config);
    if levels.is_empty() {
        bail!("no playable levels in {}", config.levels_dir.display());
    }
    info!(count = levels.len(), "galleries loaded");

    let mut renderer = Renderer::new();
    renderer.init().context("terminal init failed")?;

    let result = game_loop(&mut renderer, &levels, &config);

    if let Err(e) = renderer.cleanup() {
        eprintln!("Terminal cleanup failed: {e}");
    }
    result?;

    println!();
    println!("Thanks for keeping watch over the gallery.");
    Ok(())
}

/// File-only logging: the terminal belongs to the renderer.
/// The returned guard flushes the writer when dropped.
fn setup_logging() -> Result<tracing_appender::non_blocking::WorkerGuard> {
    let log_dir = std::env::var_os("NIGHTWATCH_LOG_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("logs"));
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("could not create log directory {}", log_dir.display()))?;

    let file_appender = tracing_appender::rolling::never(&log_dir, "nightwatch.log");
    let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    info!(dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}

fn game_loop(renderer: &mut Renderer, levels: &[LevelDef], config: &GameConfig) -> Result<()> {
    let mut kb = InputState::new();
    let mut current = 0;
    let mut world = WorldState::from_level(&levels[current], config);
    let turn_delay = Duration::from_millis(config.turn.turn_delay_ms);
    let mut last_turn: Option<Instant> = None;

    loop {
        kb.drain_events();

        if kb.ctrl_c_pressed() || kb.any_pressed(KEYS_QUIT) {
            break;
        }
        // Presentation pacing: presses during the delay are dropped.
        if last_turn.map_or(false, |t| t.elapsed() < turn_delay) {
            kb.discard();
        }

        if kb.any_pressed(KEYS_RESTART) {
            world.restart();
            renderer.invalidate()?;
        } else if kb.any_pressed(KEYS_NEXT) || kb.any_pressed(KEYS_PREV) {
            current = if kb.any_pressed(KEYS_NEXT) {
                (current + 1) % levels.len()
            } else {
                (current + levels.len() - 1) % levels.len()
            };
            world = WorldState::from_level(&levels[current], config);
            info!(level = %world.level_name, "gallery switched");
            renderer.invalidate()?;
        } else if let Some(index) = kb.relight_index() {
            match world.relight(index) {
                Ok(()) => world.set_message(format!("Candle holder {} relit.", index + 1)),
                Err(e) => world.set_message(capitalize(&e.to_string())),
            }
        } else if let Some(dir) = kb.direction() {
            match step::resolve_turn(&mut world, dir) {
                Ok(result) => {
                    last_turn = Some(Instant::now());
                    if !result.verdict.is_terminal() {
                        world.set_message(turn_message(&result.events));
                    }
                }
                Err(TurnRejected::GameEnded) => {}
                Err(e) => {
                    debug!(error = %e, "move refused");
                    world.set_message(capitalize(&e.to_string()));
                }
            }
        }

        renderer.render(&world, current, levels.len())?;
        std::thread::sleep(FRAME_SLEEP);
    }

    Ok(())
}

/// Status line for an ongoing turn: flames that went out, else nothing.
fn turn_message(events: &[GameEvent]) -> String {
    let out: Vec<String> = events
        .iter()
        .filter_map(|e| match e {
            GameEvent::FlameOut { id, .. } => Some((id + 1).to_string()),
            _ => None,
        })
        .collect();
    match out.len() {
        0 => String::new(),
        1 => format!("Candle holder {} went out. Press {} to relight.", out[0], out[0]),
        _ => format!("Candle holders {} went out.", out.join(", ")),
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
