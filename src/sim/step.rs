/// The turn engine: resolves one player move into the next board state.
///
/// Processing order:
///   1. Pose bookkeeping (apply the pose cached by the previous turn)
///   2. Move legality (`rules::plan_move`), rejected moves are no-ops
///   3. Exhibit intents (pushed / patterned / frozen / yielded / bumped / idle)
///   4. Intent conflict: two movers heading for one tile ends the game
///      before anything is committed
///   5. Commit player, exhibits, pushed candle holder
///   6. Post-commit collision sweep over every entity pair
///   7. Flame decay (skipped when the turn ended in a collision)
///   8. Win / time check
///
/// Pattern step policy: the step advances for `Patterned` and `Bumped`
/// exhibits only. Frozen, yielding, pushed and idle exhibits keep their
/// phase.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::domain::coord::{Direction, GridCoord};
use crate::domain::entity::PlayerPose;
use crate::domain::light;
use crate::domain::rules::{self, MovePlan, Push, TurnRejected};
use super::evaluate::{self, Collision, Verdict};
use super::event::GameEvent;
use super::world::{Phase, Positions, WorldState};

/// What one exhibit does this turn.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ExhibitMotion {
    /// Shoved one tile by the player. Pattern ignored.
    Pushed { to: GridCoord },
    /// Takes its pattern step.
    Patterned { to: GridCoord },
    /// Standing in candle light.
    Frozen,
    /// Its pattern tile is where the player, the pushed exhibit or the
    /// pushed candle holder is going.
    Yielded,
    /// Its pattern tile is off the grid or an obstacle.
    Bumped { toward: GridCoord },
    /// Empty pattern.
    Idle,
}

impl ExhibitMotion {
    /// Tile this exhibit moves to, if it moves at all.
    pub fn destination(self) -> Option<GridCoord> {
        match self {
            ExhibitMotion::Pushed { to } | ExhibitMotion::Patterned { to } => Some(to),
            _ => None,
        }
    }

    pub fn advances_pattern(self) -> bool {
        matches!(self, ExhibitMotion::Patterned { .. } | ExhibitMotion::Bumped { .. })
    }
}

#[derive(Clone, Debug)]
pub struct TurnResult {
    pub turn: u32,
    pub positions: Positions,
    pub collision: Option<Collision>,
    pub verdict: Verdict,
    pub events: Vec<GameEvent>,
}

// ══════════════════════════════════════════════════════════════
// Main entry point
// ══════════════════════════════════════════════════════════════

pub fn resolve_turn(world: &mut WorldState, direction: Direction) -> Result<TurnResult, TurnRejected> {
    if world.is_ended() {
        return Err(TurnRejected::GameEnded);
    }
    if world.turn_in_progress {
        return Err(TurnRejected::TurnInProgress);
    }
    let plan = rules::plan_move(&world.board(), direction).map_err(|e| {
        debug!(%direction, error = %e, "move rejected");
        e
    })?;

    world.turn_in_progress = true;
    world.player.apply_cached_pose();
    world.turn += 1;

    let mut events = Vec::new();
    let motions = plan_exhibits(world, &plan);

    let collision = match find_intent_conflict(&motions) {
        Some(at) => Some((Collision::ExhibitExhibit, at)),
        None => {
            commit(world, &plan, &motions, &mut events);
            evaluate::find_collision(world)
        }
    };

    let verdict = match collision {
        Some((kind, at)) => {
            events.push(GameEvent::Collided { kind, at });
            end_game(world, Phase::Collided, kind.to_string());
            Verdict::CollisionLoss
        }
        None => {
            resolve_flames(world, &mut events);
            resolve_verdict(world, &mut events)
        }
    };

    world.player.facing = direction;
    world.player.cache_pose(PlayerPose { facing: direction, pushing: plan.push != Push::Nothing });
    world.turn_in_progress = false;

    Ok(TurnResult {
        turn: world.turn,
        positions: world.positions(),
        collision: collision.map(|(kind, _)| kind),
        verdict,
        events,
    })
}

// ══════════════════════════════════════════════════════════════
// Exhibit intents
// ══════════════════════════════════════════════════════════════

/// Classify every exhibit's move for `plan`, in exhibit order.
pub fn plan_exhibits(world: &WorldState, plan: &MovePlan) -> Vec<ExhibitMotion> {
    let pushed = plan.pushed_exhibit();
    let pushed_exhibit_to = pushed.map(|(_, to)| to);
    let pushed_candle_to = plan.pushed_candle().map(|(_, to)| to);

    world
        .exhibits
        .iter()
        .enumerate()
        .map(|(i, exhibit)| {
            if let Some((index, to)) = pushed {
                if index == i {
                    return ExhibitMotion::Pushed { to };
                }
            }
            let Some(dir) = exhibit.next_direction() else {
                return ExhibitMotion::Idle;
            };
            if light::is_frozen(&world.candles, exhibit.position) {
                return ExhibitMotion::Frozen;
            }
            let to = exhibit.position + dir;
            if to == plan.player_target || Some(to) == pushed_exhibit_to || Some(to) == pushed_candle_to {
                return ExhibitMotion::Yielded;
            }
            if !world.grid.is_walkable(to) {
                return ExhibitMotion::Bumped { toward: to };
            }
            ExhibitMotion::Patterned { to }
        })
        .collect()
}

/// First tile claimed by two moving exhibits.
fn find_intent_conflict(motions: &[ExhibitMotion]) -> Option<GridCoord> {
    let mut claimed = HashSet::new();
    motions
        .iter()
        .filter_map(|m| m.destination())
        .find(|to| !claimed.insert(*to))
}

// ══════════════════════════════════════════════════════════════
// Commit
// ══════════════════════════════════════════════════════════════

fn commit(world: &mut WorldState, plan: &MovePlan, motions: &[ExhibitMotion], events: &mut Vec<GameEvent>) {
    let from = world.player.position;
    world.player.position = plan.player_target;
    events.push(GameEvent::PlayerMoved { from, to: plan.player_target });

    for (exhibit, &motion) in world.exhibits.iter_mut().zip(motions) {
        let (id, at) = (exhibit.id, exhibit.position);
        match motion {
            ExhibitMotion::Pushed { to } => {
                exhibit.position = to;
                events.push(GameEvent::ExhibitPushed { id, from: at, to });
            }
            ExhibitMotion::Patterned { to } => {
                exhibit.position = to;
                events.push(GameEvent::ExhibitMoved { id, from: at, to });
            }
            ExhibitMotion::Frozen => {
                debug!(id, position = %at, "exhibit frozen by candle light");
                events.push(GameEvent::ExhibitFrozen { id, at });
            }
            ExhibitMotion::Yielded => {
                events.push(GameEvent::ExhibitYielded { id, at });
            }
            ExhibitMotion::Bumped { toward } => {
                debug!(id, position = %at, %toward, "exhibit bumped into wall or obstacle");
                events.push(GameEvent::ExhibitBumped { id, at, toward });
            }
            ExhibitMotion::Idle => {}
        }
        if motion.advances_pattern() {
            exhibit.advance_pattern();
        }
    }

    if let Some((index, to)) = plan.pushed_candle() {
        if let Some(candle) = world.candles.get_mut(index) {
            let from = candle.position;
            candle.position = to;
            events.push(GameEvent::CandlePushed { id: candle.id, from, to });
        }
    }
}

// ══════════════════════════════════════════════════════════════
// Flames & verdict
// ══════════════════════════════════════════════════════════════

fn resolve_flames(world: &mut WorldState, events: &mut Vec<GameEvent>) {
    for candle in &mut world.candles {
        if candle.on_turn_end() {
            events.push(GameEvent::FlameOut { id: candle.id, at: candle.position });
        }
    }
}

fn resolve_verdict(world: &mut WorldState, events: &mut Vec<GameEvent>) -> Verdict {
    let verdict = evaluate::evaluate(world);
    match verdict {
        Verdict::Won => {
            events.push(GameEvent::LevelWon);
            end_game(world, Phase::Won, "The gallery is in order. Well done!".into());
        }
        Verdict::TimeExpired => {
            events.push(GameEvent::TimeExpired);
            end_game(world, Phase::TimeExpired, "Morning came. The curator is not pleased.".into());
        }
        Verdict::Ongoing | Verdict::CollisionLoss => {}
    }
    verdict
}

fn end_game(world: &mut WorldState, phase: Phase, message: String) {
    info!(level = %world.level_name, turn = world.turn, ?phase, "level ended");
    world.phase = phase;
    world.set_message(message);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::pattern::MovementPattern;
    use crate::sim::level::{load_levels, CandleDef, ExhibitDef, LevelDef};

    use Direction::{Down, Left, Right, Up};

    fn c(x: i32, y: i32) -> GridCoord {
        GridCoord::new(x, y)
    }

    fn still() -> MovementPattern {
        MovementPattern::Circular { circle_size: 1 }
    }

    fn steps(dirs: &[Direction]) -> MovementPattern {
        MovementPattern::Patterned { steps: dirs.to_vec() }
    }

    struct Gallery(LevelDef);

    impl Gallery {
        fn new(player: (i32, i32)) -> Self {
            Gallery(LevelDef {
                name: "Test".into(),
                width: 9,
                height: 9,
                max_turns: Some(20),
                player: c(player.0, player.1),
                ..LevelDef::default()
            })
        }

        fn exhibit(mut self, at: (i32, i32), pattern: MovementPattern) -> Self {
            self.0.exhibits.push(ExhibitDef { spawn: c(at.0, at.1), target: None, pattern });
            self
        }

        fn targeted(mut self, at: (i32, i32), target: (i32, i32), pattern: MovementPattern) -> Self {
            self.0.exhibits.push(ExhibitDef { spawn: c(at.0, at.1), target: Some(c(target.0, target.1)), pattern });
            self
        }

        fn candle(mut self, at: (i32, i32), lit: bool) -> Self {
            self.0.candles.push(CandleDef { spawn: c(at.0, at.1), lit, radius: Some(1), max_flame_turns: Some(5) });
            self
        }

        fn obstacle(mut self, at: (i32, i32)) -> Self {
            self.0.obstacles.push(c(at.0, at.1));
            self
        }

        fn build(self) -> WorldState {
            WorldState::from_level(&self.0, &GameConfig::default())
        }
    }

    /// Pace back and forth so the player never interferes.
    fn pace(world: &mut WorldState, a: Direction, b: Direction, turns: usize) -> Vec<TurnResult> {
        (0..turns)
            .map(|i| resolve_turn(world, if i % 2 == 0 { a } else { b }).unwrap())
            .collect()
    }

    fn exhibit_trail(results: &[TurnResult], index: usize) -> Vec<GridCoord> {
        results.iter().map(|r| r.positions.exhibits[index]).collect()
    }

    #[test]
    fn horizontal_oscillates_with_period_six() {
        let mut w = Gallery::new((0, 8)).exhibit((2, 2), MovementPattern::Horizontal { move_distance: 3 }).build();
        let results = pace(&mut w, Right, Left, 7);
        assert_eq!(
            exhibit_trail(&results, 0),
            vec![c(3, 2), c(4, 2), c(5, 2), c(4, 2), c(3, 2), c(2, 2), c(3, 2)]
        );
        assert!(results.iter().all(|r| r.verdict == Verdict::Ongoing));
    }

    #[test]
    fn circular_walks_the_square() {
        let mut w = Gallery::new((8, 0)).exhibit((2, 6), MovementPattern::Circular { circle_size: 3 }).build();
        let results = pace(&mut w, Up, Down, 8);
        assert_eq!(
            exhibit_trail(&results, 0),
            vec![c(3, 6), c(4, 6), c(4, 5), c(4, 4), c(3, 4), c(2, 4), c(2, 5), c(2, 6)]
        );
        assert_eq!(w.exhibits[0].step, 0);
    }

    #[test]
    fn candle_light_freezes_until_flame_dies() {
        let mut w = Gallery::new((0, 0))
            .exhibit((4, 4), MovementPattern::Horizontal { move_distance: 1 })
            .candle((5, 5), true)
            .build();

        let results = pace(&mut w, Up, Down, 5);
        assert!(exhibit_trail(&results, 0).iter().all(|&p| p == c(4, 4)));
        assert_eq!(w.exhibits[0].step, 0, "frozen exhibit keeps its phase");
        assert!(results[4].events.contains(&GameEvent::FlameOut { id: 0, at: c(5, 5) }));
        assert!(!w.candles[0].is_lit());

        let results = pace(&mut w, Up, Down, 2);
        assert_eq!(exhibit_trail(&results, 0), vec![c(5, 4), c(4, 4)]);
    }

    #[test]
    fn candle_push_into_edge_is_full_no_op() {
        let mut w = Gallery::new((7, 0))
            .candle((8, 0), false)
            .exhibit((2, 2), MovementPattern::Horizontal { move_distance: 1 })
            .build();
        let before = w.positions();

        assert_eq!(resolve_turn(&mut w, Right).unwrap_err(), TurnRejected::PushBlocked { destination: c(9, 0) });
        assert_eq!(w.positions(), before);
        assert_eq!(w.turn, 0);
        assert_eq!(w.exhibits[0].step, 0);
        assert_eq!(w.player.pending_pose, PlayerPose::default());
    }

    #[test]
    fn candle_push_into_obstacle_is_full_no_op() {
        let mut w = Gallery::new((2, 0)).candle((2, 1), false).obstacle((2, 2)).build();
        let before = w.positions();
        assert!(matches!(resolve_turn(&mut w, Up), Err(TurnRejected::PushBlocked { .. })));
        assert_eq!(w.positions(), before);
        assert_eq!(w.turn, 0);
    }

    #[test]
    fn pushing_onto_target_wins_on_turn_one() {
        let mut w = Gallery::new((5, 4)).targeted((5, 5), (5, 6), still()).candle((4, 4), true).build();
        let r = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r.turn, 1);
        assert_eq!(r.verdict, Verdict::Won);
        assert_eq!(r.positions.player, c(5, 5));
        assert!(r.events.contains(&GameEvent::LevelWon));
        assert_eq!(w.phase, Phase::Won);
        assert_eq!(resolve_turn(&mut w, Down).unwrap_err(), TurnRejected::GameEnded);
    }

    #[test]
    fn patterned_collision_on_exact_turn() {
        // A reaches (3,4) on its third step, B on its third step.
        let mut w = Gallery::new((8, 0))
            .exhibit((0, 4), MovementPattern::Horizontal { move_distance: 3 })
            .exhibit((5, 5), steps(&[Left, Left, Down]))
            .build();

        let r1 = resolve_turn(&mut w, Up).unwrap();
        let r2 = resolve_turn(&mut w, Down).unwrap();
        assert_eq!((r1.verdict, r2.verdict), (Verdict::Ongoing, Verdict::Ongoing));

        let r3 = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r3.turn, 3);
        assert_eq!(r3.verdict, Verdict::CollisionLoss);
        assert_eq!(r3.collision, Some(Collision::ExhibitExhibit));
        // Intent conflict: nothing was committed.
        assert_eq!(r3.positions, r2.positions);
        assert_eq!(w.phase, Phase::Collided);
    }

    #[test]
    fn moving_into_standing_exhibit_collides_after_commit() {
        let mut w = Gallery::new((0, 0))
            .exhibit((2, 2), MovementPattern::Horizontal { move_distance: 1 })
            .exhibit((3, 2), still())
            .candle((8, 8), true)
            .build();
        let r = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r.collision, Some(Collision::ExhibitExhibit));
        assert_eq!(r.positions.exhibits[0], c(3, 2));
        assert_eq!(r.positions.player, c(0, 1));
        assert_eq!(w.candles[0].flame_turns(), 0, "no flame tick on a collision turn");
    }

    #[test]
    fn pushing_exhibit_into_exhibit_collides() {
        let mut w = Gallery::new((1, 2)).exhibit((2, 2), still()).exhibit((3, 2), still()).build();
        let r = resolve_turn(&mut w, Right).unwrap();
        assert_eq!(r.verdict, Verdict::CollisionLoss);
        assert_eq!(r.collision, Some(Collision::ExhibitExhibit));
    }

    #[test]
    fn exhibit_walking_into_candle_collides() {
        let mut w = Gallery::new((0, 0))
            .exhibit((2, 2), MovementPattern::Horizontal { move_distance: 1 })
            .candle((3, 2), false)
            .build();
        let r = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r.collision, Some(Collision::ExhibitCandle));
    }

    #[test]
    fn swapping_exhibits_do_not_collide() {
        let mut w = Gallery::new((0, 0)).exhibit((2, 2), steps(&[Right])).exhibit((3, 2), steps(&[Left])).build();
        let r = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r.verdict, Verdict::Ongoing);
        assert_eq!(r.positions.exhibits, vec![c(3, 2), c(2, 2)]);
    }

    #[test]
    fn time_expires_on_last_turn() {
        let mut w = Gallery::new((0, 0)).targeted((4, 4), (8, 8), still()).build();
        let results = pace(&mut w, Up, Down, 19);
        assert_eq!(results[18].verdict, Verdict::Ongoing);

        let r = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r.turn, 20);
        assert_eq!(r.verdict, Verdict::TimeExpired);
        assert!(r.events.contains(&GameEvent::TimeExpired));
        assert_eq!(resolve_turn(&mut w, Down).unwrap_err(), TurnRejected::GameEnded);
        assert_eq!(w.turn, 20);
    }

    #[test]
    fn yielding_to_player_keeps_phase() {
        let mut w = Gallery::new((5, 3)).exhibit((3, 3), MovementPattern::Horizontal { move_distance: 1 }).build();

        let r = resolve_turn(&mut w, Left).unwrap();
        assert_eq!(r.positions.exhibits[0], c(3, 3));
        assert_eq!(w.exhibits[0].step, 0);
        assert!(r.events.contains(&GameEvent::ExhibitYielded { id: 0, at: c(3, 3) }));

        let r = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r.positions.exhibits[0], c(4, 3));
        assert_eq!(w.exhibits[0].step, 1);
    }

    #[test]
    fn bumped_exhibit_stays_but_advances() {
        let mut w = Gallery::new((0, 0)).exhibit((7, 1), MovementPattern::Horizontal { move_distance: 2 }).build();
        let results = pace(&mut w, Up, Down, 4);
        assert_eq!(exhibit_trail(&results, 0), vec![c(8, 1), c(8, 1), c(7, 1), c(6, 1)]);
        assert!(results[1].events.contains(&GameEvent::ExhibitBumped { id: 0, at: c(8, 1), toward: c(9, 1) }));
    }

    #[test]
    fn obstacle_bumps_exhibit() {
        let mut w = Gallery::new((0, 0))
            .exhibit((3, 1), MovementPattern::Horizontal { move_distance: 1 })
            .obstacle((4, 1))
            .build();
        let results = pace(&mut w, Up, Down, 2);
        assert_eq!(exhibit_trail(&results, 0), vec![c(3, 1), c(2, 1)]);
    }

    #[test]
    fn pushed_exhibit_keeps_phase() {
        let mut w = Gallery::new((1, 2)).exhibit((2, 2), MovementPattern::Horizontal { move_distance: 2 }).build();
        let r = resolve_turn(&mut w, Right).unwrap();
        assert_eq!(r.positions.exhibits[0], c(3, 2));
        assert_eq!(w.exhibits[0].step, 0);

        let r = resolve_turn(&mut w, Up).unwrap();
        assert_eq!(r.positions.exhibits[0], c(4, 2));
        assert_eq!(w.exhibits[0].step, 1);
    }

    #[test]
    fn exhibit_yields_to_pushed_exhibit_destination() {
        let mut w = Gallery::new((1, 2)).exhibit((2, 2), still()).exhibit((3, 3), steps(&[Down])).build();
        let r = resolve_turn(&mut w, Right).unwrap();
        assert_eq!(r.verdict, Verdict::Ongoing);
        assert_eq!(r.positions.exhibits, vec![c(3, 2), c(3, 3)]);
    }

    #[test]
    fn exhibit_yields_to_pushed_candle_destination() {
        let mut w = Gallery::new((1, 2)).candle((2, 2), false).exhibit((3, 3), steps(&[Down])).build();
        let r = resolve_turn(&mut w, Right).unwrap();
        assert_eq!(r.verdict, Verdict::Ongoing);
        assert_eq!(r.positions.candles, vec![c(3, 2)]);
        assert_eq!(r.positions.exhibits, vec![c(3, 3)]);
        assert!(r.events.contains(&GameEvent::CandlePushed { id: 0, from: c(2, 2), to: c(3, 2) }));
    }

    #[test]
    fn invalid_pattern_is_idle() {
        let mut w = Gallery::new((0, 0)).exhibit((4, 4), MovementPattern::Vertical { move_distance: 1 }).build();
        let results = pace(&mut w, Up, Down, 3);
        assert!(exhibit_trail(&results, 0).iter().all(|&p| p == c(4, 4)));
        assert_eq!(w.exhibits[0].step, 0);
    }

    #[test]
    fn pose_is_applied_one_turn_late() {
        let mut w = Gallery::new((1, 2)).exhibit((2, 2), still()).build();
        resolve_turn(&mut w, Right).unwrap();
        assert_eq!(w.player.applied_pose, PlayerPose::default());
        assert_eq!(w.player.pending_pose, PlayerPose { facing: Right, pushing: true });

        resolve_turn(&mut w, Up).unwrap();
        assert_eq!(w.player.applied_pose, PlayerPose { facing: Right, pushing: true });
        assert_eq!(w.player.pending_pose, PlayerPose { facing: Up, pushing: false });
    }

    #[test]
    fn turn_in_progress_is_rejected() {
        let mut w = Gallery::new((0, 0)).build();
        w.turn_in_progress = true;
        assert_eq!(resolve_turn(&mut w, Up).unwrap_err(), TurnRejected::TurnInProgress);
        assert_eq!(w.turn, 0);
    }

    #[test]
    fn no_shared_tiles_without_collision_verdict() {
        let config = GameConfig::default();
        let cycle = [Up, Right, Right, Down, Left, Up, Up, Left, Down, Right];
        for def in load_levels(&config) {
            let mut w = WorldState::from_level(&def, &config);
            for &dir in cycle.iter().cycle().take(40) {
                let Ok(r) = resolve_turn(&mut w, dir) else { continue };
                if r.verdict != Verdict::CollisionLoss {
                    let mut seen = HashSet::new();
                    let all = std::iter::once(r.positions.player)
                        .chain(r.positions.exhibits.iter().copied())
                        .chain(r.positions.candles.iter().copied());
                    for p in all {
                        assert!(seen.insert(p), "{} shares {p} after turn {}", def.name, r.turn);
                    }
                }
                if w.is_ended() {
                    break;
                }
            }
        }
    }
}
