//! Win / loss evaluation and the collision sweep.
//!
//! `evaluate` adjudicates the end of a collision-free turn only.
//! Collision losses are raised by the step itself (pre-commit intent
//! check and the post-commit `find_collision` sweep below).

use std::fmt;

use serde::Deserialize;

use crate::domain::coord::GridCoord;

use super::world::WorldState;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Verdict {
    Ongoing,
    Won,
    TimeExpired,
    CollisionLoss,
}

impl Verdict {
    pub fn is_terminal(self) -> bool {
        self != Verdict::Ongoing
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Collision {
    ExhibitExhibit,
    ExhibitCandle,
    PlayerEntity,
}

impl fmt::Display for Collision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Collision::ExhibitExhibit => "Exhibits collided!",
            Collision::ExhibitCandle => "An exhibit knocked over a candle holder!",
            Collision::PlayerEntity => "You were run over by an exhibit!",
        };
        f.write_str(text)
    }
}

/// How a level is won.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Goal {
    /// Every exhibit with a target stands on it. Checked every turn.
    #[default]
    Targets,
    /// Every exhibit is back on its spawn tile when the last turn ends.
    RestoreStart,
}

pub fn evaluate(world: &WorldState) -> Verdict {
    let out_of_time = world.turn >= world.max_turns;
    match world.goal {
        Goal::Targets => {
            let all_placed = world.exhibits.iter().filter(|e| e.target.is_some()).all(|e| e.at_target());
            if world.has_targets() && all_placed {
                Verdict::Won
            } else if out_of_time {
                Verdict::TimeExpired
            } else {
                Verdict::Ongoing
            }
        }
        Goal::RestoreStart => {
            if !out_of_time {
                Verdict::Ongoing
            } else if world.exhibits.iter().all(|e| e.position == e.start) {
                Verdict::Won
            } else {
                Verdict::TimeExpired
            }
        }
    }
}

/// First coincidence between any two entities, if any.
pub fn find_collision(world: &WorldState) -> Option<(Collision, GridCoord)> {
    let exhibits = &world.exhibits;
    for (i, a) in exhibits.iter().enumerate() {
        if let Some(b) = exhibits[i + 1..].iter().find(|b| b.position == a.position) {
            return Some((Collision::ExhibitExhibit, b.position));
        }
    }
    for candle in &world.candles {
        if exhibits.iter().any(|e| e.position == candle.position) {
            return Some((Collision::ExhibitCandle, candle.position));
        }
    }
    let player = world.player.position;
    let hits_player = exhibits.iter().any(|e| e.position == player)
        || world.candles.iter().any(|c| c.position == player);
    hits_player.then_some((Collision::PlayerEntity, player))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::domain::pattern::MovementPattern;
    use crate::sim::level::{ExhibitDef, LevelDef};

    fn world(def: &LevelDef) -> WorldState {
        WorldState::from_level(def, &GameConfig::default())
    }

    fn still() -> MovementPattern {
        MovementPattern::Circular { circle_size: 1 }
    }

    fn level(exhibits: Vec<ExhibitDef>) -> LevelDef {
        LevelDef {
            max_turns: Some(20),
            player: GridCoord::new(0, 0),
            exhibits,
            ..LevelDef::default()
        }
    }

    fn exhibit(spawn: (i32, i32), target: Option<(i32, i32)>) -> ExhibitDef {
        ExhibitDef {
            spawn: GridCoord::new(spawn.0, spawn.1),
            target: target.map(|(x, y)| GridCoord::new(x, y)),
            pattern: still(),
        }
    }

    #[test]
    fn won_when_all_targets_met() {
        let w = world(&level(vec![
            exhibit((3, 3), Some((3, 3))),
            exhibit((5, 5), None),
        ]));
        assert_eq!(evaluate(&w), Verdict::Won);
    }

    #[test]
    fn no_targets_never_wins() {
        let mut w = world(&level(vec![exhibit((3, 3), None)]));
        assert_eq!(evaluate(&w), Verdict::Ongoing);
        w.turn = 20;
        assert_eq!(evaluate(&w), Verdict::TimeExpired);
    }

    #[test]
    fn time_expires_exactly_at_max() {
        let mut w = world(&level(vec![exhibit((3, 3), Some((4, 4)))]));
        w.turn = 19;
        assert_eq!(evaluate(&w), Verdict::Ongoing);
        w.turn = 20;
        assert_eq!(evaluate(&w), Verdict::TimeExpired);
    }

    #[test]
    fn win_beats_time() {
        let mut w = world(&level(vec![exhibit((3, 3), Some((3, 3)))]));
        w.turn = 20;
        assert_eq!(evaluate(&w), Verdict::Won);
    }

    #[test]
    fn restore_start_only_decides_on_last_turn() {
        let mut def = level(vec![exhibit((3, 3), None)]);
        def.goal = Goal::RestoreStart;
        let mut w = world(&def);
        assert_eq!(evaluate(&w), Verdict::Ongoing);
        w.turn = 20;
        assert_eq!(evaluate(&w), Verdict::Won);
        w.exhibits[0].position = GridCoord::new(4, 3);
        assert_eq!(evaluate(&w), Verdict::TimeExpired);
    }

    #[test]
    fn sweep_classifies_collisions() {
        let mut w = world(&level(vec![exhibit((3, 3), None), exhibit((5, 5), None)]));
        assert_eq!(find_collision(&w), None);

        w.exhibits[1].position = GridCoord::new(3, 3);
        assert_eq!(find_collision(&w), Some((Collision::ExhibitExhibit, GridCoord::new(3, 3))));

        w.exhibits[1].position = GridCoord::new(0, 0);
        assert_eq!(find_collision(&w), Some((Collision::PlayerEntity, GridCoord::new(0, 0))));
    }
}
