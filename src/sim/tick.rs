//! One simulation step
//!
//! Order within a tick is fixed: player input and motion, entity motion and
//! culling, spawning, collisions, scoring. New hazards spawn strictly outside
//! the playfield and do not move on their spawn tick, so a hazard can never
//! appear and kill in the same step.

use super::collision::{collect_pickups, first_hazard_hit};
use super::entities::EntityManager;
use super::state::{GameEvent, SimState};
use crate::settings::DifficultyConfig;

/// What a tick decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// The player touched a hazard; the run is over
    HazardHit,
}

/// Advance a running simulation by `dt` seconds.
///
/// `dt` is expected to come from the state's [`TimingController`] (and so be
/// bounded); the spawn timer must already include it.
///
/// [`TimingController`]: super::timing::TimingController
pub fn tick(state: &mut SimState, cfg: &DifficultyConfig, dt: f32) -> TickOutcome {
    state.time_ticks += 1;

    // Player
    let axis = state.input.movement_vector(cfg.move_speed);
    state.player.apply_input(axis);
    if state.input.take_dash(state.player.can_dash()) && state.player.try_dash() {
        state.events.push(GameEvent::DashStarted);
    }
    state.player.integrate(dt, &state.playfield);

    // Existing entities move and expire before anything new appears
    state.entities.advance(dt);
    state.entities.prune(&state.playfield, state.tuning.cull_margin);

    let interval = EntityManager::spawn_interval(&state.tuning, cfg);
    if state.clock.spawn_due(interval) {
        state
            .entities
            .spawn(&mut state.rng, &state.playfield, cfg, &state.tuning);
    }

    // Collisions
    let hit = first_hazard_hit(&state.player, &state.entities.hazards);
    if let Some(idx) = hit {
        log::debug!(
            "Hazard {} hit at tick {}",
            state.entities.hazards[idx].id,
            state.time_ticks
        );
        state.events.push(GameEvent::HazardHit);
    }

    for pickup in collect_pickups(&state.player, &mut state.entities.pickups) {
        state.score.add_points(pickup.points);
        state.events.push(GameEvent::PickupCollected {
            kind: pickup.kind,
            points: pickup.points,
        });
    }

    let rate = state.tuning.passive_score_rate;
    if state.tuning.carry_passive_fraction {
        state.score.add_passive_carried(dt, rate);
    } else {
        state.score.add_passive(dt, rate);
    }

    if hit.is_some() {
        TickOutcome::HazardHit
    } else {
        TickOutcome::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::{Difficulty, Tuning};
    use crate::sim::entities::{Entity, Hazard, Pickup, PickupKind};
    use crate::sim::input::Action;
    use glam::Vec2;

    const DT: f32 = 0.032;

    fn state() -> SimState {
        SimState::new(42, Tuning::default(), 0)
    }

    fn step(state: &mut SimState, cfg: &DifficultyConfig) -> TickOutcome {
        state.clock.accumulate(DT);
        tick(state, cfg, DT)
    }

    #[test]
    fn test_spawn_cadence_normal() {
        // 0.9 / 1.25 = 0.72s; at 32ms per tick the 23rd tick crosses it
        let cfg = Difficulty::Normal.config();
        let mut state = state();
        let mut spawn_ticks = Vec::new();
        let mut last = 0;
        for i in 1..=69 {
            step(&mut state, &cfg);
            let count = state.entities.hazards.len();
            if count > last {
                spawn_ticks.push(i);
            }
            last = count;
        }
        assert_eq!(spawn_ticks, vec![23, 46, 69]);
    }

    #[test]
    fn test_pickup_scored_once() {
        let cfg = Difficulty::Easy.config();
        let mut state = state();
        let at = state.player.pos;
        state.entities.insert(Entity::Pickup(Pickup {
            id: 100,
            pos: at,
            radius: 9.0,
            ttl: 6.0,
            kind: PickupKind::Uncommon,
            points: 25,
        }));
        state.entities.insert(Entity::Pickup(Pickup {
            id: 101,
            pos: at + Vec2::new(5.0, 0.0),
            radius: 9.0,
            ttl: 6.0,
            kind: PickupKind::Rare,
            points: 50,
        }));

        assert_eq!(step(&mut state, &cfg), TickOutcome::Continue);
        assert_eq!(state.score.internal(), 75);
        assert!(state.entities.pickups.is_empty());
        let collected = state
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::PickupCollected { .. }))
            .count();
        assert_eq!(collected, 2);

        step(&mut state, &cfg);
        assert_eq!(state.score.internal(), 75);
    }

    #[test]
    fn test_hazard_hit_ends() {
        let cfg = Difficulty::Normal.config();
        let mut state = state();
        state.entities.insert(Entity::Hazard(Hazard {
            id: 7,
            pos: state.player.pos - Vec2::splat(5.0),
            size: Vec2::splat(10.0),
            vel: Vec2::ZERO,
        }));
        assert_eq!(step(&mut state, &cfg), TickOutcome::HazardHit);
        assert!(state.events.contains(&GameEvent::HazardHit));
    }

    #[test]
    fn test_dash_once_per_cooldown_window() {
        let cfg = Difficulty::Normal.config();
        let mut state = state();
        // Keep re-pressing dash every tick, the most aggressive input possible
        let mut fired_at = Vec::new();
        for i in 0..400 {
            state.input.release(Action::Dash);
            state.input.press(Action::Dash);
            step(&mut state, &cfg);
            if state.take_events().contains(&GameEvent::DashStarted) {
                fired_at.push(i as f32 * DT);
            }
            state.entities.clear();
        }
        assert!(fired_at.len() > 2);
        for pair in fired_at.windows(2) {
            assert!(pair[1] - pair[0] >= 1.2 - 1e-3, "{:?}", fired_at);
        }
    }

    #[test]
    fn test_held_dash_fires_once() {
        let cfg = Difficulty::Normal.config();
        let mut state = state();
        state.input.press(Action::Dash);
        let mut dashes = 0;
        for _ in 0..200 {
            step(&mut state, &cfg);
            dashes += state
                .take_events()
                .iter()
                .filter(|e| **e == GameEvent::DashStarted)
                .count();
            state.entities.clear();
        }
        assert_eq!(dashes, 1);
    }

    #[test]
    fn test_passive_score_floors_short_ticks() {
        let cfg = Difficulty::Easy.config();
        let mut state = state();
        state.tuning.pickup_chance = 0.0;
        for _ in 0..60 {
            state.clock.accumulate(0.016);
            tick(&mut state, &cfg, 0.016);
            state.entities.clear();
        }
        assert_eq!(state.score.internal(), 0);

        // Opting into the carry credits the fractions instead
        let tuning = Tuning {
            carry_passive_fraction: true,
            pickup_chance: 0.0,
            ..Default::default()
        };
        let mut carried = SimState::new(42, tuning, 0);
        for _ in 0..60 {
            carried.clock.accumulate(0.016);
            tick(&mut carried, &cfg, 0.016);
            carried.entities.clear();
        }
        assert_eq!(carried.score.internal(), 9);
    }

    #[test]
    fn test_determinism() {
        let cfg = Difficulty::Hard.config();
        let mut a = SimState::new(99_999, Tuning::default(), 0);
        let mut b = SimState::new(99_999, Tuning::default(), 0);
        for _ in 0..300 {
            step(&mut a, &cfg);
            step(&mut b, &cfg);
        }
        assert_eq!(a.entities.hazards.len(), b.entities.hazards.len());
        for (x, y) in a.entities.hazards.iter().zip(&b.entities.hazards) {
            assert_eq!(x.pos, y.pos);
        }
        assert_eq!(a.score.internal(), b.score.internal());
    }
}
