//! Session controller: the phase state machine and the host-facing boundary
//!
//! ```text
//! Idle ──start──▶ Running ◀──toggle/resume──▶ Paused
//!                    │   (visibility loss also pauses)
//!                 hazard hit
//!                    ▼
//!                  Ended ──restart──▶ Running
//! any phase ──menu──▶ Idle
//! ```
//!
//! The host owns the frame callback and calls [`Session::tick`] once per
//! display refresh. The session never schedules itself; [`Session::wants_frames`]
//! tells the host when it can drop its frame registration.

use serde::{Deserialize, Serialize};

use crate::consts::BEST_SCORE_KEY;
use crate::persistence::{ScoreStore, load_best};
use crate::settings::{Difficulty, DifficultyConfig, Tuning};
use crate::sim::{self, Action, GameEvent, GamePhase, Playfield, PickupKind, SimState, TickOutcome};

/// Commands the session refused. The session is unchanged in every case.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    #[error("A session is already in progress")]
    AlreadyRunning,
    #[error("Difficulty is locked while a session is in progress")]
    DifficultyLocked,
    #[error("Unknown difficulty '{0}'")]
    UnknownDifficulty(String),
    #[error("Cannot {action} while {phase:?}")]
    InvalidPhase { action: &'static str, phase: GamePhase },
}

/// Player as the renderer sees it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub r: f32,
    pub dashing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HazardView {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupView {
    pub x: f32,
    pub y: f32,
    pub category: PickupKind,
}

/// Immutable per-tick view for the host
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSnapshot {
    pub player: PlayerView,
    pub hazards: Vec<HazardView>,
    pub pickups: Vec<PickupView>,
    pub phase: GamePhase,
    /// Throttled score
    pub score: u64,
    /// Persisted best (updated when a run ends)
    pub best: u64,
    /// Events raised during this tick
    pub events: Vec<GameEvent>,
}

/// One game's session: phase, difficulty, simulation state and persistence
pub struct Session {
    phase: GamePhase,
    difficulty: Difficulty,
    state: SimState,
    store: Box<dyn ScoreStore>,
    key: String,
    seed: u64,
}

impl Session {
    /// Build a session; the best score is read from `store` here and only here.
    pub fn new(store: Box<dyn ScoreStore>, tuning: Tuning, seed: u64) -> Self {
        Self::with_key(store, BEST_SCORE_KEY, tuning, seed)
    }

    pub fn with_key(store: Box<dyn ScoreStore>, key: &str, tuning: Tuning, seed: u64) -> Self {
        let best = load_best(store.as_ref(), key);
        log::info!("Session ready (best {})", best);
        Self {
            phase: GamePhase::Idle,
            difficulty: Difficulty::default(),
            state: SimState::new(seed, tuning.validated(), best),
            store,
            key: key.to_string(),
            seed,
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn config(&self) -> DifficultyConfig {
        self.difficulty.config()
    }

    /// Visible (throttled) score
    pub fn score(&self) -> u64 {
        self.state.score.visible()
    }

    pub fn best(&self) -> u64 {
        self.state.score.best()
    }

    pub fn state(&self) -> &SimState {
        &self.state
    }

    /// Whether the host should keep delivering frames
    pub fn wants_frames(&self) -> bool {
        matches!(self.phase, GamePhase::Running | GamePhase::Paused)
    }

    fn in_progress(&self) -> bool {
        self.wants_frames()
    }

    /// Select a difficulty; refused while a run is in progress
    pub fn set_difficulty(&mut self, difficulty: Difficulty) -> Result<(), SessionError> {
        if self.in_progress() {
            log::debug!("Difficulty change to {} refused", difficulty.as_str());
            return Err(SessionError::DifficultyLocked);
        }
        self.difficulty = difficulty;
        Ok(())
    }

    /// Select a difficulty by name (`easy`, `normal`, `hard`)
    pub fn set_difficulty_str(&mut self, name: &str) -> Result<(), SessionError> {
        let difficulty = name.parse::<Difficulty>().inspect_err(|e| log::debug!("{}", e))?;
        self.set_difficulty(difficulty)
    }

    /// Layout size reported by the host
    pub fn set_playfield(&mut self, width: f32, height: f32) {
        self.state.playfield = Playfield::new(width, height);
    }

    /// Begin a fresh run (from `Idle` or `Ended`)
    pub fn start(&mut self) -> Result<(), SessionError> {
        if self.in_progress() {
            log::debug!("Start refused: already {:?}", self.phase);
            return Err(SessionError::AlreadyRunning);
        }
        self.seed = self.seed.wrapping_add(1);
        self.state.reset(self.seed);
        self.phase = GamePhase::Running;
        log::info!(
            "Run started ({}, seed {})",
            self.difficulty.as_str(),
            self.seed
        );
        Ok(())
    }

    /// Same as [`Session::start`]; reads better after a run ended
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.start()
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        if self.phase != GamePhase::Running {
            return Err(SessionError::InvalidPhase {
                action: "pause",
                phase: self.phase,
            });
        }
        self.phase = GamePhase::Paused;
        log::info!("Paused");
        Ok(())
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        if self.phase != GamePhase::Paused {
            return Err(SessionError::InvalidPhase {
                action: "resume",
                phase: self.phase,
            });
        }
        self.phase = GamePhase::Running;
        log::info!("Resumed");
        Ok(())
    }

    pub fn toggle_pause(&mut self) -> Result<(), SessionError> {
        match self.phase {
            GamePhase::Running => self.pause(),
            GamePhase::Paused => self.resume(),
            phase => Err(SessionError::InvalidPhase {
                action: "toggle pause",
                phase,
            }),
        }
    }

    /// Host visibility changed. Hiding pauses a running game; showing
    /// again does not resume it.
    pub fn set_host_visible(&mut self, visible: bool) {
        if !visible && self.phase == GamePhase::Running {
            self.phase = GamePhase::Paused;
            log::info!("Auto-paused (host hidden)");
        }
    }

    /// Leave to the menu from any phase. An unfinished run is discarded
    /// without touching the best score.
    pub fn return_to_menu(&mut self) {
        if self.phase != GamePhase::Idle {
            log::info!("Returned to menu from {:?}", self.phase);
        }
        self.phase = GamePhase::Idle;
        self.state.reset(self.seed);
    }

    /// Logical action pressed
    pub fn press(&mut self, action: Action) {
        match action {
            Action::Pause => {
                let _ = self.toggle_pause();
            }
            Action::Menu => self.return_to_menu(),
            _ => self.state.input.press(action),
        }
    }

    /// Logical action released
    pub fn release(&mut self, action: Action) {
        self.state.input.release(action);
    }

    /// One host frame. Simulates only while running; paused frames just
    /// keep the clock current so resuming does not see a stale timestamp.
    pub fn tick(&mut self, timestamp_ms: f64) -> RenderSnapshot {
        match self.phase {
            GamePhase::Running => self.step(timestamp_ms),
            GamePhase::Paused => self.state.clock.observe(timestamp_ms),
            GamePhase::Idle | GamePhase::Ended => {}
        }
        self.snapshot()
    }

    fn step(&mut self, timestamp_ms: f64) {
        let cfg = self.difficulty.config();
        let dt = self.state.clock.advance(timestamp_ms);

        let outcome = sim::tick(&mut self.state, &cfg, dt);
        self.state.score.sync(timestamp_ms);

        if outcome == TickOutcome::HazardHit {
            self.end_run(timestamp_ms);
        }
    }

    /// Natural end of a run: the only place the best score is written
    fn end_run(&mut self, timestamp_ms: f64) {
        let previous = self.state.score.best();
        self.state.score.force_sync(timestamp_ms);
        let best = self.state.score.finish();
        self.store.set(&self.key, best);
        self.phase = GamePhase::Ended;

        let score = self.state.score.internal();
        if score > previous {
            self.state.events.push(GameEvent::NewBest { score });
            log::info!("Run ended: {} (new best, was {})", score, previous);
        } else {
            log::info!("Run ended: {} (best {})", score, best);
        }
    }

    /// Current view; drains pending events
    pub fn snapshot(&mut self) -> RenderSnapshot {
        let events = self.state.take_events();
        let state = &self.state;
        let player = &state.player;
        RenderSnapshot {
            player: PlayerView {
                x: player.pos.x,
                y: player.pos.y,
                r: player.radius,
                dashing: player.is_dashing(),
            },
            hazards: state
                .entities
                .hazards
                .iter()
                .map(|h| HazardView {
                    x: h.pos.x,
                    y: h.pos.y,
                    w: h.size.x,
                    h: h.size.y,
                })
                .collect(),
            pickups: state
                .entities
                .pickups
                .iter()
                .map(|p| PickupView {
                    x: p.pos.x,
                    y: p.pos.y,
                    category: p.kind,
                })
                .collect(),
            phase: self.phase,
            score: state.score.visible(),
            best: state.score.best(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;
    use crate::sim::{Entity, Hazard, Pickup};
    use glam::Vec2;
    use proptest::prelude::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    /// Store that can be inspected after being boxed into a session
    #[derive(Clone, Default)]
    struct SharedStore(Rc<RefCell<MemoryStore>>);

    impl ScoreStore for SharedStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.borrow().get(key)
        }
        fn set(&mut self, key: &str, value: u64) {
            self.0.borrow_mut().set(key, value);
        }
    }

    fn session_with(store: SharedStore) -> Session {
        Session::new(Box::new(store), Tuning::default(), 1)
    }

    fn session() -> Session {
        session_with(SharedStore::default())
    }

    /// Put a hazard right on the player
    fn doom(s: &mut Session) {
        let pos = s.state.player.pos;
        s.state.entities.insert(Entity::Hazard(Hazard {
            id: 999,
            pos: pos - Vec2::splat(4.0),
            size: Vec2::splat(8.0),
            vel: Vec2::ZERO,
        }));
    }

    fn run_frames(s: &mut Session, from_ms: f64, frames: usize) -> f64 {
        let mut t = from_ms;
        for _ in 0..frames {
            t += 16.0;
            s.tick(t);
        }
        t
    }

    #[test]
    fn test_start_and_double_start() {
        let mut s = session();
        assert_eq!(s.phase(), GamePhase::Idle);
        assert!(!s.wants_frames());
        s.start().unwrap();
        assert_eq!(s.phase(), GamePhase::Running);
        assert!(s.wants_frames());
        assert_eq!(s.start(), Err(SessionError::AlreadyRunning));
        assert_eq!(s.phase(), GamePhase::Running);
    }

    #[test]
    fn test_visibility_pauses_but_does_not_resume() {
        let mut s = session();
        s.start().unwrap();
        s.set_host_visible(false);
        assert_eq!(s.phase(), GamePhase::Paused);
        s.set_host_visible(true);
        assert_eq!(s.phase(), GamePhase::Paused);
        s.press(Action::Pause);
        assert_eq!(s.phase(), GamePhase::Running);
    }

    #[test]
    fn test_paused_tick_freezes_world() {
        let mut s = session();
        s.start().unwrap();
        s.press(Action::Right);
        let t = run_frames(&mut s, 0.0, 10);
        let pos = s.state().player.pos;
        let ticks = s.state().time_ticks;

        s.press(Action::Pause);
        let t = run_frames(&mut s, t, 100);
        assert_eq!(s.state().player.pos, pos);
        assert_eq!(s.state().time_ticks, ticks);

        // Resume: the first step is a normal frame, not the whole pause
        s.press(Action::Pause);
        s.tick(t + 16.0);
        let moved = s.state().player.pos.x - pos.x;
        assert!(moved > 0.0 && moved <= 150.0 * 0.016 + 1e-3, "moved {}", moved);
    }

    #[test]
    fn test_hazard_ends_run_and_persists_once() {
        let store = SharedStore::default();
        let mut s = session_with(store.clone());
        s.start().unwrap();
        s.state.score.add_points(40);
        doom(&mut s);
        let snap = s.tick(16.0);
        assert_eq!(snap.phase, GamePhase::Ended);
        assert_eq!(snap.score, 40);
        assert_eq!(snap.best, 40);
        assert!(snap.events.contains(&GameEvent::HazardHit));
        assert!(snap.events.contains(&GameEvent::NewBest { score: 40 }));
        assert!(!s.wants_frames());

        // Ended sessions do nothing further
        s.tick(32.0);
        s.tick(48.0);
        assert_eq!(store.0.borrow().writes, 1);
        assert_eq!(store.0.borrow().get(BEST_SCORE_KEY).as_deref(), Some("40"));
    }

    #[test]
    fn test_corrupt_best_treated_as_zero() {
        let store = SharedStore(Rc::new(RefCell::new(
            MemoryStore::new().with_raw(BEST_SCORE_KEY, "abc"),
        )));
        let mut s = session_with(store.clone());
        assert_eq!(s.best(), 0);

        s.start().unwrap();
        s.state.score.add_points(10);
        doom(&mut s);
        s.tick(16.0);
        assert_eq!(s.best(), 10);
        assert_eq!(store.0.borrow().get(BEST_SCORE_KEY).as_deref(), Some("10"));
    }

    #[test]
    fn test_lower_score_keeps_best() {
        let store = SharedStore(Rc::new(RefCell::new(
            MemoryStore::new().with_raw(BEST_SCORE_KEY, "500"),
        )));
        let mut s = session_with(store.clone());
        s.start().unwrap();
        doom(&mut s);
        let snap = s.tick(16.0);
        assert_eq!(snap.best, 500);
        assert!(!snap.events.iter().any(|e| matches!(e, GameEvent::NewBest { .. })));
        assert_eq!(store.0.borrow().get(BEST_SCORE_KEY).as_deref(), Some("500"));
    }

    #[test]
    fn test_menu_does_not_persist() {
        let store = SharedStore::default();
        let mut s = session_with(store.clone());
        s.start().unwrap();
        s.state.score.add_points(100);
        s.press(Action::Menu);
        assert_eq!(s.phase(), GamePhase::Idle);
        assert!(!s.wants_frames());
        assert_eq!(store.0.borrow().writes, 0);

        // Menu from paused and ended is accepted too
        s.start().unwrap();
        s.pause().unwrap();
        s.return_to_menu();
        assert_eq!(s.phase(), GamePhase::Idle);
    }

    #[test]
    fn test_restart_resets_everything() {
        let mut s = session();
        s.start().unwrap();
        s.press(Action::Down);
        run_frames(&mut s, 0.0, 120);
        s.state.entities.insert(Entity::Pickup(Pickup {
            id: 1,
            pos: Vec2::new(600.0, 20.0),
            radius: 9.0,
            ttl: 6.0,
            kind: PickupKind::Ordinary,
            points: 10,
        }));
        s.state.score.add_points(30);
        doom(&mut s);
        s.tick(5_000.0);
        assert_eq!(s.phase(), GamePhase::Ended);

        s.restart().unwrap();
        let snap = s.snapshot();
        assert_eq!(snap.phase, GamePhase::Running);
        assert!(snap.hazards.is_empty());
        assert!(snap.pickups.is_empty());
        assert_eq!((snap.player.x, snap.player.y), (160.0, 200.0));
        assert_eq!(snap.score, 0);
        assert_eq!(s.state().score.internal(), 0);
        // Held keys from the last run do not leak into the new one
        assert!(!s.state().input.is_held(Action::Down));
    }

    #[test]
    fn test_difficulty_locked_while_in_progress() {
        let mut s = session();
        s.set_difficulty(Difficulty::Hard).unwrap();
        s.start().unwrap();
        assert_eq!(s.set_difficulty(Difficulty::Easy), Err(SessionError::DifficultyLocked));
        s.pause().unwrap();
        assert_eq!(s.set_difficulty(Difficulty::Easy), Err(SessionError::DifficultyLocked));
        assert_eq!(s.difficulty(), Difficulty::Hard);

        s.return_to_menu();
        assert!(matches!(
            s.set_difficulty_str("impossible"),
            Err(SessionError::UnknownDifficulty(_))
        ));
        assert_eq!(s.difficulty(), Difficulty::Hard);
        s.set_difficulty_str("easy").unwrap();
        assert_eq!(s.difficulty(), Difficulty::Easy);
    }

    #[test]
    fn test_invalid_toggles_are_noops() {
        let mut s = session();
        assert!(s.toggle_pause().is_err());
        assert!(s.resume().is_err());
        s.set_host_visible(false);
        assert_eq!(s.phase(), GamePhase::Idle);
    }

    #[test]
    fn test_degenerate_playfield_spawns_nothing() {
        let mut s = session();
        s.set_playfield(0.0, 0.0);
        s.start().unwrap();
        let snap = {
            run_frames(&mut s, 0.0, 200);
            s.snapshot()
        };
        assert_eq!(snap.phase, GamePhase::Running);
        assert!(snap.hazards.is_empty());
        assert!(snap.pickups.is_empty());
    }

    #[test]
    fn test_visible_score_throttled() {
        let mut s = session();
        s.start().unwrap();
        s.tick(1_000.0);
        s.state.score.add_points(25);
        let snap = s.tick(1_016.0);
        assert_eq!(snap.score, 0);
        let snap = s.tick(1_120.0);
        assert_eq!(snap.score, 25);
    }

    #[test]
    fn test_overflowing_tuning_runs_without_panic() {
        // 1e39 overflows f32 to infinity on the way in
        let settings = crate::Settings::from_json(
            r#"{"tuning":{"hazard_size_max":1e39,"hazard_speed_jitter_max":1e39,"pickup_inset":1e39}}"#,
        )
        .unwrap();
        let mut s = Session::new(Box::new(MemoryStore::new()), settings.tuning, 3);
        s.start().unwrap();
        run_frames(&mut s, 0.0, 300);
        assert!(s.state().entities.hazards.iter().all(|h| h.size.is_finite() && h.vel.is_finite()));
        assert!(s.state().entities.pickups.iter().all(|p| p.pos.is_finite()));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut s = session();
        s.start().unwrap();
        let snap = s.tick(0.0);
        let json = serde_json::to_value(&snap).unwrap();
        assert_eq!(json["phase"], "running");
        assert_eq!(json["player"]["r"], 10.0);
        assert_eq!(json["player"]["dashing"], false);
        assert!(json["hazards"].as_array().unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_score_monotonic_while_running(
            seed in any::<u64>(),
            moves in prop::collection::vec((0u8..7, 1u32..60), 1..300),
        ) {
            let mut s = Session::new(Box::new(MemoryStore::new()), Tuning::default(), seed);
            s.start().unwrap();
            let mut t = 0.0;
            let mut last = 0;
            for (action, gap_ms) in moves {
                let action = match action {
                    0 => Action::Up,
                    1 => Action::Down,
                    2 => Action::Left,
                    3 => Action::Right,
                    _ => Action::Dash,
                };
                if gap_ms % 2 == 0 { s.press(action) } else { s.release(action) }
                t += gap_ms as f64;
                let snap = s.tick(t);
                if snap.phase != GamePhase::Running {
                    break;
                }
                prop_assert!(snap.score >= last);
                prop_assert!(s.state().score.internal() >= snap.score);
                last = snap.score;

                let p = snap.player;
                prop_assert!(p.x >= p.r && p.x <= 640.0 - p.r);
                prop_assert!(p.y >= p.r && p.y <= 480.0 - p.r);
            }
        }
    }
}
