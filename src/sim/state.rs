//! Simulation state and shared simulation types
//!
//! Everything one running session mutates per tick lives in [`SimState`],
//! which the session owns exclusively and lends to [`super::tick`].

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entities::{EntityManager, PickupKind};
use super::input::InputState;
use super::player::PlayerBody;
use super::score::ScoreAccumulator;
use super::timing::TimingController;
use crate::consts::*;
use crate::settings::Tuning;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GamePhase {
    /// No session yet, or back at the menu
    Idle,
    /// Active gameplay
    Running,
    /// Frames still arrive but nothing moves
    Paused,
    /// Player hit a hazard
    Ended,
}

/// Something worth telling the host about, produced during a tick
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameEvent {
    DashStarted,
    PickupCollected { kind: PickupKind, points: u64 },
    HazardHit,
    NewBest { score: u64 },
}

/// Playable area in host units, origin top-left
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

impl Default for Playfield {
    fn default() -> Self {
        Self::new(DEFAULT_PLAYFIELD_WIDTH, DEFAULT_PLAYFIELD_HEIGHT)
    }
}

impl Playfield {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    /// Zero, negative or non-finite extent (e.g. mid layout transition)
    pub fn is_degenerate(&self) -> bool {
        !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0)
    }
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Complete per-session simulation state
#[derive(Debug, Clone)]
pub struct SimState {
    /// Seed of the current run
    pub rng_state: RngState,
    pub rng: Pcg32,
    pub clock: TimingController,
    pub input: InputState,
    pub player: PlayerBody,
    pub entities: EntityManager,
    pub score: ScoreAccumulator,
    pub playfield: Playfield,
    pub tuning: Tuning,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events raised since the last drain
    pub events: Vec<GameEvent>,
}

impl SimState {
    pub fn new(seed: u64, tuning: Tuning, best: u64) -> Self {
        let rng_state = RngState::new(seed);
        Self {
            rng: rng_state.to_rng(),
            rng_state,
            clock: TimingController::default(),
            input: InputState::default(),
            player: PlayerBody::default(),
            entities: EntityManager::default(),
            score: ScoreAccumulator::new(best, tuning.score_sync_interval_ms),
            playfield: Playfield::default(),
            tuning,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    /// Fresh run: player at origin, no entities, clocks and score zeroed.
    /// Best score, playfield and tuning carry over.
    pub fn reset(&mut self, seed: u64) {
        self.rng_state = RngState::new(seed);
        self.rng = self.rng_state.to_rng();
        self.clock.reset();
        self.input.clear();
        self.player.reset();
        self.entities.clear();
        self.score.reset();
        self.time_ticks = 0;
        self.events.clear();
    }

    pub fn take_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_degenerate_playfield() {
        assert!(!Playfield::default().is_degenerate());
        assert!(Playfield::new(0.0, 480.0).is_degenerate());
        assert!(Playfield::new(640.0, -1.0).is_degenerate());
        assert!(Playfield::new(f32::NAN, 480.0).is_degenerate());
    }

    #[test]
    fn test_same_seed_same_rng() {
        use rand::Rng;
        let mut a = SimState::new(7, Tuning::default(), 0);
        let mut b = SimState::new(7, Tuning::default(), 0);
        let xs: Vec<u32> = (0..4).map(|_| a.rng.random()).collect();
        let ys: Vec<u32> = (0..4).map(|_| b.rng.random()).collect();
        assert_eq!(xs, ys);
    }

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_string(&GameEvent::PickupCollected {
            kind: PickupKind::Rare,
            points: 50,
        })
        .unwrap();
        assert_eq!(json, r#"{"type":"pickup_collected","kind":"rare","points":50}"#);
    }
}
