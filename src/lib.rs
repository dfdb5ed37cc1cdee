//! Office Dodge - A dodge-the-blocks arcade game
//!
//! Core modules:
//! - `sim`: Simulation (timing, input, player, entities, collisions, scoring)
//! - `session`: Phase state machine and host-facing boundary
//! - `persistence`: Best-score storage gateway
//! - `platform`: Browser host helpers (key mapping, layout)
//! - `settings`: Difficulty presets and data-driven tuning

pub mod persistence;
pub mod platform;
pub mod session;
pub mod settings;
pub mod sim;

pub use persistence::{MemoryStore, ScoreStore};
pub use session::{RenderSnapshot, Session, SessionError};
pub use settings::{Difficulty, DifficultyConfig, Settings, Tuning};

use glam::Vec2;

/// Game configuration constants
pub mod consts {
    /// Largest simulated step per tick (seconds); longer frame gaps are clamped
    pub const MAX_FRAME_DT: f32 = 0.032;

    /// Default playfield (4:3, matches the browser host's container)
    pub const DEFAULT_PLAYFIELD_WIDTH: f32 = 640.0;
    pub const DEFAULT_PLAYFIELD_HEIGHT: f32 = 480.0;

    /// Player defaults
    pub const PLAYER_ORIGIN_X: f32 = 160.0;
    pub const PLAYER_ORIGIN_Y: f32 = 200.0;
    pub const PLAYER_RADIUS: f32 = 10.0;

    /// Dash impulse magnitude (units/s), added along the movement direction
    pub const DASH_IMPULSE: f32 = 480.0;
    /// How long a dash counts as active (seconds)
    pub const DASH_DURATION: f32 = 0.15;
    /// Minimum time between dashes (seconds)
    pub const DASH_COOLDOWN: f32 = 1.2;

    /// Persistence key for the best score
    pub const BEST_SCORE_KEY: &str = "office_dodge_best";
}

/// Clamp that tolerates `min > max` (returns `max`), unlike `f32::clamp`.
///
/// The playfield can briefly be smaller than the player during a layout
/// transition; integration must not panic then.
#[inline]
pub fn clamp_lenient(v: f32, min: f32, max: f32) -> f32 {
    v.max(min).min(max)
}

/// Clamp a point into an axis-aligned box, component-wise, with the same
/// tolerance as [`clamp_lenient`].
#[inline]
pub fn clamp_point(p: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    Vec2::new(clamp_lenient(p.x, min.x, max.x), clamp_lenient(p.y, min.y, max.y))
}
