//! Simulation module
//!
//! All gameplay logic lives here. This module must stay host-agnostic:
//! - Time only arrives through `TimingController` / explicit `dt`
//! - Seeded RNG only
//! - Stable iteration order (insertion order, monotonic ids)
//! - No rendering or platform dependencies

pub mod collision;
pub mod entities;
pub mod input;
pub mod player;
pub mod score;
pub mod state;
pub mod tick;
pub mod timing;

pub use collision::{circle_intersects_circle, circle_intersects_rect, collect_pickups, first_hazard_hit};
pub use entities::{Edge, Entity, EntityKind, EntityManager, Hazard, Pickup, PickupKind};
pub use input::{Action, InputState};
pub use player::{DashState, PlayerBody};
pub use score::ScoreAccumulator;
pub use state::{GameEvent, GamePhase, Playfield, SimState};
pub use tick::{TickOutcome, tick};
pub use timing::TimingController;
