//! The player body and its dash sub-machine

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::Playfield;
use crate::clamp_point;
use crate::consts::*;

/// Dash sub-state. The cooldown lives on the body and runs independently.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DashState {
    Normal,
    /// Seconds of dash left
    Dashing { remaining: f32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBody {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub dash: DashState,
    /// Seconds until the next dash is allowed (≤ 0 means ready)
    pub dash_cooldown: f32,
}

impl Default for PlayerBody {
    fn default() -> Self {
        Self {
            pos: Self::ORIGIN,
            vel: Vec2::ZERO,
            radius: PLAYER_RADIUS,
            dash: DashState::Normal,
            dash_cooldown: 0.0,
        }
    }
}

impl PlayerBody {
    pub const ORIGIN: Vec2 = Vec2::new(PLAYER_ORIGIN_X, PLAYER_ORIGIN_Y);

    pub fn is_dashing(&self) -> bool {
        matches!(self.dash, DashState::Dashing { .. })
    }

    /// Whether a dash could start right now
    pub fn can_dash(&self) -> bool {
        !self.is_dashing() && self.dash_cooldown <= 0.0
    }

    /// Set velocity from the (already speed-scaled) input axis
    pub fn apply_input(&mut self, axis: Vec2) {
        self.vel = axis;
    }

    /// Start a dash if allowed. Returns true if one started.
    pub fn try_dash(&mut self) -> bool {
        if !self.can_dash() {
            return false;
        }
        let dir = self.vel.try_normalize().unwrap_or(Vec2::X);
        self.vel += dir * DASH_IMPULSE;
        self.dash = DashState::Dashing {
            remaining: DASH_DURATION,
        };
        self.dash_cooldown = DASH_COOLDOWN;
        true
    }

    /// Move, clamp into the playfield (solid walls), run down the timers
    pub fn integrate(&mut self, dt: f32, field: &Playfield) {
        self.pos += self.vel * dt;
        self.clamp_to(field);

        if let DashState::Dashing { remaining } = self.dash {
            let remaining = remaining - dt;
            self.dash = if remaining <= 0.0 {
                DashState::Normal
            } else {
                DashState::Dashing { remaining }
            };
        }
        if self.dash_cooldown > 0.0 {
            self.dash_cooldown -= dt;
        }
    }

    pub fn clamp_to(&mut self, field: &Playfield) {
        let r = Vec2::splat(self.radius);
        self.pos = clamp_point(self.pos, r, field.size() - r);
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
