//! Held logical actions and dash edge detection
//!
//! The host translates devices into [`Action`]s; this module only knows what
//! is currently held.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Logical actions the host can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    Up,
    Down,
    Left,
    Right,
    Dash,
    /// Pause toggle (handled by the session on press)
    Pause,
    /// Return to menu (handled by the session on press)
    Menu,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputState {
    up: bool,
    down: bool,
    left: bool,
    right: bool,
    dash: bool,
    /// A dash already fired for the current hold
    dash_consumed: bool,
}

impl InputState {
    pub fn press(&mut self, action: Action) {
        match action {
            Action::Up => self.up = true,
            Action::Down => self.down = true,
            Action::Left => self.left = true,
            Action::Right => self.right = true,
            Action::Dash => self.dash = true,
            Action::Pause | Action::Menu => {}
        }
    }

    pub fn release(&mut self, action: Action) {
        match action {
            Action::Up => self.up = false,
            Action::Down => self.down = false,
            Action::Left => self.left = false,
            Action::Right => self.right = false,
            Action::Dash => {
                self.dash = false;
                self.dash_consumed = false;
            }
            Action::Pause | Action::Menu => {}
        }
    }

    pub fn is_held(&self, action: Action) -> bool {
        match action {
            Action::Up => self.up,
            Action::Down => self.down,
            Action::Left => self.left,
            Action::Right => self.right,
            Action::Dash => self.dash,
            Action::Pause | Action::Menu => false,
        }
    }

    /// Signed axis sum scaled by `move_speed`. Diagonals are not normalized.
    pub fn movement_vector(&self, move_speed: f32) -> Vec2 {
        let axis = |neg: bool, pos: bool| (pos as i8 - neg as i8) as f32;
        Vec2::new(axis(self.left, self.right), axis(self.up, self.down)) * move_speed
    }

    /// Edge-triggered dash.
    ///
    /// Fires on the first call where dash is held and `eligible` is true, then
    /// stays quiet until the action is released and pressed again.
    pub fn take_dash(&mut self, eligible: bool) -> bool {
        if self.dash && eligible && !self.dash_consumed {
            self.dash_consumed = true;
            true
        } else {
            false
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
