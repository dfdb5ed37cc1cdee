//! Platform helpers for hosts
//!
//! Handles host-side concerns the core stays out of:
//! - Keyboard key → logical action mapping
//! - Host commands that are not simulation actions (restart)
//! - Turning a layout size into a playfield

use crate::sim::{Action, Playfield};

/// What a key press means to the browser host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Forward to the session as a logical action
    Action(Action),
    /// Start again (only honoured when no run is in progress)
    Restart,
}

/// Map a `KeyboardEvent.key` value. Letters are matched case-insensitively.
pub fn map_key(key: &str) -> Option<KeyCommand> {
    let command = match key {
        "ArrowUp" => KeyCommand::Action(Action::Up),
        "ArrowDown" => KeyCommand::Action(Action::Down),
        "ArrowLeft" => KeyCommand::Action(Action::Left),
        "ArrowRight" => KeyCommand::Action(Action::Right),
        " " | "Spacebar" => KeyCommand::Action(Action::Dash),
        "Escape" => KeyCommand::Action(Action::Menu),
        _ => match key.to_ascii_lowercase().as_str() {
            "w" => KeyCommand::Action(Action::Up),
            "s" => KeyCommand::Action(Action::Down),
            "a" => KeyCommand::Action(Action::Left),
            "d" => KeyCommand::Action(Action::Right),
            "p" => KeyCommand::Action(Action::Pause),
            "r" => KeyCommand::Restart,
            _ => return None,
        },
    };
    Some(command)
}

/// Keys whose default browser behaviour (scrolling) should be suppressed
pub fn suppress_default(key: &str) -> bool {
    matches!(key, "ArrowUp" | "ArrowDown" | "ArrowLeft" | "ArrowRight" | " ")
}

/// Playfield from a layout size in CSS pixels, floored like a canvas size
pub fn playfield_from_layout(width: f64, height: f64) -> Playfield {
    Playfield::new(width.floor() as f32, height.floor() as f32)
}
