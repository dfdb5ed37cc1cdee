//! Collision predicates and per-tick sweeps
//!
//! All tests are boundary inclusive: touching counts.

use glam::Vec2;

use super::entities::{Hazard, Pickup};
use super::player::PlayerBody;

/// Circle vs axis-aligned rectangle (`rect_pos` is the top-left corner).
///
/// Clamp the centre into the rectangle and compare the squared distance to
/// that closest point against `r²`.
#[inline]
pub fn circle_intersects_rect(center: Vec2, radius: f32, rect_pos: Vec2, rect_size: Vec2) -> bool {
    let closest = center.clamp(rect_pos, rect_pos + rect_size);
    center.distance_squared(closest) <= radius * radius
}

/// Circle vs circle
#[inline]
pub fn circle_intersects_circle(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let reach = ra + rb;
    a.distance_squared(b) <= reach * reach
}

/// Index of the first hazard touching the player.
///
/// Stops at the first hit: any hit ends the run.
pub fn first_hazard_hit(player: &PlayerBody, hazards: &[Hazard]) -> Option<usize> {
    hazards
        .iter()
        .position(|h| circle_intersects_rect(player.pos, player.radius, h.pos, h.size))
}

/// Remove and return every pickup the player touches this tick
pub fn collect_pickups(player: &PlayerBody, pickups: &mut Vec<Pickup>) -> Vec<Pickup> {
    let mut collected = Vec::new();
    pickups.retain(|p| {
        if circle_intersects_circle(player.pos, player.radius, p.pos, p.radius) {
            collected.push(p.clone());
            false
        } else {
            true
        }
    });
    collected
}
