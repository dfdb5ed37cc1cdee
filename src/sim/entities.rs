//! Hazards, pickups and their lifecycle
//!
//! Hazards enter from a playfield edge and drift across; pickups sit still
//! until they expire or are collected. Both are spawned by the same timer.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::state::Playfield;
use crate::settings::{DifficultyConfig, Tuning};

/// A moving rectangle that ends the run on contact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hazard {
    pub id: u32,
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
}

impl Hazard {
    /// Top-left corner more than `margin` outside the playfield on some side
    pub fn is_beyond(&self, field: &Playfield, margin: f32) -> bool {
        self.pos.x <= -margin
            || self.pos.x >= field.width + margin
            || self.pos.y <= -margin
            || self.pos.y >= field.height + margin
    }
}

/// Pickup categories, most to least common
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickupKind {
    Ordinary,
    Uncommon,
    Rare,
}

impl PickupKind {
    pub const ALL: [PickupKind; 3] = [PickupKind::Ordinary, PickupKind::Uncommon, PickupKind::Rare];

    fn index(self) -> usize {
        match self {
            PickupKind::Ordinary => 0,
            PickupKind::Uncommon => 1,
            PickupKind::Rare => 2,
        }
    }

    /// Category for a uniform roll in [0, 1) given normalized weights.
    ///
    /// The rarest category takes the top of the range.
    pub fn from_roll(roll: f32, weights: [f32; 3]) -> Self {
        let rare_floor = 1.0 - weights[2];
        let uncommon_floor = rare_floor - weights[1];
        if roll > rare_floor {
            PickupKind::Rare
        } else if roll > uncommon_floor {
            PickupKind::Uncommon
        } else {
            PickupKind::Ordinary
        }
    }

    pub fn points(self, tuning: &Tuning) -> u64 {
        tuning.pickup_points[self.index()]
    }
}

/// A time-limited collectible
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pickup {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Simulated seconds left
    pub ttl: f32,
    pub kind: PickupKind,
    pub points: u64,
}

/// Discriminant for [`Entity`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Hazard,
    Pickup,
}

/// Any spawnable thing. Stored split by type in [`EntityManager`].
#[derive(Debug, Clone)]
pub enum Entity {
    Hazard(Hazard),
    Pickup(Pickup),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Hazard(_) => EntityKind::Hazard,
            Entity::Pickup(_) => EntityKind::Pickup,
        }
    }
}

/// Which edge a hazard enters from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Top,
    Bottom,
    Left,
    Right,
}

impl Edge {
    pub const ALL: [Edge; 4] = [Edge::Top, Edge::Bottom, Edge::Left, Edge::Right];
}

/// Uniform in [lo, hi), or `lo` when the range is empty
fn range<R: Rng>(rng: &mut R, lo: f32, hi: f32) -> f32 {
    if hi > lo { rng.random_range(lo..hi) } else { lo }
}

/// Owns every live hazard and pickup
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntityManager {
    pub hazards: Vec<Hazard>,
    pub pickups: Vec<Pickup>,
    next_id: u32,
}

impl EntityManager {
    /// Seconds between spawn events for a difficulty
    pub fn spawn_interval(tuning: &Tuning, cfg: &DifficultyConfig) -> f32 {
        tuning.base_spawn_interval / cfg.spawn_rate_multiplier
    }

    fn next_entity_id(&mut self) -> u32 {
        self.next_id = self.next_id.wrapping_add(1);
        self.next_id
    }

    pub fn insert(&mut self, entity: Entity) {
        match entity {
            Entity::Hazard(h) => self.hazards.push(h),
            Entity::Pickup(p) => self.pickups.push(p),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.hazards.is_empty() && self.pickups.is_empty()
    }

    /// Build a hazard just outside `edge`, heading inward
    pub fn make_hazard<R: Rng>(
        &mut self,
        rng: &mut R,
        field: &Playfield,
        edge: Edge,
        cfg: &DifficultyConfig,
        tuning: &Tuning,
    ) -> Hazard {
        let size = Vec2::new(
            range(rng, tuning.hazard_size_min, tuning.hazard_size_max),
            range(rng, tuning.hazard_size_min, tuning.hazard_size_max),
        );
        let speed = cfg.hazard_base_speed
            + range(rng, tuning.hazard_speed_jitter_min, tuning.hazard_speed_jitter_max);
        let gap = tuning.spawn_clearance;
        let (w, h) = (field.width, field.height);

        let (pos, vel) = match edge {
            Edge::Top => (
                Vec2::new(range(rng, 0.0, w - size.x), -size.y - gap),
                Vec2::new(0.0, speed),
            ),
            Edge::Bottom => (
                Vec2::new(range(rng, 0.0, w - size.x), h + gap),
                Vec2::new(0.0, -speed),
            ),
            Edge::Left => (
                Vec2::new(-size.x - gap, range(rng, 0.0, h - size.y)),
                Vec2::new(speed, 0.0),
            ),
            Edge::Right => (
                Vec2::new(w + gap, range(rng, 0.0, h - size.y)),
                Vec2::new(-speed, 0.0),
            ),
        };

        Hazard {
            id: self.next_entity_id(),
            pos,
            size,
            vel,
        }
    }

    /// Build a pickup at a random interior point
    pub fn make_pickup<R: Rng>(&mut self, rng: &mut R, field: &Playfield, tuning: &Tuning) -> Pickup {
        let inset = tuning.pickup_inset;
        let pos = Vec2::new(
            range(rng, inset, field.width - inset),
            range(rng, inset, field.height - inset),
        );
        let kind = PickupKind::from_roll(rng.random::<f32>(), tuning.normalized_pickup_weights());
        Pickup {
            id: self.next_entity_id(),
            pos,
            radius: tuning.pickup_radius,
            ttl: tuning.pickup_ttl,
            kind,
            points: kind.points(tuning),
        }
    }

    /// One spawn event: exactly one hazard, and a pickup with
    /// `tuning.pickup_chance`. Nothing spawns on a degenerate playfield.
    pub fn spawn<R: Rng>(
        &mut self,
        rng: &mut R,
        field: &Playfield,
        cfg: &DifficultyConfig,
        tuning: &Tuning,
    ) -> Vec<EntityKind> {
        if field.is_degenerate() {
            log::debug!("Spawn skipped: degenerate playfield {:?}", field);
            return Vec::new();
        }

        let mut spawned = Vec::with_capacity(2);

        let edge = Edge::ALL[rng.random_range(0..Edge::ALL.len())];
        let hazard = Entity::Hazard(self.make_hazard(rng, field, edge, cfg, tuning));
        spawned.push(hazard.kind());
        self.insert(hazard);

        if rng.random::<f32>() < tuning.pickup_chance {
            let pickup = Entity::Pickup(self.make_pickup(rng, field, tuning));
            spawned.push(pickup.kind());
            self.insert(pickup);
        }

        log::debug!(
            "Spawned {:?} (hazards={}, pickups={})",
            spawned,
            self.hazards.len(),
            self.pickups.len()
        );
        spawned
    }

    /// Move hazards and run down pickup lifetimes
    pub fn advance(&mut self, dt: f32) {
        for hazard in &mut self.hazards {
            hazard.pos += hazard.vel * dt;
        }
        for pickup in &mut self.pickups {
            pickup.ttl -= dt;
        }
    }

    /// Drop hazards far outside the playfield and expired pickups
    pub fn prune(&mut self, field: &Playfield, cull_margin: f32) {
        self.hazards.retain(|h| !h.is_beyond(field, cull_margin));
        self.pickups.retain(|p| p.ttl > 0.0);
    }

    pub fn clear(&mut self) {
        self.hazards.clear();
        self.pickups.clear();
    }
}
