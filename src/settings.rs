//! Difficulty presets, gameplay tuning and player preferences
//!
//! Preferences are persisted separately from the best score in LocalStorage.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::session::SessionError;

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
        }
    }

    /// The fixed parameter triple for this level
    pub fn config(&self) -> DifficultyConfig {
        match self {
            Difficulty::Easy => DifficultyConfig {
                move_speed: 115.0,
                spawn_rate_multiplier: 1.0,
                hazard_base_speed: 55.0,
            },
            Difficulty::Normal => DifficultyConfig {
                move_speed: 150.0,
                spawn_rate_multiplier: 1.25,
                hazard_base_speed: 80.0,
            },
            Difficulty::Hard => DifficultyConfig {
                move_speed: 175.0,
                spawn_rate_multiplier: 1.55,
                hazard_base_speed: 105.0,
            },
        }
    }
}

impl FromStr for Difficulty {
    type Err = SessionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "normal" => Ok(Difficulty::Normal),
            "hard" => Ok(Difficulty::Hard),
            _ => Err(SessionError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Immutable per-difficulty parameters, locked for a running session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyConfig {
    /// Player speed per held axis (units/s)
    pub move_speed: f32,
    /// Divides the base spawn interval
    pub spawn_rate_multiplier: f32,
    /// Hazard speed before jitter (units/s)
    pub hazard_base_speed: f32,
}

/// Data-driven gameplay balance
///
/// Everything here is a default rather than a rule: hosts may load overrides
/// from JSON. Missing fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Seconds between spawns at multiplier 1.0
    pub base_spawn_interval: f32,
    /// Hazard width/height range (units)
    pub hazard_size_min: f32,
    pub hazard_size_max: f32,
    /// Added to the difficulty's base hazard speed, uniformly in [min, max)
    pub hazard_speed_jitter_min: f32,
    pub hazard_speed_jitter_max: f32,
    /// Gap between a freshly spawned hazard and the playfield edge
    pub spawn_clearance: f32,
    /// Hazards further than this outside the playfield are culled
    pub cull_margin: f32,

    /// Chance that a spawn event also produces a pickup
    pub pickup_chance: f32,
    /// Category weights: ordinary, uncommon, rare
    pub pickup_weights: [f32; 3],
    /// Category points: ordinary, uncommon, rare
    pub pickup_points: [u64; 3],
    /// Pickup lifetime (simulated seconds)
    pub pickup_ttl: f32,
    pub pickup_radius: f32,
    /// Pickups spawn at least this far from the walls
    pub pickup_inset: f32,

    /// Survival points per simulated second, credited as
    /// `floor(dt * rate)` each tick
    pub passive_score_rate: f32,
    /// Carry the fractional survival points between ticks instead of
    /// dropping them
    pub carry_passive_fraction: bool,
    /// Minimum host time between visible score updates (ms)
    pub score_sync_interval_ms: f64,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            base_spawn_interval: 0.9,
            hazard_size_min: 16.0,
            hazard_size_max: 42.0,
            hazard_speed_jitter_min: -10.0,
            hazard_speed_jitter_max: 20.0,
            spawn_clearance: 2.0,
            cull_margin: 200.0,

            pickup_chance: 0.35,
            pickup_weights: [0.6, 0.3, 0.1],
            pickup_points: [10, 25, 50],
            pickup_ttl: 6.0,
            pickup_radius: 9.0,
            pickup_inset: 20.0,

            passive_score_rate: 10.0,
            carry_passive_fraction: false,
            score_sync_interval_ms: 100.0,
        }
    }
}

impl Tuning {
    /// Repair out-of-range values so the simulation never sees them
    pub fn validated(mut self) -> Self {
        let defaults = Tuning::default();

        if !(self.base_spawn_interval.is_finite() && self.base_spawn_interval > 0.0) {
            log::warn!(
                "base_spawn_interval {} invalid, using {}",
                self.base_spawn_interval,
                defaults.base_spawn_interval
            );
            self.base_spawn_interval = defaults.base_spawn_interval;
        }

        if !(self.hazard_size_min.is_finite()
            && self.hazard_size_max.is_finite()
            && self.hazard_size_min > 0.0
            && self.hazard_size_max >= self.hazard_size_min)
        {
            log::warn!("hazard size range invalid, using defaults");
            self.hazard_size_min = defaults.hazard_size_min;
            self.hazard_size_max = defaults.hazard_size_max;
        }

        if !(self.hazard_speed_jitter_min.is_finite() && self.hazard_speed_jitter_max.is_finite()) {
            log::warn!("hazard speed jitter range not finite, using defaults");
            self.hazard_speed_jitter_min = defaults.hazard_speed_jitter_min;
            self.hazard_speed_jitter_max = defaults.hazard_speed_jitter_max;
        } else if self.hazard_speed_jitter_max < self.hazard_speed_jitter_min {
            log::warn!("hazard speed jitter range inverted, swapping");
            std::mem::swap(
                &mut self.hazard_speed_jitter_min,
                &mut self.hazard_speed_jitter_max,
            );
        }

        if !(0.0..=1.0).contains(&self.pickup_chance) {
            log::warn!("pickup_chance {} out of [0, 1], clamping", self.pickup_chance);
            self.pickup_chance = if self.pickup_chance.is_nan() {
                defaults.pickup_chance
            } else {
                self.pickup_chance.clamp(0.0, 1.0)
            };
        }

        let weights_ok = self.pickup_weights.iter().all(|w| w.is_finite() && *w >= 0.0)
            && self.pickup_weights.iter().sum::<f32>() > 0.0;
        if !weights_ok {
            log::warn!("pickup_weights {:?} invalid, using defaults", self.pickup_weights);
            self.pickup_weights = defaults.pickup_weights;
        }

        // Scalars: non-finite falls back to the default, negative clamps to 0
        let scalars: [(&str, &mut f32, f32); 6] = [
            ("spawn_clearance", &mut self.spawn_clearance, defaults.spawn_clearance),
            ("cull_margin", &mut self.cull_margin, defaults.cull_margin),
            ("pickup_ttl", &mut self.pickup_ttl, defaults.pickup_ttl),
            ("pickup_radius", &mut self.pickup_radius, defaults.pickup_radius),
            ("pickup_inset", &mut self.pickup_inset, defaults.pickup_inset),
            ("passive_score_rate", &mut self.passive_score_rate, defaults.passive_score_rate),
        ];
        for (name, value, default) in scalars {
            if !(*value).is_finite() {
                log::warn!("{} {} not finite, using {}", name, *value, default);
                *value = default;
            }
            *value = (*value).max(0.0);
        }

        if !self.score_sync_interval_ms.is_finite() {
            log::warn!(
                "score_sync_interval_ms {} not finite, using {}",
                self.score_sync_interval_ms,
                defaults.score_sync_interval_ms
            );
            self.score_sync_interval_ms = defaults.score_sync_interval_ms;
        }
        self.score_sync_interval_ms = self.score_sync_interval_ms.max(0.0);

        self
    }

    /// Weights rescaled to sum to 1
    pub fn normalized_pickup_weights(&self) -> [f32; 3] {
        let total: f32 = self.pickup_weights.iter().sum();
        if total <= 0.0 {
            return Tuning::default().pickup_weights;
        }
        self.pickup_weights.map(|w| w / total)
    }
}

/// Player preferences
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Last selected difficulty
    pub difficulty: Difficulty,
    /// Balance overrides
    pub tuning: Tuning,
}

impl Settings {
    /// LocalStorage key (used only in wasm32)
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "office_dodge_settings";

    /// Parse settings JSON; tuning is validated on the way in
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Settings = serde_json::from_str(json)?;
        settings.tuning = settings.tuning.validated();
        Ok(settings)
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                match Self::from_json(&json) {
                    Ok(settings) => {
                        log::info!("Loaded settings from LocalStorage");
                        return settings;
                    }
                    Err(e) => log::warn!("Stored settings unreadable ({}), using defaults", e),
                }
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::info!("Settings saved");
            }
        }
    }

    /// Load settings from the file named by `OFFICE_DODGE_SETTINGS`, if any
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let Ok(path) = std::env::var("OFFICE_DODGE_SETTINGS") else {
            return Self::default();
        };
        match std::fs::read_to_string(&path) {
            Ok(json) => match Self::from_json(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from {}", path);
                    settings
                }
                Err(e) => {
                    log::warn!("Settings file {} unreadable ({}), using defaults", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                log::warn!("Cannot read settings file {} ({}), using defaults", path, e);
                Self::default()
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
