//! Scoring: a precise internal score and a throttled copy for the host UI
//!
//! The internal score changes every tick. Hosts that rebuild UI on every
//! change only need the visible score, which is synced at most once per
//! `sync_interval_ms` of host time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreAccumulator {
    internal: u64,
    visible: u64,
    best: u64,
    /// Fractional survival points not yet credited
    passive_carry: f32,
    sync_interval_ms: f64,
    last_sync_ms: Option<f64>,
}

impl ScoreAccumulator {
    pub fn new(best: u64, sync_interval_ms: f64) -> Self {
        Self {
            internal: 0,
            visible: 0,
            best,
            passive_carry: 0.0,
            sync_interval_ms,
            last_sync_ms: None,
        }
    }

    pub fn internal(&self) -> u64 {
        self.internal
    }

    pub fn visible(&self) -> u64 {
        self.visible
    }

    pub fn best(&self) -> u64 {
        self.best
    }

    /// Credit survival time: `floor(dt * rate)` whole points this tick. The
    /// fraction is dropped, so short ticks at low rates earn nothing.
    pub fn add_passive(&mut self, dt: f32, rate: f32) {
        self.internal += (dt * rate).max(0.0).floor() as u64;
    }

    /// Like [`ScoreAccumulator::add_passive`], but the fraction carries over
    /// to later ticks.
    pub fn add_passive_carried(&mut self, dt: f32, rate: f32) {
        self.passive_carry += (dt * rate).max(0.0);
        let whole = self.passive_carry.floor();
        self.passive_carry -= whole;
        self.internal += whole as u64;
    }

    pub fn add_points(&mut self, points: u64) {
        self.internal += points;
    }

    /// Copy internal to visible if the throttle allows. Returns true on sync.
    pub fn sync(&mut self, now_ms: f64) -> bool {
        let due = match self.last_sync_ms {
            None => true,
            Some(last) => now_ms - last > self.sync_interval_ms,
        };
        if due {
            self.force_sync(now_ms);
        }
        due
    }

    pub fn force_sync(&mut self, now_ms: f64) {
        self.last_sync_ms = Some(now_ms);
        self.visible = self.internal;
    }

    /// Close out a run: best becomes `max(best, internal)` and is returned
    /// for the caller to persist.
    pub fn finish(&mut self) -> u64 {
        self.best = self.best.max(self.internal);
        self.best
    }

    /// Zero the run's score; best is kept
    pub fn reset(&mut self) {
        self.internal = 0;
        self.visible = 0;
        self.passive_carry = 0.0;
        self.last_sync_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passive_floors_each_tick() {
        let mut score = ScoreAccumulator::new(0, 100.0);
        // 0.016 * 10 = 0.16 per tick, floored away every time
        for _ in 0..60 {
            score.add_passive(0.016, 10.0);
        }
        assert_eq!(score.internal(), 0);

        // Long steps still earn whole points
        score.add_passive(0.25, 10.0);
        assert_eq!(score.internal(), 2);
        score.add_passive(0.016, -5.0);
        assert_eq!(score.internal(), 2);
    }

    #[test]
    fn test_passive_carried_fraction() {
        let mut score = ScoreAccumulator::new(0, 100.0);
        // A whole point every ~6.25 ticks
        for _ in 0..6 {
            score.add_passive_carried(0.016, 10.0);
        }
        assert_eq!(score.internal(), 0);
        score.add_passive_carried(0.016, 10.0);
        assert_eq!(score.internal(), 1);

        let mut score = ScoreAccumulator::new(0, 100.0);
        for _ in 0..125 {
            score.add_passive_carried(0.008, 10.0);
        }
        assert!((9..=10).contains(&score.internal()));
    }

    #[test]
    fn test_sync_throttled() {
        let mut score = ScoreAccumulator::new(0, 100.0);
        score.add_points(10);
        assert!(score.sync(1_000.0));
        assert_eq!(score.visible(), 10);

        score.add_points(25);
        assert!(!score.sync(1_050.0));
        assert!(!score.sync(1_100.0));
        assert_eq!(score.visible(), 10);
        assert_eq!(score.internal(), 35);

        assert!(score.sync(1_100.5));
        assert_eq!(score.visible(), 35);
    }

    #[test]
    fn test_finish_keeps_max() {
        let mut score = ScoreAccumulator::new(40, 100.0);
        score.add_points(25);
        assert_eq!(score.finish(), 40);
        score.reset();
        score.add_points(50);
        assert_eq!(score.finish(), 50);
        assert_eq!(score.best(), 50);
        score.reset();
        assert_eq!(score.internal(), 0);
        assert_eq!(score.visible(), 0);
        assert_eq!(score.best(), 50);
    }
}
