//! Best-score persistence gateway
//!
//! The core only needs `get`/`set` on a string key. Stores hand back the raw
//! stored text; interpreting it (and shrugging off garbage) is done here so
//! every backend behaves the same.

use std::collections::HashMap;

/// Key/value storage for scores
pub trait ScoreStore {
    /// Raw stored value, if any
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: u64);
}

/// Interpret a stored best score. Absent, non-numeric, negative or
/// non-finite values all read as 0.
pub fn parse_score(raw: Option<&str>) -> u64 {
    let Some(raw) = raw else {
        return 0;
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v >= 0.0 => v.floor() as u64,
        _ => {
            log::warn!("Ignoring corrupt stored score {:?}", raw);
            0
        }
    }
}

/// Read the best score for `key` through a store
pub fn load_best(store: &dyn ScoreStore, key: &str) -> u64 {
    parse_score(store.get(key).as_deref())
}

/// In-process store (native builds and tests)
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
    /// Number of `set` calls, for observing write frequency
    pub writes: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a raw value, bypassing number formatting
    pub fn with_raw(mut self, key: &str, raw: &str) -> Self {
        self.values.insert(key.to_string(), raw.to_string());
        self
    }
}

impl ScoreStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: u64) {
        self.values.insert(key.to_string(), value.to_string());
        self.writes += 1;
    }
}

/// Browser LocalStorage (WASM only)
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    fn storage() -> Option<web_sys::Storage> {
        web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten()
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        Self::storage()?.get_item(key).ok()?
    }

    fn set(&mut self, key: &str, value: u64) {
        if let Some(storage) = Self::storage() {
            if storage.set_item(key, &value.to_string()).is_err() {
                log::warn!("Could not write {} to LocalStorage", key);
            }
        }
    }
}
