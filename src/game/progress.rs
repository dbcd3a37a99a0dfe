// Persisted player progress
//
// Exactly two integers survive between runs: how many levels are
// unlocked and the best survival score. Anything missing or failing in
// the store degrades to the defaults; persistence never takes the game
// down.

use log::warn;

use crate::engine::services::ScoreStore;

pub const KEY_UNLOCKED: &str = "unlocked_levels";
pub const KEY_HIGH_SCORE: &str = "high_score";

/// The first level is always playable
const DEFAULT_UNLOCKED: i64 = 1;

/// Player progress backed by a score store
pub struct Progress {
    store: Box<dyn ScoreStore>,
}

impl Progress {
    pub fn new(store: Box<dyn ScoreStore>) -> Self {
        Self { store }
    }

    /// Highest unlocked level (at least 1)
    pub fn unlocked(&self) -> u32 {
        self.store
            .read_int(KEY_UNLOCKED)
            .unwrap_or(DEFAULT_UNLOCKED)
            .max(DEFAULT_UNLOCKED) as u32
    }

    /// Unlock every level up to and including `level`
    pub fn unlock_through(&mut self, level: u32) {
        if level > self.unlocked() {
            if let Err(err) = self.store.write_int(KEY_UNLOCKED, level as i64) {
                warn!("could not persist unlocked levels: {err}");
            }
        }
    }

    /// Best survival score so far (0 when nothing is stored)
    pub fn high_score(&self) -> i64 {
        self.store.read_int(KEY_HIGH_SCORE).unwrap_or(0)
    }

    /// Record a score; returns true when it beats the stored best
    pub fn record_score(&mut self, score: i64) -> bool {
        if score <= self.high_score() {
            return false;
        }
        if let Err(err) = self.store.write_int(KEY_HIGH_SCORE, score) {
            warn!("could not persist high score: {err}");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::services::{MemoryStore, StoreError};

    #[test]
    fn test_cold_store_uses_defaults() {
        let progress = Progress::new(Box::<MemoryStore>::default());
        assert_eq!(progress.unlocked(), 1);
        assert_eq!(progress.high_score(), 0);
    }

    #[test]
    fn test_unlock_is_monotonic() {
        let mut progress = Progress::new(Box::<MemoryStore>::default());
        progress.unlock_through(4);
        assert_eq!(progress.unlocked(), 4);
        progress.unlock_through(2);
        assert_eq!(progress.unlocked(), 4);
    }

    #[test]
    fn test_record_score_keeps_best() {
        let mut progress = Progress::new(Box::<MemoryStore>::default());
        assert!(progress.record_score(120));
        assert!(!progress.record_score(80));
        assert_eq!(progress.high_score(), 120);
    }

    /// A store that always fails writes
    struct BrokenStore;

    impl ScoreStore for BrokenStore {
        fn read_int(&self, _key: &str) -> Option<i64> {
            None
        }
        fn write_int(&mut self, _key: &str, _value: i64) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("no backing file".to_string()))
        }
    }

    #[test]
    fn test_store_failure_is_not_fatal() {
        let mut progress = Progress::new(Box::new(BrokenStore));
        progress.unlock_through(3);
        assert!(progress.record_score(50));
        // nothing persisted, but nothing crashed either
        assert_eq!(progress.unlocked(), 1);
        assert_eq!(progress.high_score(), 0);
    }
}
