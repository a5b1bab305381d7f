//! core/playlist/validity.rs
//! Time-bounded memo of "does this path still resolve".
//!
//! Callers pass `now` explicitly; expired entries read as absent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy)]
struct Entry {
    valid: bool,
    checked_at: Instant,
}

#[derive(Debug)]
pub struct ValidityCache {
    ttl: Duration,
    entries: HashMap<String, Entry>,
}

impl ValidityCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn lookup(&self, path: &str, now: Instant) -> Option<bool> {
        let entry = self.entries.get(path)?;
        let age = now.saturating_duration_since(entry.checked_at);
        (age < self.ttl).then_some(entry.valid)
    }

    pub fn record(&mut self, path: &str, valid: bool, now: Instant) {
        self.entries.insert(
            path.to_string(),
            Entry {
                valid,
                checked_at: now,
            },
        );
    }

    /// Drop everything older than the TTL.
    pub fn purge_expired(&mut self, now: Instant) {
        let ttl = self.ttl;
        self.entries
            .retain(|_, e| now.saturating_duration_since(e.checked_at) < ttl);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(3600);

    #[test]
    fn fresh_entries_hit() {
        let mut cache = ValidityCache::new(TTL);
        let t0 = Instant::now();
        cache.record("/a", false, t0);

        assert_eq!(cache.lookup("/a", t0), Some(false));
        assert_eq!(cache.lookup("/a", t0 + Duration::from_secs(3599)), Some(false));
        assert_eq!(cache.lookup("/b", t0), None);
    }

    #[test]
    fn expired_entries_read_as_absent() {
        let mut cache = ValidityCache::new(TTL);
        let t0 = Instant::now();
        cache.record("/a", true, t0);

        assert_eq!(cache.lookup("/a", t0 + TTL), None);

        cache.purge_expired(t0 + TTL);
        assert_eq!(cache.len(), 0);
    }
}
