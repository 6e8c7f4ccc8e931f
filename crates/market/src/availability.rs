use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// Process-wide temporary blacklist of failing providers.
///
/// The fallback router marks a provider here whenever an adapter call fails,
/// and consults it before every dispatch attempt. Entries expire lazily at
/// read time; nothing sweeps the map. Last writer wins on the expiry
/// timestamp — staleness only means a doomed provider gets retried a few
/// milliseconds early.
#[derive(Debug, Default)]
pub struct AvailabilityMap {
    entries: RwLock<HashMap<String, Instant>>,
}

impl AvailabilityMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `code` unavailable for `ttl` from now.
    pub fn mark_unavailable(&self, code: &str, ttl: Duration) {
        let expiry = Instant::now() + ttl;
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(code.to_string(), expiry);
    }

    /// Whether `code` may be dispatched to. Never performs I/O.
    pub fn is_available(&self, code: &str) -> bool {
        let now = Instant::now();
        {
            let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
            match entries.get(code) {
                None => return true,
                Some(&expiry) if expiry > now => return false,
                Some(_) => {}
            }
        }
        // TTL elapsed — drop the stale entry.
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(code);
        true
    }

    /// Remaining blacklist time for `code`, if any.
    pub fn remaining(&self, code: &str) -> Option<Duration> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(code)
            .and_then(|expiry| expiry.checked_duration_since(Instant::now()))
    }

    /// Clear the entry for `code`, re-enabling it immediately.
    pub fn clear(&self, code: &str) {
        self.entries
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(code);
    }
}
