use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use chrono::DateTime;
use chrono::Duration;
use chrono::Utc;

use crate::clock::Clock;

/// Key-value cache with per-entry expiry. Last write wins; there is no
/// compare-and-swap.
pub trait CacheStore: Send + Sync {
    fn get(
        &self,
        key: &str,
    ) -> Option<String>;

    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    );
}

struct CacheEntry {
    value: String,
    expires_at: DateTime<Utc>,
}

pub struct MemoryCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    clock: Arc<dyn Clock>,
}

impl MemoryCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl CacheStore for MemoryCache {
    fn get(
        &self,
        key: &str,
    ) -> Option<String> {
        let now = self.clock.now();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        match entries.get(key) {
            Some(entry) if now < entry.expires_at => Some(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn set(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) {
        let expires_at = self.clock.now() + ttl;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), CacheEntry { value, expires_at });
    }
}
