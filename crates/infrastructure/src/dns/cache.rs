//! In-memory response cache keyed by question fingerprint.
//!
//! Readers dominate (every query starts with a lookup), writers are rare
//! (resolution misses and the sweeper), so the map sits behind a single
//! shared-exclusive lock rather than anything sharded.

use oxidns_domain::{Message, RecordType};
use rustc_hash::FxHashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use tracing::debug;

/// Upper bound on an entry's lifetime, whatever the records claim.
const MAX_CACHE_TTL: Duration = Duration::from_secs(3600);

pub struct CacheKey;

impl CacheKey {
    /// The fingerprint `"<name>:<type-number>"` of a single question.
    pub fn fingerprint(domain: &str, qtype: RecordType) -> String {
        format!("{}:{}", domain, qtype.to_u16())
    }
}

struct CacheEntry {
    message: Message,
    expires_at: Instant,
}

#[derive(Default)]
pub struct MessageCache {
    entries: RwLock<FxHashMap<String, CacheEntry>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached message when the entry exists and has not
    /// expired yet.
    pub fn get(&self, key: &str) -> Option<Message> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        let entry = entries.get(key)?;
        if Instant::now() > entry.expires_at {
            return None;
        }
        Some(entry.message.clone())
    }

    /// Stores a response under `key` for the minimum answer TTL, capped at
    /// one hour. Responses with no answers or a zero minimum TTL are not
    /// cached.
    pub fn put(&self, key: &str, message: &Message) {
        if message.answers.is_empty() {
            return;
        }

        let min_ttl = match message.min_answer_ttl() {
            Some(ttl) if ttl > 0 => ttl,
            _ => return,
        };

        let lifetime = Duration::from_secs(u64::from(min_ttl)).min(MAX_CACHE_TTL);

        let stored = match message.deep_copy() {
            Ok(copy) => copy,
            Err(e) => {
                debug!(key = %key, error = %e, "Not caching response that failed to copy");
                return;
            }
        };

        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            CacheEntry {
                message: stored,
                expires_at: Instant::now() + lifetime,
            },
        );

        debug!(key = %key, ttl_secs = lifetime.as_secs(), "Cached DNS response");
    }

    /// Removes every expired entry, returning how many were dropped.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(|e| e.into_inner());
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|key, entry| {
            let keep = entry.expires_at > now;
            if !keep {
                debug!(key = %key, "Removed expired cache entry");
            }
            keep
        });
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Time left before `key` expires, if the entry exists and is live.
    pub fn remaining_ttl(&self, key: &str) -> Option<Duration> {
        let entries = self.entries.read().unwrap_or_else(|e| e.into_inner());
        entries
            .get(key)
            .and_then(|entry| entry.expires_at.checked_duration_since(Instant::now()))
    }
}
