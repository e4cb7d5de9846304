//! Decision cache keyed by a coarse situation fingerprint.

use std::time::Duration;

use serde::Serialize;

use hive_agent::{AgentSituation, LifeStage, ThreatLevel};
use hive_core::{Intent, Millis, Role};

#[cfg(feature = "fx-hash")]
type Map<K, V> = rustc_hash::FxHashMap<K, V>;
#[cfg(not(feature = "fx-hash"))]
type Map<K, V> = std::collections::HashMap<K, V>;

/// Width of one need bucket.
pub const NEED_BUCKET: f32 = 20.0;

/// Two situations with equal fingerprints get the same cached answer.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Fingerprint {
    pub role: Role,
    pub life_stage: LifeStage,
    pub hunger: u8,
    pub energy: u8,
    pub safety: u8,
    pub social: u8,
    pub threat: ThreatLevel,
}

#[inline]
fn bucket(need: f32) -> u8 {
    (need / NEED_BUCKET) as u8
}

impl Fingerprint {
    pub fn of(s: &AgentSituation) -> Self {
        Self {
            role:       s.role,
            life_stage: s.life_stage,
            hunger:     bucket(s.needs.hunger()),
            energy:     bucket(s.needs.energy()),
            safety:     bucket(s.needs.safety()),
            social:     bucket(s.needs.social()),
            threat:     s.threat,
        }
    }
}

#[derive(Copy, Clone, Debug)]
struct CacheEntry {
    intent: Intent,
    stored_at: Millis,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
}

/// TTL-bounded, capacity-bounded map from [`Fingerprint`] to intent.
///
/// An entry whose age has reached the TTL is treated as absent and is never
/// returned.  When full, inserting a new key evicts the oldest entry.
#[derive(Debug)]
pub struct DecisionCache {
    entries: Map<Fingerprint, CacheEntry>,
    ttl: Duration,
    capacity: usize,
    stats: CacheStats,
}

impl DecisionCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Map::default(),
            ttl,
            capacity: capacity.max(1),
            stats: CacheStats::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&mut self, key: &Fingerprint, now: Millis) -> Option<Intent> {
        match self.entries.get(key) {
            Some(e) if now.since(e.stored_at) < self.ttl => {
                self.stats.hits += 1;
                Some(e.intent)
            }
            Some(_) => {
                self.entries.remove(key);
                self.stats.misses += 1;
                None
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: Fingerprint, intent: Intent, now: Millis) {
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            self.evict_oldest();
        }
        self.entries.insert(key, CacheEntry { intent, stored_at: now });
    }

    fn evict_oldest(&mut self) {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|(_, e)| e.stored_at)
            .map(|(k, _)| *k);
        if let Some(k) = oldest {
            self.entries.remove(&k);
            self.stats.evictions += 1;
        }
    }

    /// Drop entries past their TTL; returns how many went.
    pub fn purge_expired(&mut self, now: Millis) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries.retain(|_, e| now.since(e.stored_at) < ttl);
        let dropped = before - self.entries.len();
        self.stats.evictions += dropped as u64;
        dropped
    }

    /// Drop everything and release the table's memory.
    pub fn evict_all(&mut self) -> usize {
        let dropped = self.entries.len();
        self.entries = Map::default();
        self.stats.evictions += dropped as u64;
        dropped
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats { entries: self.entries.len(), ..self.stats }
    }
}
