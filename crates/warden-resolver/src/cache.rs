//! In-process TTL cache of resolved capability sets.
//!
//! # Purpose
//! Memoizes each principal's effective capability set for a bounded window so
//! repeated checks do not round-trip to the principal and grant stores.
//!
//! # Key invariants
//! - An entry read at `now` is returned only while `now <= expires_at` and,
//!   when the set includes an expiring grant, while `now` is before that
//!   grant's expiry.
//! - Expired entries are removed when read; there is no background sweeper, so
//!   memory is bounded by the principals queried within one TTL window.
//! - `set` always overwrites and restarts the TTL.
//! - A load that began before an `invalidate` or `clear` is never written back
//!   ([`ResolutionCache::load_ticket`] / [`ResolutionCache::set_if_current`]).
//!
//! # Concurrency
//! Entries live in a sharded [`DashMap`]; callers never hold a lock across
//! operations. Cached sets are shared behind an [`Arc`], so a hit does not
//! copy the set.
use crate::clock::Clock;
use crate::telemetry;
use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use warden_authz::{Capability, CapabilitySet, PrincipalId};

/// Default time-to-live for a cached resolution.
pub const DEFAULT_TTL: Duration = Duration::from_secs(5 * 60);

#[derive(Debug, Clone)]
struct CacheEntry {
    capabilities: Arc<CapabilitySet>,
    expires_at: DateTime<Utc>,
    // First instant at which a contributing grant is no longer active.
    stale_from: Option<DateTime<Utc>>,
}

impl CacheEntry {
    fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now <= self.expires_at && self.stale_from.is_none_or(|stale| now < stale)
    }

    fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        if !self.is_fresh_at(now) {
            return Duration::ZERO;
        }
        let until = match self.stale_from {
            Some(stale) => stale.min(self.expires_at),
            None => self.expires_at,
        };
        (until - now).to_std().unwrap_or(Duration::ZERO)
    }
}

/// Generation observed when a load started; see [`ResolutionCache::set_if_current`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Point-in-time view of the cache, for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entry_count: usize,
    pub entries: Vec<CacheEntryStats>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheEntryStats {
    pub principal_id: PrincipalId,
    pub capability_count: usize,
    /// Zero for entries that have expired but not yet been read.
    pub remaining_ttl: Duration,
}

#[derive(Debug)]
pub struct ResolutionCache {
    entries: DashMap<PrincipalId, CacheEntry>,
    generation: AtomicU64,
    clock: Arc<dyn Clock>,
    default_ttl: Duration,
}

impl ResolutionCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self::with_ttl(clock, DEFAULT_TTL)
    }

    pub fn with_ttl(clock: Arc<dyn Clock>, default_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            generation: AtomicU64::new(0),
            clock,
            default_ttl,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Cached capability set for `principal_id`, if present and unexpired.
    pub fn get(&self, principal_id: &PrincipalId) -> Option<Arc<CapabilitySet>> {
        let now = self.clock.now();
        {
            // Shard read guard must be released before any removal below.
            let entry = self.entries.get(principal_id)?;
            if entry.is_fresh_at(now) {
                return Some(entry.capabilities.clone());
            }
        }
        // Re-check under the write guard so a concurrent refresh survives.
        if self
            .entries
            .remove_if(principal_id, |_, entry| !entry.is_fresh_at(now))
            .is_some()
        {
            telemetry::record_cache_entries(self.entries.len());
        }
        None
    }

    /// `Some(held)` on a fresh hit, `None` when the entry is absent or expired.
    pub fn contains(&self, principal_id: &PrincipalId, capability: Capability) -> Option<bool> {
        self.get(principal_id)
            .map(|capabilities| capabilities.contains(&capability))
    }

    pub fn set(&self, principal_id: PrincipalId, capabilities: CapabilitySet, ttl: Duration) {
        let entry = self.entry(Arc::new(capabilities), ttl, None);
        self.entries.insert(principal_id, entry);
        telemetry::record_cache_entries(self.entries.len());
    }

    pub fn set_with_default_ttl(&self, principal_id: PrincipalId, capabilities: CapabilitySet) {
        self.set(principal_id, capabilities, self.default_ttl);
    }

    /// Take before reading the stores for a load that will end in
    /// [`ResolutionCache::set_if_current`].
    pub fn load_ticket(&self) -> LoadTicket {
        LoadTicket(self.generation.load(Ordering::SeqCst))
    }

    /// Caches a loaded set with the default TTL unless an `invalidate` or
    /// `clear` happened after `ticket` was taken. The entry also goes stale
    /// at `stale_from`, when given. Returns whether the set was cached.
    pub fn set_if_current(
        &self,
        ticket: LoadTicket,
        principal_id: PrincipalId,
        capabilities: Arc<CapabilitySet>,
        stale_from: Option<DateTime<Utc>>,
    ) -> bool {
        let entry = self.entry(capabilities, self.default_ttl, stale_from);
        // The shard write lock is held from the generation check to the insert;
        // `invalidate` bumps the generation before taking that lock to remove.
        let slot = self.entries.entry(principal_id);
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            return false;
        }
        slot.insert(entry);
        telemetry::record_cache_entries(self.entries.len());
        true
    }

    /// Drops the entry for `principal_id` and discards any load still in
    /// flight. Returns whether an entry was present.
    pub fn invalidate(&self, principal_id: &PrincipalId) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let removed = self.entries.remove(principal_id).is_some();
        if removed {
            telemetry::record_cache_entries(self.entries.len());
        }
        removed
    }

    pub fn clear(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.clear();
        telemetry::record_cache_entries(0);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        let now = self.clock.now();
        let mut entries: Vec<CacheEntryStats> = self
            .entries
            .iter()
            .map(|item| CacheEntryStats {
                principal_id: item.key().clone(),
                capability_count: item.capabilities.len(),
                remaining_ttl: item.remaining_at(now),
            })
            .collect();
        entries.sort_by(|a, b| a.principal_id.cmp(&b.principal_id));
        CacheStats {
            entry_count: entries.len(),
            entries,
        }
    }

    fn entry(
        &self,
        capabilities: Arc<CapabilitySet>,
        ttl: Duration,
        stale_from: Option<DateTime<Utc>>,
    ) -> CacheEntry {
        CacheEntry {
            capabilities,
            expires_at: expiry_after(self.clock.now(), ttl),
            stale_from,
        }
    }
}

fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> DateTime<Utc> {
    TimeDelta::from_std(ttl)
        .ok()
        .and_then(|ttl| now.checked_add_signed(ttl))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
