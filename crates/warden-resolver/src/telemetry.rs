//! Metric names and recording helpers for the resolver hot path.
//!
//! Recording goes through the `metrics` facade; nothing is exported unless a
//! recorder is installed (see [`crate::observability::init_observability`]).

pub const CACHE_HITS_TOTAL: &str = "warden_cache_hits_total";
pub const CACHE_MISSES_TOTAL: &str = "warden_cache_misses_total";
pub const CACHE_ENTRIES: &str = "warden_cache_entries";
pub const STORE_FAILURES_TOTAL: &str = "warden_store_failures_total";

/// Which collaborator a failure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Principal,
    Grant,
}

impl StoreKind {
    pub fn as_str(self) -> &'static str {
        match self {
            StoreKind::Principal => "principal",
            StoreKind::Grant => "grant",
        }
    }
}

pub fn record_cache_hit() {
    metrics::counter!(CACHE_HITS_TOTAL).increment(1);
}

pub fn record_cache_miss() {
    metrics::counter!(CACHE_MISSES_TOTAL).increment(1);
}

pub fn record_cache_entries(count: usize) {
    metrics::gauge!(CACHE_ENTRIES).set(count as f64);
}

pub fn record_store_failure(store: StoreKind) {
    metrics::counter!(STORE_FAILURES_TOTAL, "store" => store.as_str()).increment(1);
}
