//! Engine observability.
//!
//! A sink receives discrete events; counters aggregate them for cheap
//! polling. Neither may influence resolution semantics.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

///
/// ResolveEvent
///

#[derive(Clone, Debug)]
pub enum ResolveEvent {
    /// A lookup produced a winning definition.
    LookupHit {
        path: String,
        model: &'static str,
    },
    /// No definition matched the resource's type chain.
    LookupMiss {
        path: String,
    },
    CacheHit {
        path: String,
        model: &'static str,
    },
    CacheMiss {
        path: String,
        model: &'static str,
    },
    MappingStarted {
        path: String,
        model: &'static str,
    },
    MappingFinished {
        path: String,
        model: &'static str,
    },
    ModelsRegistered {
        count: usize,
    },
    ModelsUnregistered {
        count: usize,
    },
}

///
/// EventSink
///
/// Receiver for engine events. Implementations must be cheap and must not
/// call back into the engine.
///

pub trait EventSink: Send + Sync {
    fn on_event(&self, event: ResolveEvent);
}

///
/// EngineMetrics
///
/// Monotonic counters, updated lock-free on the resolution path.
///

#[derive(Debug, Default)]
pub struct EngineMetrics {
    lookup_hits: AtomicU64,
    lookup_misses: AtomicU64,
    cache_hits: AtomicU64,
    cache_misses: AtomicU64,
    mappings: AtomicU64,
}

impl EngineMetrics {
    pub(crate) fn record_lookup_hit(&self) {
        self.lookup_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_lookup_miss(&self) {
        self.lookup_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_miss(&self) {
        self.cache_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_mapping(&self) {
        self.mappings.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> EngineCounters {
        EngineCounters {
            lookup_hits: self.lookup_hits.load(Ordering::Relaxed),
            lookup_misses: self.lookup_misses.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
            cache_misses: self.cache_misses.load(Ordering::Relaxed),
            mappings: self.mappings.load(Ordering::Relaxed),
        }
    }
}

///
/// EngineCounters
///
/// Point-in-time snapshot of [`EngineMetrics`].
///

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct EngineCounters {
    pub lookup_hits: u64,
    pub lookup_misses: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub mappings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshots_reflect_recorded_events() {
        let metrics = EngineMetrics::default();
        metrics.record_lookup_hit();
        metrics.record_cache_miss();
        metrics.record_mapping();
        metrics.record_mapping();

        let counters = metrics.snapshot();
        assert_eq!(counters.lookup_hits, 1);
        assert_eq!(counters.lookup_misses, 0);
        assert_eq!(counters.cache_misses, 1);
        assert_eq!(counters.mappings, 2);
    }
}
