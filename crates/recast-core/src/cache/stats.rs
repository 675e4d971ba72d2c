use serde::Serialize;

///
/// KeyCounters
///

#[derive(Clone, Copy, Debug, Default, Serialize)]
pub struct KeyCounters {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
}

///
/// KeyReport
///
/// Counters for one cache key, flattened to its reportable components.
///

#[derive(Clone, Debug, Serialize)]
pub struct KeyReport {
    pub resource_path: String,
    pub model: &'static str,
    pub resource_type: String,
    #[serde(flatten)]
    pub counters: KeyCounters,
}

///
/// CacheReport
///
/// Per-key scope statistics snapshot taken at scope end. Purely
/// observational.
///

#[derive(Clone, Debug, Default, Serialize)]
pub struct CacheReport {
    pub entries: Vec<KeyReport>,
}

impl CacheReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn total_hits(&self) -> u64 {
        self.entries.iter().map(|e| e.counters.hits).sum()
    }

    #[must_use]
    pub fn total_misses(&self) -> u64 {
        self.entries.iter().map(|e| e.counters.misses).sum()
    }
}
