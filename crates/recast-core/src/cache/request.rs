use crate::cache::{
    CacheConfig, CacheKey, CacheMode, CacheReport, CachedModel, KeyCounters, KeyReport,
    ModelCache,
};
use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError, RwLock},
};
use xxhash_rust::xxh3::Xxh3;

/// Content-node boundary marker; request state is keyed by the page, not by
/// the content node actually rendered.
const CONTENT_BOUNDARY: &str = "/jcr:content";

///
/// RequestState
///
/// The request components that can change what a mapping produces. In safe
/// mode their fingerprint is part of every cache key, so a mutation after a
/// store turns later lookups into misses.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RequestState {
    pub page_path: String,
    pub selectors: Vec<String>,
    pub extension: String,
    pub suffix: String,
    pub query_string: String,
}

impl RequestState {
    /// State for a request against the given content path. The path is
    /// truncated at the content-node boundary.
    #[must_use]
    pub fn for_path(path: &str) -> Self {
        let page_path = path
            .split_once(CONTENT_BOUNDARY)
            .map_or(path, |(page, _)| page)
            .to_string();
        Self {
            page_path,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_selectors(mut self, selectors: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.selectors = selectors.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    #[must_use]
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    #[must_use]
    pub fn with_query_string(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = query_string.into();
        self
    }

    fn fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.update(self.page_path.as_bytes());
        hasher.update(&[0]);
        for selector in &self.selectors {
            hasher.update(selector.as_bytes());
            hasher.update(&[0]);
        }
        hasher.update(&[0]);
        hasher.update(self.extension.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.suffix.as_bytes());
        hasher.update(&[0]);
        hasher.update(self.query_string.as_bytes());
        hasher.digest()
    }
}

#[derive(Clone, Eq, Hash, PartialEq)]
struct ScopedKey {
    key: CacheKey,
    /// Request-state fingerprint in safe mode, `None` in fast mode.
    state: Option<u64>,
}

///
/// RequestScope
///
/// The per-request cache backend. One scope exists per request; dropping it
/// discards every entry. State mutations never invalidate entries in fast
/// mode and always do in safe mode.
///

pub struct RequestScope {
    config: CacheConfig,
    state: RwLock<RequestState>,
    entries: Mutex<HashMap<ScopedKey, CachedModel>>,
    stats: Mutex<HashMap<CacheKey, KeyCounters>>,
}

impl RequestScope {
    #[must_use]
    pub fn new(config: CacheConfig, state: RequestState) -> Self {
        Self {
            config,
            state: RwLock::new(state),
            entries: Mutex::new(HashMap::new()),
            stats: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    pub fn set_selectors(&self, selectors: impl IntoIterator<Item = impl Into<String>>) {
        self.write_state()
            .selectors = selectors.into_iter().map(Into::into).collect();
    }

    pub fn set_extension(&self, extension: impl Into<String>) {
        self.write_state().extension = extension.into();
    }

    pub fn set_suffix(&self, suffix: impl Into<String>) {
        self.write_state().suffix = suffix.into();
    }

    pub fn set_query_string(&self, query_string: impl Into<String>) {
        self.write_state().query_string = query_string.into();
    }

    pub fn set_page_path(&self, path: &str) {
        self.write_state().page_path = RequestState::for_path(path).page_path;
    }

    /// Per-key statistics collected so far. Empty unless statistics are
    /// enabled in the configuration.
    #[must_use]
    pub fn report(&self) -> CacheReport {
        let stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        let mut entries: Vec<KeyReport> = stats
            .iter()
            .map(|(key, counters)| KeyReport {
                resource_path: key.resource_path.clone(),
                model: key.target.label(),
                resource_type: key.resource_type.to_string(),
                counters: *counters,
            })
            .collect();
        entries.sort_by(|a, b| a.resource_path.cmp(&b.resource_path));
        CacheReport { entries }
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.stats
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn scoped(&self, key: &CacheKey) -> ScopedKey {
        let state = match self.config.mode {
            CacheMode::Fast => None,
            CacheMode::Safe => Some(
                self.state
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .fingerprint(),
            ),
        };
        ScopedKey {
            key: key.clone(),
            state,
        }
    }

    fn record(&self, key: &CacheKey, update: fn(&mut KeyCounters)) {
        if !self.config.statistics {
            return;
        }
        let mut stats = self.stats.lock().unwrap_or_else(PoisonError::into_inner);
        update(stats.entry(key.clone()).or_default());
    }

    fn write_state(&self) -> std::sync::RwLockWriteGuard<'_, RequestState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ModelCache for RequestScope {
    fn get(&self, key: &CacheKey) -> Option<CachedModel> {
        if !self.config.enabled {
            return None;
        }
        let scoped = self.scoped(key);
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let found = entries.get(&scoped).cloned();
        match found {
            Some(_) => self.record(key, |c| c.hits += 1),
            None => self.record(key, |c| c.misses += 1),
        }
        found
    }

    fn put(&self, key: &CacheKey, value: CachedModel) {
        if !self.config.enabled {
            return;
        }
        let scoped = self.scoped(key);
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(scoped, value);
        self.record(key, |c| c.writes += 1);
    }
}
