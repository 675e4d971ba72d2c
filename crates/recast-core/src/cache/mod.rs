//! Request-scoped result caching.
//!
//! Keys are structural; no cache ever invalidates on content change. The
//! per-request scope bounds staleness to a single request, which is the
//! consistency model callers opt into by enabling caching at all.

mod request;
mod stats;

pub use request::{RequestScope, RequestState};
pub use stats::{CacheReport, KeyCounters, KeyReport};

use crate::resource::{ResolverId, ResourceType};
use std::{
    any::{Any, TypeId},
    sync::{Arc, PoisonError, RwLock},
};

///
/// CacheMode
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum CacheMode {
    /// Key on the resource and model alone.
    #[default]
    Fast,
    /// Additionally key on the request state at access time.
    Safe,
}

///
/// CacheConfig
///

#[derive(Clone, Copy, Debug)]
pub struct CacheConfig {
    pub enabled: bool,
    pub mode: CacheMode,
    /// Collect per-key counters for scope-end reports.
    pub statistics: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: CacheMode::Fast,
            statistics: false,
        }
    }
}

///
/// CacheTarget
///
/// What an entry answers: a typed adaptation to one model, or an untyped
/// discovery under a set of query flags. Discovery outcomes depend on the
/// flags, so each flag combination keys its own entry.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum CacheTarget {
    Model {
        id: TypeId,
        /// Redundant with `id`; carried for reports and diagnostics.
        name: &'static str,
    },
    Discovery {
        include_base_types: bool,
        name: Option<String>,
    },
}

impl CacheTarget {
    /// Display label for reports and events.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Model { name, .. } => *name,
            Self::Discovery { .. } => "(discovery)",
        }
    }
}

///
/// CacheKey
///
/// Structural identity of one adaptation result. Two resources with equal
/// paths from different resolver sessions never share an entry.
///

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct CacheKey {
    pub resource_path: String,
    pub target: CacheTarget,
    pub resource_type: ResourceType,
    pub resolver: ResolverId,
}

/// A cached adaptation outcome. `None` marks "this resource has no such
/// model", so misses are not recomputed within a scope.
pub type CachedModel = Option<Arc<dyn Any + Send + Sync>>;

///
/// ModelCache
///
/// A cache backend. `get` returning `None` is abstention; `Some(None)` is a
/// cached negative result. Backends must never error.
///

pub trait ModelCache: Send + Sync {
    fn get(&self, key: &CacheKey) -> Option<CachedModel>;

    fn put(&self, key: &CacheKey, value: CachedModel);
}

///
/// ModelCaches
///
/// Composite over the per-request scope and any engine-wide backends. The
/// scope is consulted first; among the bound backends no lookup order is
/// guaranteed.
///

#[derive(Default)]
pub struct ModelCaches {
    backends: RwLock<Vec<Arc<dyn ModelCache>>>,
}

impl ModelCaches {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&self, backend: Arc<dyn ModelCache>) {
        self.backends
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(backend);
    }

    /// Remove a backend by identity. Returns whether it was bound.
    pub fn unbind(&self, backend: &Arc<dyn ModelCache>) -> bool {
        let mut backends = self
            .backends
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = backends.len();
        backends.retain(|bound| !Arc::ptr_eq(bound, backend));
        backends.len() != before
    }

    #[must_use]
    pub fn lookup(&self, scope: &RequestScope, key: &CacheKey) -> Option<CachedModel> {
        if let Some(entry) = scope.get(key) {
            return Some(entry);
        }
        self.backends
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find_map(|backend| backend.get(key))
    }

    pub fn store(&self, scope: &RequestScope, key: &CacheKey, value: &CachedModel) {
        scope.put(key, value.clone());
        for backend in self
            .backends
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
        {
            backend.put(key, value.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{collections::HashMap, sync::Mutex};

    struct Marker;

    struct MapBackend {
        entries: Mutex<HashMap<CacheKey, CachedModel>>,
    }

    impl MapBackend {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                entries: Mutex::new(HashMap::new()),
            })
        }
    }

    impl ModelCache for MapBackend {
        fn get(&self, key: &CacheKey) -> Option<CachedModel> {
            self.entries.lock().unwrap().get(key).cloned()
        }

        fn put(&self, key: &CacheKey, value: CachedModel) {
            self.entries.lock().unwrap().insert(key.clone(), value);
        }
    }

    fn key() -> CacheKey {
        CacheKey {
            resource_path: "/content/a".to_string(),
            target: CacheTarget::Model {
                id: TypeId::of::<Marker>(),
                name: "Marker",
            },
            resource_type: ResourceType::from("app/thing"),
            resolver: ResolverId::new(1),
        }
    }

    fn scope() -> RequestScope {
        RequestScope::new(CacheConfig::default(), RequestState::for_path("/content/a"))
    }

    #[test]
    fn stores_reach_the_scope_and_every_backend() {
        let caches = ModelCaches::new();
        let first = MapBackend::new();
        let second = MapBackend::new();
        caches.bind(Arc::clone(&first) as Arc<dyn ModelCache>);
        caches.bind(Arc::clone(&second) as Arc<dyn ModelCache>);

        let scope = scope();
        let key = key();
        caches.store(&scope, &key, &None);

        assert!(first.get(&key).is_some());
        assert!(second.get(&key).is_some());
        assert!(scope.get(&key).is_some());
    }

    #[test]
    fn scope_entries_win_over_backends() {
        let caches = ModelCaches::new();
        let backend = MapBackend::new();
        backend.put(&key(), Some(Arc::new(Marker) as Arc<dyn Any + Send + Sync>));
        caches.bind(backend as Arc<dyn ModelCache>);

        let scope = scope();
        scope.put(&key(), None);

        let entry = caches.lookup(&scope, &key());
        assert!(entry.is_some_and(|cached| cached.is_none()));
    }

    #[test]
    fn unbinding_removes_exactly_the_given_backend() {
        let caches = ModelCaches::new();
        let backend = MapBackend::new() as Arc<dyn ModelCache>;
        caches.bind(Arc::clone(&backend));

        assert!(caches.unbind(&backend));
        assert!(!caches.unbind(&backend));
        assert!(caches.lookup(&scope(), &key()).is_none());
    }
}
