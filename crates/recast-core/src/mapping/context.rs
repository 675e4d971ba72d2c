use crate::{
    cache::RequestScope,
    engine::Engine,
    error::ResolveError,
    model::ResourceModel,
    resource::ResourceRef,
};
use std::{
    any::TypeId,
    collections::HashSet,
    sync::{Arc, Mutex, PoisonError},
};

///
/// MappingContext
///
/// Everything a mapping in flight carries: the engine, the request scope the
/// results are cached under, and the set of mappings currently on the stack.
/// Cloning is cheap; deferred holders keep a clone so they can evaluate
/// after the originating call returned.
///

#[derive(Clone)]
pub struct MappingContext {
    engine: Arc<Engine>,
    scope: Arc<RequestScope>,
    in_progress: Arc<Mutex<HashSet<(String, TypeId)>>>,
}

impl MappingContext {
    pub(crate) fn root(engine: Arc<Engine>, scope: Arc<RequestScope>) -> Self {
        Self {
            engine,
            scope,
            in_progress: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    /// Adapt another resource within this context. A mapping already in
    /// flight for the same resource and model yields `Ok(None)` instead of
    /// recursing, so cyclic references terminate.
    pub fn adapt<M: ResourceModel>(
        &self,
        resource: &ResourceRef,
    ) -> Result<Option<Arc<M>>, ResolveError> {
        self.engine.adapt_in::<M>(resource, self)
    }

    #[must_use]
    pub fn scope(&self) -> &Arc<RequestScope> {
        &self.scope
    }

    /// Mark a mapping as in flight. Returns `false` if it already is.
    pub(crate) fn begin(&self, path: &str, model: TypeId) -> bool {
        self.in_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((path.to_string(), model))
    }

    pub(crate) fn end(&self, path: &str, model: TypeId) {
        self.in_progress
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(path.to_string(), model));
    }
}
