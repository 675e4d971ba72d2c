//! The adaptation engine: the single entry point a host wires up and calls.
//!
//! `adapt` is the typed surface: a miss is `Ok(None)`, an ambiguous winning
//! level is an error. The `resolve_most_specific_*` variants are the
//! discovery surface: any result cardinality other than one collapses to
//! `Ok(None)`, since the caller asked "what maps here", not "give me this
//! model".

use crate::{
    cache::{
        CacheConfig, CacheKey, CacheReport, CacheTarget, ModelCache, ModelCaches, RequestScope,
        RequestState,
    },
    error::{RegistrationError, ResolveError},
    mapping::{CustomFieldProcessor, FieldProcessors, Mapper, MappingContext, ModelProcessor},
    model::{PlaceholderResolver, PlaceholderResolvers, ResourceModel},
    obs::{EngineCounters, EngineMetrics, EventSink, ResolveEvent},
    registry::{LookupQuery, ModelDefinition, ModelRegistry, ProviderId},
    resource::{ResourceRef, StaticTypeHierarchy, TypeHierarchy, type_chain},
};
use std::{
    any::{Any, TypeId},
    sync::Arc,
};

///
/// Engine
///

pub struct Engine {
    registry: ModelRegistry,
    hierarchy: Arc<dyn TypeHierarchy>,
    mapper: Mapper,
    processors: Arc<FieldProcessors>,
    caches: ModelCaches,
    cache_config: CacheConfig,
    metrics: EngineMetrics,
    sink: Option<Arc<dyn EventSink>>,
}

impl Engine {
    #[must_use]
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Register model definitions. Each model is first checked against the
    /// registered field processors; a conflict rejects the whole batch.
    pub fn register_models(
        &self,
        definitions: Vec<ModelDefinition>,
    ) -> Result<(), RegistrationError> {
        for definition in &definitions {
            self.processors.check_model(definition.model)?;
        }
        let count = definitions.len();
        self.registry.register(definitions);
        self.emit(|| ResolveEvent::ModelsRegistered { count });
        Ok(())
    }

    /// Remove every definition of the provider. Returns how many were
    /// removed.
    pub fn unregister_models(&self, provider: ProviderId) -> usize {
        let count = self.registry.unregister(provider);
        if count > 0 {
            self.emit(|| ResolveEvent::ModelsUnregistered { count });
        }
        count
    }

    /// Register a field processor, checking it for conflicts against every
    /// currently registered model.
    pub fn register_field_processor(
        &self,
        processor: Arc<dyn CustomFieldProcessor>,
    ) -> Result<(), RegistrationError> {
        self.processors
            .register(processor, &self.registry.definitions())
    }

    pub fn unregister_field_processor(&self, name: &str) -> bool {
        self.processors.unregister(name)
    }

    pub fn bind_cache(&self, backend: Arc<dyn ModelCache>) {
        self.caches.bind(backend);
    }

    pub fn unbind_cache(&self, backend: &Arc<dyn ModelCache>) -> bool {
        self.caches.unbind(backend)
    }

    /// Open a request scope. The scope is the default cache backend for
    /// every adaptation passed it.
    #[must_use]
    pub fn begin_scope(&self, state: RequestState) -> Arc<RequestScope> {
        Arc::new(RequestScope::new(self.cache_config, state))
    }

    /// Close a request scope: take its statistics report and discard its
    /// entries.
    pub fn finish_scope(&self, scope: &RequestScope) -> CacheReport {
        let report = scope.report();
        scope.clear();
        report
    }

    #[must_use]
    pub fn counters(&self) -> EngineCounters {
        self.metrics.snapshot()
    }

    /// Adapt a resource into the model type `M`.
    ///
    /// The most specific matching definition for `M` wins; no matching
    /// definition is `Ok(None)` and the miss is cached negatively within
    /// the scope. More than one definition of `M` at the winning level is
    /// an ambiguity error.
    pub fn adapt<M: ResourceModel>(
        self: &Arc<Self>,
        resource: &ResourceRef,
        scope: &Arc<RequestScope>,
    ) -> Result<Option<Arc<M>>, ResolveError> {
        let ctx = MappingContext::root(Arc::clone(self), Arc::clone(scope));
        self.adapt_in::<M>(resource, &ctx)
    }

    pub(crate) fn adapt_in<M: ResourceModel>(
        self: &Arc<Self>,
        resource: &ResourceRef,
        ctx: &MappingContext,
    ) -> Result<Option<Arc<M>>, ResolveError> {
        let key = Self::key_for(resource, TypeId::of::<M>(), M::SPEC.type_name);
        if let Some(entry) = self.caches.lookup(ctx.scope(), &key) {
            self.metrics.record_cache_hit();
            self.emit(|| ResolveEvent::CacheHit {
                path: resource.path().to_string(),
                model: M::SPEC.type_name,
            });
            return Ok(entry.and_then(|model| model.downcast::<M>().ok()));
        }
        self.metrics.record_cache_miss();
        self.emit(|| ResolveEvent::CacheMiss {
            path: resource.path().to_string(),
            model: M::SPEC.type_name,
        });

        let chain = type_chain(self.hierarchy.as_ref(), resource.resource_type());
        let results = self.registry.lookup_most_specific(&LookupQuery {
            chain: &chain,
            include_base_types: true,
            name: None,
            model: Some(TypeId::of::<M>()),
        });
        match results.as_slice() {
            [] => {
                self.metrics.record_lookup_miss();
                self.emit(|| ResolveEvent::LookupMiss {
                    path: resource.path().to_string(),
                });
                // Negative entry: the miss is not recomputed in this scope.
                self.caches.store(ctx.scope(), &key, &None);
                Ok(None)
            }
            [result] => {
                self.metrics.record_lookup_hit();
                self.emit(|| ResolveEvent::LookupHit {
                    path: resource.path().to_string(),
                    model: M::SPEC.type_name,
                });
                let Some(model) = self.map_guarded(&result.definition, resource, ctx)? else {
                    return Ok(None);
                };
                self.caches
                    .store(ctx.scope(), &key, &Some(Arc::clone(&model)));
                Ok(model.downcast::<M>().ok())
            }
            many => Err(Self::ambiguous(resource, M::SPEC.type_name, many.iter())),
        }
    }

    /// Most specific model of any type, excluding definitions matched at a
    /// reserved base type.
    pub fn resolve_most_specific(
        self: &Arc<Self>,
        resource: &ResourceRef,
        scope: &Arc<RequestScope>,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ResolveError> {
        self.resolve_untyped(resource, scope, false, None)
    }

    /// Most specific model of any type, base-typed definitions included.
    pub fn resolve_most_specific_including_base_types(
        self: &Arc<Self>,
        resource: &ResourceRef,
        scope: &Arc<RequestScope>,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ResolveError> {
        self.resolve_untyped(resource, scope, true, None)
    }

    /// Most specific model with the given definition name. Resolving by
    /// name implies base-type inclusion.
    pub fn resolve_most_specific_with_name(
        self: &Arc<Self>,
        resource: &ResourceRef,
        name: &str,
        scope: &Arc<RequestScope>,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ResolveError> {
        self.resolve_untyped(resource, scope, true, Some(name))
    }

    fn resolve_untyped(
        self: &Arc<Self>,
        resource: &ResourceRef,
        scope: &Arc<RequestScope>,
        include_base_types: bool,
        name: Option<&str>,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ResolveError> {
        let key = Self::discovery_key(resource, include_base_types, name);
        if let Some(entry) = self.caches.lookup(scope, &key) {
            self.metrics.record_cache_hit();
            self.emit(|| ResolveEvent::CacheHit {
                path: resource.path().to_string(),
                model: key.target.label(),
            });
            return Ok(entry);
        }
        self.metrics.record_cache_miss();
        self.emit(|| ResolveEvent::CacheMiss {
            path: resource.path().to_string(),
            model: key.target.label(),
        });

        let chain = type_chain(self.hierarchy.as_ref(), resource.resource_type());
        let results = self.registry.lookup_most_specific(&LookupQuery {
            chain: &chain,
            include_base_types,
            name,
            model: None,
        });
        // Discovery collapses anything but exactly one match to a miss.
        let [result] = results.as_slice() else {
            self.metrics.record_lookup_miss();
            self.emit(|| ResolveEvent::LookupMiss {
                path: resource.path().to_string(),
            });
            // Negative entry: the miss is not recomputed in this scope.
            self.caches.store(scope, &key, &None);
            return Ok(None);
        };
        self.metrics.record_lookup_hit();
        self.emit(|| ResolveEvent::LookupHit {
            path: resource.path().to_string(),
            model: result.definition.model.type_name,
        });

        let definition = &result.definition;
        let ctx = MappingContext::root(Arc::clone(self), Arc::clone(scope));
        let Some(model) = self.map_guarded(definition, resource, &ctx)? else {
            return Ok(None);
        };
        let entry = Some(Arc::clone(&model));
        self.caches.store(scope, &key, &entry);
        // The outcome also answers a typed adaptation to the same model.
        let typed = Self::key_for(resource, definition.type_id, definition.model.type_name);
        self.caches.store(scope, &typed, &entry);
        Ok(Some(model))
    }

    /// Map under the cycle guard. Re-entering a mapping already in flight
    /// for the same resource and model yields `Ok(None)`.
    fn map_guarded(
        self: &Arc<Self>,
        definition: &ModelDefinition,
        resource: &ResourceRef,
        ctx: &MappingContext,
    ) -> Result<Option<Arc<dyn Any + Send + Sync>>, ResolveError> {
        if !ctx.begin(resource.path(), definition.type_id) {
            return Ok(None);
        }
        self.metrics.record_mapping();
        self.emit(|| ResolveEvent::MappingStarted {
            path: resource.path().to_string(),
            model: definition.model.type_name,
        });
        let outcome = self.mapper.map(definition, resource, ctx);
        ctx.end(resource.path(), definition.type_id);
        let model = outcome?;
        self.emit(|| ResolveEvent::MappingFinished {
            path: resource.path().to_string(),
            model: definition.model.type_name,
        });
        Ok(Some(model))
    }

    fn key_for(resource: &ResourceRef, model: TypeId, name: &'static str) -> CacheKey {
        CacheKey {
            resource_path: resource.path().to_string(),
            target: CacheTarget::Model { id: model, name },
            resource_type: resource.resource_type().clone(),
            resolver: resource.resolver_id(),
        }
    }

    fn discovery_key(
        resource: &ResourceRef,
        include_base_types: bool,
        name: Option<&str>,
    ) -> CacheKey {
        CacheKey {
            resource_path: resource.path().to_string(),
            target: CacheTarget::Discovery {
                include_base_types,
                name: name.map(str::to_string),
            },
            resource_type: resource.resource_type().clone(),
            resolver: resource.resolver_id(),
        }
    }

    fn ambiguous<'a>(
        resource: &ResourceRef,
        target: &'static str,
        results: impl Iterator<Item = &'a crate::registry::LookupResult>,
    ) -> ResolveError {
        ResolveError::Ambiguous {
            path: resource.path().to_string(),
            target,
            candidates: results.map(|r| r.definition.name.clone()).collect(),
        }
    }

    fn emit(&self, event: impl FnOnce() -> ResolveEvent) {
        if let Some(sink) = &self.sink {
            sink.on_event(event());
        }
    }
}

///
/// EngineBuilder
///

#[derive(Default)]
pub struct EngineBuilder {
    hierarchy: Option<Arc<dyn TypeHierarchy>>,
    hooks: Vec<Arc<dyn ModelProcessor>>,
    placeholders: Vec<Arc<dyn PlaceholderResolver>>,
    backends: Vec<Arc<dyn ModelCache>>,
    cache_config: CacheConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl EngineBuilder {
    /// Source of super-type chains. Defaults to an empty hierarchy, where
    /// every chain is the type itself plus the synthetic root.
    #[must_use]
    pub fn with_hierarchy(mut self, hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        self.hierarchy = Some(hierarchy);
        self
    }

    #[must_use]
    pub fn with_hook(mut self, hook: Arc<dyn ModelProcessor>) -> Self {
        self.hooks.push(hook);
        self
    }

    #[must_use]
    pub fn with_placeholder_resolver(mut self, resolver: Arc<dyn PlaceholderResolver>) -> Self {
        self.placeholders.push(resolver);
        self
    }

    #[must_use]
    pub fn with_cache(mut self, backend: Arc<dyn ModelCache>) -> Self {
        self.backends.push(backend);
        self
    }

    #[must_use]
    pub fn with_cache_config(mut self, config: CacheConfig) -> Self {
        self.cache_config = config;
        self
    }

    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<Engine> {
        let processors = Arc::new(FieldProcessors::new());
        let caches = ModelCaches::new();
        for backend in self.backends {
            caches.bind(backend);
        }
        Arc::new(Engine {
            registry: ModelRegistry::new(),
            hierarchy: self
                .hierarchy
                .unwrap_or_else(|| Arc::new(StaticTypeHierarchy::default())),
            mapper: Mapper::new(
                Arc::clone(&processors),
                self.hooks,
                PlaceholderResolvers::new(self.placeholders),
            ),
            processors,
            caches,
            cache_config: self.cache_config,
            metrics: EngineMetrics::default(),
            sink: self.sink,
        })
    }
}
