//! Type-indexed model registry.
//!
//! Definitions are owned by the index and keyed by declared type. The index
//! is replaced wholesale on every mutation, so concurrent lookups observe
//! either the previous or the next index, never a torn one. Resolution is a
//! pure function of the current index and the supplied type chain.


use crate::{model::ModelSpec, resource::ResourceType};
use derive_more::Display;
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

///
/// ProviderId
///
/// Opaque handle of the party that registered a set of definitions. All
/// definitions of a provider are removed atomically when it goes away.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct ProviderId(u64);

impl ProviderId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

///
/// ModelDefinition
///
/// A model offered for one or more declared types. Immutable once
/// registered.
///

#[derive(Debug)]
pub struct ModelDefinition {
    pub name: String,
    pub declared_types: Vec<ResourceType>,
    pub model: &'static ModelSpec,
    pub type_id: TypeId,
    pub provider: ProviderId,
}

impl ModelDefinition {
    /// Definition for a statically described model type.
    #[must_use]
    pub fn of<M: crate::model::ResourceModel>(
        name: impl Into<String>,
        declared_types: impl IntoIterator<Item = impl Into<ResourceType>>,
        provider: ProviderId,
    ) -> Self {
        Self {
            name: name.into(),
            declared_types: declared_types.into_iter().map(Into::into).collect(),
            model: M::SPEC,
            type_id: TypeId::of::<M>(),
            provider,
        }
    }

    fn identity(&self) -> (ProviderId, &str, TypeId) {
        (self.provider, self.name.as_str(), self.type_id)
    }
}

///
/// LookupResult
///

#[derive(Clone, Debug)]
pub struct LookupResult {
    pub definition: Arc<ModelDefinition>,
    /// Type at which the definition matched within the chain.
    pub matched_type: ResourceType,
    /// Position of the matched type in the chain; 0 is the most specific.
    pub specificity_rank: usize,
}

///
/// LookupQuery
///

#[derive(Clone, Copy, Debug)]
pub struct LookupQuery<'a> {
    /// Mappable type chain, most specific first, ending at the synthetic
    /// root (see [`crate::resource::type_chain`]).
    pub chain: &'a [ResourceType],
    /// Whether a winner matched at a reserved base type may be surfaced.
    /// A name filter implies inclusion regardless of this flag.
    pub include_base_types: bool,
    /// Restrict candidates within the winning level to this model name.
    pub name: Option<&'a str>,
    /// Restrict candidates to this model type.
    pub model: Option<TypeId>,
}

#[derive(Clone, Default)]
struct TypeIndex {
    by_type: HashMap<ResourceType, Vec<Arc<ModelDefinition>>>,
}

///
/// ModelRegistry
///

#[derive(Default)]
pub struct ModelRegistry {
    index: RwLock<Arc<TypeIndex>>,
}

impl ModelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert definitions under each of their declared types. Re-registering
    /// an identical definition (same provider, name, and model type) is a
    /// no-op for the types it already occupies.
    pub fn register(&self, definitions: Vec<ModelDefinition>) {
        if definitions.is_empty() {
            return;
        }
        let mut guard = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = TypeIndex::clone(&guard);
        for definition in definitions {
            let definition = Arc::new(definition);
            for declared in &definition.declared_types {
                let slot = next.by_type.entry(declared.clone()).or_default();
                if slot
                    .iter()
                    .any(|existing| existing.identity() == definition.identity())
                {
                    continue;
                }
                slot.push(Arc::clone(&definition));
            }
        }
        *guard = Arc::new(next);
    }

    /// Remove every definition of the given provider. Returns the number of
    /// definitions removed (counted once, not per declared type).
    pub fn unregister(&self, provider: ProviderId) -> usize {
        let mut guard = self.index.write().unwrap_or_else(PoisonError::into_inner);
        let mut next = TypeIndex::clone(&guard);
        let mut removed: Vec<(ProviderId, String, TypeId)> = Vec::new();
        next.by_type.retain(|_, slot| {
            slot.retain(|definition| {
                if definition.provider != provider {
                    return true;
                }
                let identity = (
                    definition.provider,
                    definition.name.clone(),
                    definition.type_id,
                );
                if !removed.contains(&identity) {
                    removed.push(identity);
                }
                false
            });
            !slot.is_empty()
        });
        *guard = Arc::new(next);
        removed.len()
    }

    /// Walk the chain from most specific to least specific; the first level
    /// with at least one candidate (after name/model filtering) wins and
    /// lower levels are never consulted. A winning level at a reserved base
    /// type is discarded entirely unless base types are included or a name
    /// filter is in effect.
    #[must_use]
    pub fn lookup_most_specific(&self, query: &LookupQuery<'_>) -> Vec<LookupResult> {
        let index = self.snapshot();
        for (rank, resource_type) in query.chain.iter().enumerate() {
            let Some(slot) = index.by_type.get(resource_type) else {
                continue;
            };
            let matched: Vec<Arc<ModelDefinition>> = slot
                .iter()
                .filter(|definition| Self::accepts(definition, query.name, query.model))
                .map(Arc::clone)
                .collect();
            if matched.is_empty() {
                continue;
            }
            if resource_type.is_base_type() && !query.include_base_types && query.name.is_none() {
                return Vec::new();
            }
            return matched
                .into_iter()
                .map(|definition| LookupResult {
                    definition,
                    matched_type: resource_type.clone(),
                    specificity_rank: rank,
                })
                .collect();
        }
        Vec::new()
    }

    /// Every matching definition across the whole chain, most specific
    /// levels first.
    #[must_use]
    pub fn lookup_all(&self, chain: &[ResourceType], name: Option<&str>) -> Vec<LookupResult> {
        let index = self.snapshot();
        let mut results = Vec::new();
        for (rank, resource_type) in chain.iter().enumerate() {
            let Some(slot) = index.by_type.get(resource_type) else {
                continue;
            };
            for definition in slot {
                if Self::accepts(definition, name, None) {
                    results.push(LookupResult {
                        definition: Arc::clone(definition),
                        matched_type: resource_type.clone(),
                        specificity_rank: rank,
                    });
                }
            }
        }
        results
    }

    /// Snapshot of all registered definitions, each logical definition
    /// reported once. Re-registration can leave one identity spread over
    /// several `Arc`s, so deduplication is by identity rather than by
    /// pointer.
    #[must_use]
    pub fn definitions(&self) -> Vec<Arc<ModelDefinition>> {
        let index = self.snapshot();
        let mut seen: Vec<Arc<ModelDefinition>> = Vec::new();
        for slot in index.by_type.values() {
            for definition in slot {
                if !seen.iter().any(|d| d.identity() == definition.identity()) {
                    seen.push(Arc::clone(definition));
                }
            }
        }
        seen
    }

    fn accepts(definition: &ModelDefinition, name: Option<&str>, model: Option<TypeId>) -> bool {
        name.is_none_or(|n| definition.name == n)
            && model.is_none_or(|m| definition.type_id == m)
    }

    fn snapshot(&self) -> Arc<TypeIndex> {
        Arc::clone(&self.index.read().unwrap_or_else(PoisonError::into_inner))
    }
}
