use crate::{
    mapping::{CustomFieldProcessor, FieldProcessors},
    model::{FieldKind, FieldSpec, ModelSpec, PathTemplate},
};
use std::{
    any::TypeId,
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
};

///
/// ModelMetadata
///
/// Per-type mapping metadata derived once from a [`ModelSpec`]: pre-parsed
/// path templates and the single bound field processor per field. Immutable
/// after the build; invalidation replaces the whole value.
///

#[derive(Clone)]
pub struct ModelMetadata {
    pub fields: Vec<FieldMetadata>,
}

///
/// FieldMetadata
///

#[derive(Clone)]
pub struct FieldMetadata {
    pub spec: &'static FieldSpec,
    pub path: PathTemplate,
    pub processor: Option<Arc<dyn CustomFieldProcessor>>,
}

///
/// MetadataRegistry
///
/// Lazy per-type metadata cache. Entries are stamped with the processor-set
/// generation they were built against; a stale stamp triggers a rebuild on
/// the next access rather than eagerly on processor change.
///

#[derive(Default)]
pub struct MetadataRegistry {
    cache: RwLock<HashMap<TypeId, CachedMetadata>>,
}

struct CachedMetadata {
    generation: u64,
    metadata: Arc<ModelMetadata>,
}

impl MetadataRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe(
        &self,
        spec: &'static ModelSpec,
        type_id: TypeId,
        processors: &FieldProcessors,
    ) -> Arc<ModelMetadata> {
        let generation = processors.generation();
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&type_id) {
                if cached.generation == generation {
                    return Arc::clone(&cached.metadata);
                }
            }
        }

        let metadata = Arc::new(Self::build(spec, processors));
        let mut cache = self.cache.write().unwrap_or_else(PoisonError::into_inner);
        cache.insert(
            type_id,
            CachedMetadata {
                generation,
                metadata: Arc::clone(&metadata),
            },
        );
        metadata
    }

    fn build(spec: &'static ModelSpec, processors: &FieldProcessors) -> ModelMetadata {
        let fields = spec
            .fields
            .iter()
            .map(|field| {
                // `Children` and `This` only follow an explicit path; the
                // implicit field name must not redirect them away from the
                // mapped resource.
                let declared = match field.kind {
                    FieldKind::Children | FieldKind::This => field.path,
                    _ => field.declared_path(),
                };
                FieldMetadata {
                    spec: field,
                    path: PathTemplate::parse(declared),
                    processor: processors.processor_for(field, spec),
                }
            })
            .collect();
        ModelMetadata { fields }
    }
}
