//! The field-mapping engine.
//!
//! A mapping populates one model instance from one resource, field by field
//! in declaration order. The first field failure aborts the whole mapping;
//! partially populated models are never published.

mod context;
mod processors;
mod resolved;

pub use context::MappingContext;
pub use processors::{CustomFieldProcessor, FieldProcessors, ModelProcessor};
pub use resolved::{ConversionError, DeferredResolved, FromResolved, Resolved};

#[cfg(test)]
pub(crate) use processors::test_support;

use crate::{
    error::{MappingError, ResolveError},
    model::{FieldKind, FieldMetadata, FieldSpec, MetadataRegistry, PlaceholderResolvers},
    registry::ModelDefinition,
    resource::ResourceRef,
};
use std::{any::Any, sync::Arc};

///
/// Mapper
///
/// Drives field resolution and assignment for a model definition. Holds the
/// per-type metadata cache, the field-processor set, and the mapping
/// lifecycle hooks; owns no resource or registry state of its own.
///

pub struct Mapper {
    metadata: MetadataRegistry,
    processors: Arc<FieldProcessors>,
    hooks: Vec<Arc<dyn ModelProcessor>>,
    placeholders: PlaceholderResolvers,
}

impl Mapper {
    pub(crate) fn new(
        processors: Arc<FieldProcessors>,
        hooks: Vec<Arc<dyn ModelProcessor>>,
        placeholders: PlaceholderResolvers,
    ) -> Self {
        Self {
            metadata: MetadataRegistry::new(),
            processors,
            hooks,
            placeholders,
        }
    }

    /// Map one resource into a fresh instance of the defined model.
    pub(crate) fn map(
        &self,
        definition: &ModelDefinition,
        resource: &ResourceRef,
        ctx: &MappingContext,
    ) -> Result<Arc<dyn Any + Send + Sync>, ResolveError> {
        let mut model = (definition.model.new)();
        for hook in &self.hooks {
            model = hook.before_mapping(model, resource);
        }
        Self::check_instance(&*model, definition)?;

        let metadata = self
            .metadata
            .describe(definition.model, definition.type_id, &self.processors);
        for field in &metadata.fields {
            let resolved = self.resolve_field(field, resource, ctx);
            (field.spec.set)(&mut *model, resolved, ctx)?;
        }

        for hook in &self.hooks {
            model = hook.after_mapping(model, resource);
        }
        Self::check_instance(&*model, definition)?;

        Ok(Arc::from(model))
    }

    fn check_instance(
        model: &(dyn Any + Send + Sync),
        definition: &ModelDefinition,
    ) -> Result<(), ResolveError> {
        if model.type_id() == definition.type_id {
            Ok(())
        } else {
            Err(MappingError::Instantiation {
                model: definition.model.type_name,
            }
            .into())
        }
    }

    fn resolve_field(
        &self,
        field: &FieldMetadata,
        resource: &ResourceRef,
        ctx: &MappingContext,
    ) -> Resolved {
        let path = field.path.expand(&self.placeholders);
        if field.spec.wrapper.is_deferred() {
            let spec = field.spec;
            let processor = field.processor.clone();
            let target = Arc::clone(resource);
            let thunk: Arc<dyn Fn() -> Resolved + Send + Sync> =
                Arc::new(move || materialize(spec, &path, processor.as_deref(), &target));
            Resolved::Deferred(DeferredResolved::new(thunk, ctx.clone()))
        } else {
            materialize(field.spec, &path, field.processor.as_deref(), resource)
        }
    }
}

/// Resolve a field's value against a resource according to its kind, then
/// run the bound processor, if any.
fn materialize(
    spec: &'static FieldSpec,
    path: &str,
    processor: Option<&dyn CustomFieldProcessor>,
    resource: &ResourceRef,
) -> Resolved {
    let resolved = match spec.kind {
        FieldKind::Property => resource
            .properties()
            .get(path)
            .cloned()
            .map_or(Resolved::Absent, Resolved::Value),
        FieldKind::This => Resolved::This(Arc::clone(resource)),
        FieldKind::Reference => resource
            .properties()
            .get_text(path)
            .and_then(|target| resource.get(&target))
            .map_or(Resolved::Absent, Resolved::Reference),
        FieldKind::ReferenceCollection => {
            match resource.properties().get_text_list(path) {
                None => Resolved::Absent,
                // Dangling entries are dropped; order of the rest is kept.
                Some(targets) => Resolved::References(
                    targets.iter().filter_map(|t| resource.get(t)).collect(),
                ),
            }
        }
        FieldKind::Children => {
            let parent = if path.is_empty() {
                Some(Arc::clone(resource))
            } else {
                resource.get(path)
            };
            parent.map_or(Resolved::Absent, |p| Resolved::Children(p.children()))
        }
        FieldKind::Nested => resource
            .get(path)
            .map_or(Resolved::Absent, Resolved::Reference),
    };
    match processor {
        Some(p) => p.process(spec, resolved, resource.as_ref()),
        None => resolved,
    }
}
