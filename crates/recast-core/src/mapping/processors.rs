use crate::{
    error::RegistrationError,
    mapping::Resolved,
    model::{BoxedModel, FieldSpec, ModelSpec},
    registry::ModelDefinition,
    resource::{Resource, ResourceRef},
};
use std::sync::{Arc, PoisonError, RwLock};

///
/// CustomFieldProcessor
///
/// Post-processes the resolved value of accepted fields before assignment.
/// Acceptance is evaluated once per model type when metadata is built; at
/// most one processor may accept any given field.
///

pub trait CustomFieldProcessor: Send + Sync {
    /// Stable name used for unregistration and conflict reports.
    fn name(&self) -> &str;

    fn accepts(&self, field: &FieldSpec, model: &ModelSpec) -> bool;

    fn process(&self, field: &FieldSpec, value: Resolved, resource: &dyn Resource) -> Resolved;
}

///
/// ModelProcessor
///
/// Lifecycle hook around a single mapping. Hooks may substitute the
/// instance; a substitute of a different type aborts the mapping.
///

pub trait ModelProcessor: Send + Sync {
    fn before_mapping(&self, model: BoxedModel, _resource: &ResourceRef) -> BoxedModel {
        model
    }

    fn after_mapping(&self, model: BoxedModel, _resource: &ResourceRef) -> BoxedModel {
        model
    }
}

#[derive(Default)]
struct ProcessorSet {
    processors: Vec<Arc<dyn CustomFieldProcessor>>,
    generation: u64,
}

///
/// FieldProcessors
///
/// The registered field-processor set, stamped with a generation that
/// advances on every change so derived metadata can invalidate lazily.
///

#[derive(Default)]
pub struct FieldProcessors {
    inner: RwLock<ProcessorSet>,
}

impl FieldProcessors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// The single processor accepting the field, if any.
    #[must_use]
    pub fn processor_for(
        &self,
        field: &FieldSpec,
        model: &ModelSpec,
    ) -> Option<Arc<dyn CustomFieldProcessor>> {
        self.read()
            .processors
            .iter()
            .find(|p| p.accepts(field, model))
            .map(Arc::clone)
    }

    /// Register a processor, first scanning the given definitions for a
    /// field the new processor and an already-registered one both accept.
    pub fn register(
        &self,
        processor: Arc<dyn CustomFieldProcessor>,
        definitions: &[Arc<ModelDefinition>],
    ) -> Result<(), RegistrationError> {
        let mut set = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        for definition in definitions {
            for field in definition.model.fields {
                if !processor.accepts(field, definition.model) {
                    continue;
                }
                if let Some(existing) = set
                    .processors
                    .iter()
                    .find(|p| p.accepts(field, definition.model))
                {
                    return Err(RegistrationError::ProcessorConflict {
                        model: definition.model.type_name,
                        field: field.name,
                        first: existing.name().to_string(),
                        second: processor.name().to_string(),
                    });
                }
            }
        }
        set.processors.push(processor);
        set.generation += 1;
        Ok(())
    }

    /// Verify that no two registered processors accept the same field of
    /// the given model.
    pub fn check_model(&self, model: &'static ModelSpec) -> Result<(), RegistrationError> {
        let set = self.read();
        for field in model.fields {
            let mut accepting = set.processors.iter().filter(|p| p.accepts(field, model));
            if let (Some(first), Some(second)) = (accepting.next(), accepting.next()) {
                return Err(RegistrationError::ProcessorConflict {
                    model: model.type_name,
                    field: field.name,
                    first: first.name().to_string(),
                    second: second.name().to_string(),
                });
            }
        }
        Ok(())
    }

    /// Remove the processor with the given name. Returns whether one was
    /// removed.
    pub fn unregister(&self, name: &str) -> bool {
        let mut set = self
            .inner
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let before = set.processors.len();
        set.processors.retain(|p| p.name() != name);
        if set.processors.len() == before {
            return false;
        }
        set.generation += 1;
        true
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, ProcessorSet> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    /// Minimal configurable processor for registration and metadata tests.
    pub struct NamedProcessor {
        name: &'static str,
        accepts: fn(&FieldSpec, &ModelSpec) -> bool,
        transform: Option<fn(Resolved) -> Resolved>,
    }

    impl NamedProcessor {
        pub fn accepting(name: &'static str, accepts: fn(&FieldSpec, &ModelSpec) -> bool) -> Self {
            Self {
                name,
                accepts,
                transform: None,
            }
        }

        pub fn transforming(
            name: &'static str,
            accepts: fn(&FieldSpec, &ModelSpec) -> bool,
            transform: fn(Resolved) -> Resolved,
        ) -> Self {
            Self {
                name,
                accepts,
                transform: Some(transform),
            }
        }
    }

    impl CustomFieldProcessor for NamedProcessor {
        fn name(&self) -> &str {
            self.name
        }

        fn accepts(&self, field: &FieldSpec, model: &ModelSpec) -> bool {
            (self.accepts)(field, model)
        }

        fn process(
            &self,
            _field: &FieldSpec,
            value: Resolved,
            _resource: &dyn Resource,
        ) -> Resolved {
            match self.transform {
                Some(transform) => transform(value),
                None => value,
            }
        }
    }
}
