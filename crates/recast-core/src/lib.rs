//! Core runtime for Recast: the resource contract, static model descriptors,
//! the type-indexed model registry, the field-mapping engine, and the
//! request-scoped result cache composed by the `Engine`.

// public exports are one module level down
pub mod cache;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod model;
pub mod obs;
pub mod registry;
pub mod resource;

///
/// CONSTANTS
///

/// Reserved base type for untyped structured content.
pub const NT_UNSTRUCTURED: &str = "nt:unstructured";

/// Reserved base type at the bottom of every declared type chain.
pub const NT_BASE: &str = "nt:base";

/// Synthetic root terminating every mappable type chain. Resources without
/// a declared type report this as their only type.
pub const SYNTHETIC_ROOT: &str = "recast:root";

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No caches, mappers, or internal registries are re-exported here.
///

pub mod prelude {
    pub use crate::{
        engine::{Engine, EngineBuilder},
        error::{MappingError, RegistrationError, ResolveError},
        model::{FieldKind, FieldSpec, FieldWrapper, Lazy, ModelSpec, ResourceModel},
        registry::{LookupResult, ModelDefinition, ProviderId},
        resource::{
            MemoryTree, Properties, Resource, ResourceRef, ResourceType, ResolverId,
            StaticTypeHierarchy, TypeHierarchy, Value,
        },
    };
}
