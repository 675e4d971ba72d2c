//! Static model descriptors and their derived metadata.
//!
//! A model declares its mappable fields once, as plain static data
//! ([`ModelSpec`]); the [`MetadataRegistry`] turns that declaration into
//! per-type [`ModelMetadata`] with pre-parsed path templates and the bound
//! field processor, rebuilt lazily whenever the processor set changes.

mod lazy;
mod metadata;
mod path;
mod spec;

pub use lazy::Lazy;
pub use metadata::{FieldMetadata, MetadataRegistry, ModelMetadata};
pub use path::{PathTemplate, PlaceholderResolver, PlaceholderResolvers};
pub use spec::{BoxedModel, FieldKind, FieldSpec, FieldWrapper, ModelSpec, ResourceModel, assign};
