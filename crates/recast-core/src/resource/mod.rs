//! The narrow resource contract consumed by the engine.
//!
//! The engine never sees a concrete content tree; it reads resources through
//! [`Resource`] only. [`MemoryTree`] is the reference implementation of the
//! contract and doubles as the shared test fixture.

mod hierarchy;
mod memory;
mod properties;
mod value;

pub use hierarchy::{ResourceType, StaticTypeHierarchy, TypeHierarchy, type_chain};
pub use memory::{MemoryTree, MemoryTreeBuilder};
pub use properties::Properties;
pub use value::Value;

use derive_more::Display;
use std::sync::Arc;

/// Shared handle to a resource behind the contract.
pub type ResourceRef = Arc<dyn Resource>;

///
/// ResolverId
///
/// Opaque comparable token identifying the resolver session a resource was
/// obtained from. Cached models are never shared across resolver identities.
///

#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub struct ResolverId(u64);

impl ResolverId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }
}

///
/// Resource
///
/// A hierarchical content node. Property and child reads are assumed
/// synchronous and fast; the engine performs no I/O of its own.
///

pub trait Resource: Send + Sync {
    /// Absolute path of this resource within its tree.
    fn path(&self) -> &str;

    /// Declared type. Resources without a declared type report the
    /// synthetic root type.
    fn resource_type(&self) -> &ResourceType;

    /// Property map supporting typed reads.
    fn properties(&self) -> &Properties;

    /// Child at the given relative path, if any.
    fn child(&self, relative_path: &str) -> Option<ResourceRef>;

    /// Resolve an absolute path within this resource's tree, or a path
    /// relative to this resource.
    fn get(&self, path: &str) -> Option<ResourceRef>;

    /// Direct children, in tree order.
    fn children(&self) -> Vec<ResourceRef>;

    /// Identity of the resolver session this resource belongs to.
    fn resolver_id(&self) -> ResolverId;

    /// Last segment of the path.
    fn name(&self) -> &str {
        self.path().rsplit('/').next().unwrap_or("")
    }
}
