use crate::{NT_BASE, NT_UNSTRUCTURED, SYNTHETIC_ROOT};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

///
/// ResourceType
///
/// Opaque type identifier of a resource. The super-type chain of a type is
/// resolved externally through a [`TypeHierarchy`]; the type itself carries
/// no hierarchy knowledge beyond the reserved base identifiers.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct ResourceType(String);

impl ResourceType {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The synthetic root terminating every type chain.
    #[must_use]
    pub fn synthetic_root() -> Self {
        Self(SYNTHETIC_ROOT.to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_synthetic_root(&self) -> bool {
        self.0 == SYNTHETIC_ROOT
    }

    /// Whether this is one of the three reserved base identifiers. Models
    /// matched at a base type are only surfaced when the caller opts in or
    /// resolves by model name.
    #[must_use]
    pub fn is_base_type(&self) -> bool {
        self.0 == NT_UNSTRUCTURED || self.0 == NT_BASE || self.0 == SYNTHETIC_ROOT
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

///
/// TypeHierarchy
///
/// External source of super-type chains: given a type, its super types
/// ordered most specific first. The chain need not mention the synthetic
/// root; [`type_chain`] appends it exactly once.
///

pub trait TypeHierarchy: Send + Sync {
    fn super_types_of(&self, resource_type: &ResourceType) -> Vec<ResourceType>;
}

/// Full mappable chain of a type: the type itself, its super types most
/// specific first, terminated by the synthetic root. Accidental repeats are
/// dropped so a cycle in the declared hierarchy cannot loop a lookup.
#[must_use]
pub fn type_chain(hierarchy: &dyn TypeHierarchy, resource_type: &ResourceType) -> Vec<ResourceType> {
    let mut chain = vec![resource_type.clone()];
    if !resource_type.is_synthetic_root() {
        for super_type in hierarchy.super_types_of(resource_type) {
            if !chain.contains(&super_type) {
                chain.push(super_type);
            }
        }
    }
    let root = ResourceType::synthetic_root();
    if chain.last() != Some(&root) {
        chain.push(root);
    }
    chain
}

///
/// StaticTypeHierarchy
///
/// Map-backed hierarchy source. Types without a registered chain fall
/// straight through to the synthetic root.
///

#[derive(Clone, Debug, Default)]
pub struct StaticTypeHierarchy {
    chains: HashMap<ResourceType, Vec<ResourceType>>,
}

impl StaticTypeHierarchy {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the super-type chain of a type, most specific first.
    #[must_use]
    pub fn with_chain<I, T>(mut self, resource_type: impl Into<ResourceType>, super_types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<ResourceType>,
    {
        self.chains.insert(
            resource_type.into(),
            super_types.into_iter().map(Into::into).collect(),
        );
        self
    }
}

impl TypeHierarchy for StaticTypeHierarchy {
    fn super_types_of(&self, resource_type: &ResourceType) -> Vec<ResourceType> {
        self.chains.get(resource_type).cloned().unwrap_or_default()
    }
}
