use crate::{
    SYNTHETIC_ROOT,
    resource::{Properties, Resource, ResourceRef, ResourceType, ResolverId},
};
use std::{
    collections::BTreeMap,
    sync::{Arc, atomic::{AtomicU64, Ordering}},
};

static NEXT_RESOLVER: AtomicU64 = AtomicU64::new(1);

///
/// MemoryTree
///
/// In-memory implementation of the resource contract. Shipped as a public
/// fixture: integration tests and embedding code use it as the reference
/// content tree. The tree is immutable once built; every handle into it
/// shares the same resolver identity.
///

#[derive(Clone)]
pub struct MemoryTree {
    inner: Arc<TreeInner>,
}

struct TreeInner {
    nodes: BTreeMap<String, Arc<NodeData>>,
    resolver: ResolverId,
}

struct NodeData {
    resource_type: ResourceType,
    properties: Properties,
}

impl MemoryTree {
    #[must_use]
    pub fn builder() -> MemoryTreeBuilder {
        MemoryTreeBuilder::default()
    }

    /// Resolve an absolute path in this tree.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<ResourceRef> {
        let node = self.inner.nodes.get(path)?;
        Some(Arc::new(MemoryResource {
            tree: Arc::clone(&self.inner),
            path: path.to_string(),
            node: Arc::clone(node),
        }))
    }

    #[must_use]
    pub fn resolver_id(&self) -> ResolverId {
        self.inner.resolver
    }
}

///
/// MemoryTreeBuilder
///

#[derive(Default)]
pub struct MemoryTreeBuilder {
    nodes: BTreeMap<String, Arc<NodeData>>,
    resolver: Option<ResolverId>,
}

impl MemoryTreeBuilder {
    /// Declare a typed resource at an absolute path.
    #[must_use]
    pub fn resource(
        mut self,
        path: impl Into<String>,
        resource_type: impl Into<ResourceType>,
        properties: Properties,
    ) -> Self {
        self.nodes.insert(
            path.into(),
            Arc::new(NodeData {
                resource_type: resource_type.into(),
                properties,
            }),
        );
        self
    }

    /// Declare a purely structural node without a declared type.
    #[must_use]
    pub fn untyped(self, path: impl Into<String>) -> Self {
        self.resource(path, SYNTHETIC_ROOT, Properties::new())
    }

    /// Pin the resolver identity instead of allocating a fresh one.
    #[must_use]
    pub fn resolver(mut self, resolver: ResolverId) -> Self {
        self.resolver = Some(resolver);
        self
    }

    #[must_use]
    pub fn build(self) -> MemoryTree {
        let resolver = self
            .resolver
            .unwrap_or_else(|| ResolverId::new(NEXT_RESOLVER.fetch_add(1, Ordering::Relaxed)));
        MemoryTree {
            inner: Arc::new(TreeInner {
                nodes: self.nodes,
                resolver,
            }),
        }
    }
}

struct MemoryResource {
    tree: Arc<TreeInner>,
    path: String,
    node: Arc<NodeData>,
}

impl MemoryResource {
    fn lookup(&self, path: &str) -> Option<ResourceRef> {
        let node = self.tree.nodes.get(path)?;
        Some(Arc::new(Self {
            tree: Arc::clone(&self.tree),
            path: path.to_string(),
            node: Arc::clone(node),
        }))
    }
}

impl Resource for MemoryResource {
    fn path(&self) -> &str {
        &self.path
    }

    fn resource_type(&self) -> &ResourceType {
        &self.node.resource_type
    }

    fn properties(&self) -> &Properties {
        &self.node.properties
    }

    fn child(&self, relative_path: &str) -> Option<ResourceRef> {
        let relative_path = relative_path.trim_matches('/');
        if relative_path.is_empty() {
            return None;
        }
        self.lookup(&format!("{}/{relative_path}", self.path))
    }

    fn get(&self, path: &str) -> Option<ResourceRef> {
        if let Some(absolute) = path.strip_prefix('/') {
            self.lookup(&format!("/{absolute}"))
        } else {
            self.child(path)
        }
    }

    fn children(&self) -> Vec<ResourceRef> {
        let prefix = format!("{}/", self.path);
        self.tree
            .nodes
            .range(prefix.clone()..)
            .take_while(|(path, _)| path.starts_with(&prefix))
            .filter(|(path, _)| !path[prefix.len()..].contains('/'))
            .filter_map(|(path, _)| self.lookup(path))
            .collect()
    }

    fn resolver_id(&self) -> ResolverId {
        self.tree.resolver
    }
}
