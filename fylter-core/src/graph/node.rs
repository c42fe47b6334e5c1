//! Graph Nodes
//!
//! This module defines the node type that lives in the dependency graph.
//! Nodes only hold structure: which filter they belong to, the filter they
//! depend on and the filters that depend on them. Edge insertion goes
//! through [`DependencyGraph`](super::DependencyGraph) so both ends are
//! checked and updated together.

use smallvec::SmallVec;

/// Identifier of a filter within one filter set.
///
/// Ids are handed out in declaration order, so an id doubles as the
/// filter's position in the set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FilterId(usize);

impl FilterId {
    /// Get the raw index value.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl From<usize> for FilterId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Children of a node. Most filters fan out to a handful of dependents.
pub type Children = SmallVec<[FilterId; 4]>;

/// A node in the dependency graph.
#[derive(Debug, Clone)]
pub struct Node {
    /// The filter this node belongs to.
    id: FilterId,

    /// Name of the filter, used in error reporting.
    name: String,

    /// The filter this node depends on. `None` for roots.
    ///
    /// When a filter declares several dependencies this is the one
    /// registered last.
    parent: Option<FilterId>,

    /// Filters that depend on this node, in insertion order.
    children: Children,
}

impl Node {
    /// Create a detached node.
    pub fn new(id: FilterId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            parent: None,
            children: Children::new(),
        }
    }

    /// Get the node's id.
    pub fn id(&self) -> FilterId {
        self.id
    }

    /// Get the name of the filter the node belongs to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A root depends on no other filter.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    pub fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    pub fn has_child(&self, id: FilterId) -> bool {
        self.children.contains(&id)
    }

    /// Check whether `id` is this node's parent.
    pub fn parent_is(&self, id: FilterId) -> bool {
        self.parent == Some(id)
    }

    pub fn parent(&self) -> Option<FilterId> {
        self.parent
    }

    /// Children in insertion order.
    pub fn children(&self) -> &[FilterId] {
        &self.children
    }

    pub(super) fn push_child(&mut self, id: FilterId) {
        self.children.push(id);
    }

    pub(super) fn set_parent(&mut self, id: FilterId) {
        self.parent = Some(id);
    }
}
