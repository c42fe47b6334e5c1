//! Cascade Scheduling
//!
//! The dependency graph owns every node of a filter set and decides which
//! filters take part in a cascade and in which order.
//!
//! # Algorithm
//!
//! A cascade started by filter `F` runs in two phases:
//!
//! 1. Every transitive dependent of `F` is collected with a depth-first walk
//!    over children, so the caller can flag all of them as loading before
//!    any work starts.
//! 2. The dependents are then resolved one generation at a time. Starting
//!    from `[F]`, the next level is the union of the children of the
//!    current level. A level is only produced once the previous one has
//!    fully settled, which guarantees a child never reads a stale parent.
//!
//! Edges are validated when inserted; an edge that would duplicate an
//! existing one or close a cycle is rejected and leaves both nodes intact.

use std::collections::HashSet;

use indexmap::IndexSet;
use tracing::trace;

use super::node::{Children, FilterId, Node};
use crate::error::{CyclicDependencyError, EdgeConflict};

/// The structure of a filter set: one node per filter, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self { nodes: Vec::new() }
    }

    /// Add a node for the named filter and return its id.
    pub fn add_node(&mut self, name: impl Into<String>) -> FilterId {
        let id = FilterId::from(self.nodes.len());
        self.nodes.push(Node::new(id, name));
        id
    }

    /// Get a node by id.
    pub fn get_node(&self, id: FilterId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Look up a node id by filter name.
    pub fn find(&self, name: &str) -> Option<FilterId> {
        self.nodes.iter().find(|n| n.name() == name).map(Node::id)
    }

    /// Add a dependency edge: `child` depends on `parent`.
    ///
    /// Fails without touching either node when the child is already
    /// registered, when the edge would point back at the node's own parent
    /// or child, or when `parent` is already reachable from `child`.
    pub fn add_edge(&mut self, parent: FilterId, child: FilterId) -> Result<(), CyclicDependencyError> {
        self.check_edge(parent, child)?;

        trace!(parent = %self.name_of(parent), child = %self.name_of(child), "adding dependency edge");
        self.nodes[parent.index()].push_child(child);
        self.nodes[child.index()].set_parent(parent);
        Ok(())
    }

    fn check_edge(&self, parent: FilterId, child: FilterId) -> Result<(), CyclicDependencyError> {
        let conflict = |conflict| CyclicDependencyError {
            parent: self.name_of(parent).to_string(),
            child: self.name_of(child).to_string(),
            conflict,
        };

        if parent == child {
            return Err(conflict(EdgeConflict::SelfDependency));
        }

        let (Some(parent_node), Some(child_node)) = (self.get_node(parent), self.get_node(child)) else {
            // Ids are only minted by `add_node`.
            return Err(conflict(EdgeConflict::Cycle));
        };

        if parent_node.has_child(child) {
            return Err(conflict(EdgeConflict::DuplicateChild));
        }
        if parent_node.parent_is(child) {
            return Err(conflict(EdgeConflict::ChildIsParent));
        }
        if child_node.has_child(parent) {
            return Err(conflict(EdgeConflict::ParentIsChild));
        }
        if self.reaches(child, parent) {
            return Err(conflict(EdgeConflict::Cycle));
        }
        Ok(())
    }

    /// Whether `to` can be reached from `from` by following children.
    fn reaches(&self, from: FilterId, to: FilterId) -> bool {
        let mut visited = HashSet::new();
        let mut stack = vec![from];

        while let Some(id) = stack.pop() {
            if id == to {
                return true;
            }
            if !visited.insert(id) {
                continue;
            }
            if let Some(node) = self.get_node(id) {
                stack.extend(node.children().iter().copied());
            }
        }
        false
    }

    /// Every transitive dependent of `id`, depth-first in child order.
    ///
    /// A dependent reachable along several paths is listed once.
    pub fn affected(&self, id: FilterId) -> Vec<FilterId> {
        let mut seen = IndexSet::new();
        self.collect_affected(id, &mut seen);
        seen.into_iter().collect()
    }

    fn collect_affected(&self, id: FilterId, seen: &mut IndexSet<FilterId>) {
        let Some(node) = self.get_node(id) else {
            return;
        };
        for &child in node.children() {
            if seen.insert(child) {
                self.collect_affected(child, seen);
            }
        }
    }

    /// The next generation of a cascade: all children of `level`, in order,
    /// without duplicates.
    pub fn next_level(&self, level: &[FilterId]) -> Children {
        let mut next: IndexSet<FilterId> = IndexSet::new();
        for &id in level {
            if let Some(node) = self.get_node(id) {
                next.extend(node.children().iter().copied());
            }
        }
        next.into_iter().collect()
    }

    /// Root filters in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = FilterId> + '_ {
        self.nodes.iter().filter(|n| n.is_root()).map(Node::id)
    }

    /// Get the parent of a node, if it has one.
    pub fn parent_of(&self, id: FilterId) -> Option<FilterId> {
        self.get_node(id).and_then(Node::parent)
    }

    fn name_of(&self, id: FilterId) -> &str {
        self.get_node(id).map(Node::name).unwrap_or("<unknown>")
    }

    /// Get the total number of nodes in the graph.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }
}
