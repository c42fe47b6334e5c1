//! Dependency Graph
//!
//! This module implements the structure that ties filters together.
//!
//! # Overview
//!
//! The dependency graph is a directed acyclic graph where:
//!
//! - Nodes represent filters
//! - Edges represent dependencies: if B depends on A, A is B's parent and
//!   B is one of A's children
//!
//! When a filter's selection changes, the graph tells the filter set which
//! filters are affected and in which generations they must be resolved.
//!
//! # Design Decisions
//!
//! 1. Nodes live in a single arena owned by the graph, indexed by
//!    [`FilterId`]. Filters never hold references to each other.
//!
//! 2. The graph is built once from the declared `dependsOn` names and is
//!    immutable afterwards.
//!
//! 3. Edge insertion enforces the invariants (no duplicates, no cycles)
//!    eagerly, so an invalid configuration fails at construction time.

mod node;
mod scheduler;

pub use node::{Children, FilterId, Node};
pub use scheduler::DependencyGraph;
