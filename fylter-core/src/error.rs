//! Error Types
//!
//! Failures are grouped by where they surface:
//!
//! - [`CyclicDependencyError`] and [`ConfigError`] abort construction of a
//!   [`FilterSet`](crate::filter_set::FilterSet).
//! - [`FetchError`] and transform failures are caught per filter and turn
//!   that filter's state into `Error`.
//! - `ParentInError` is the only filter-level failure that reaches the
//!   cascade, where it is folded into `AggregateCascade` and reported as an
//!   all-error snapshot.

use thiserror::Error;

/// Error type returned by user-supplied middleware and data futures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Why an edge could not be inserted into the dependency graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeConflict {
    /// The filter names itself as a dependency.
    SelfDependency,
    /// The child is already registered under this parent.
    DuplicateChild,
    /// The child is already the parent of the would-be parent.
    ChildIsParent,
    /// The would-be parent is already a child of the child.
    ParentIsChild,
    /// The parent is reachable from the child through longer chains.
    Cycle,
}

/// Structural violation detected while inserting a dependency edge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} ('{parent}' -> '{child}')", conflict_message(.conflict))]
pub struct CyclicDependencyError {
    pub parent: String,
    pub child: String,
    pub conflict: EdgeConflict,
}

fn conflict_message(conflict: &EdgeConflict) -> &'static str {
    match conflict {
        EdgeConflict::SelfDependency => "Attempted to create a cyclic dependency, a filter cannot depend on itself",
        EdgeConflict::DuplicateChild => "Attempted to add a child that already exists",
        EdgeConflict::ChildIsParent => {
            "Attempted to create a cyclic dependency, adding a child that is already the parent"
        }
        EdgeConflict::ParentIsChild => {
            "Attempted to create a cyclic dependency, adding a parent that is already a child"
        }
        EdgeConflict::Cycle => "Attempted to create a cyclic dependency, the parent depends on the child",
    }
}

/// Invalid filter configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("filter '{filter}' depends on unknown filter '{dependency}'")]
    UnknownDependency { filter: String, dependency: String },

    #[error("filter name '{0}' is declared more than once")]
    DuplicateName(String),

    #[error("filter '{filter}': data needs to be an api endpoint (string), an array or a future, found {found}")]
    UnexpectedDataShape { filter: String, found: String },

    #[error("invalid filter declaration: {0}")]
    InvalidDeclaration(#[from] serde_json::Error),
}

/// Failure reported by a [`Fetcher`](crate::fetch::Fetcher).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("non 200+ response from API (status {0})")]
    Status(u16),

    #[error("response body is not valid JSON: {0}")]
    Parse(String),

    #[error("no fetch implementation is configured")]
    Unavailable,
}

/// Top-level error for the filter engine.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    CyclicDependency(#[from] CyclicDependencyError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("data source failed in filter '{filter}': {source}")]
    Data {
        filter: String,
        #[source]
        source: BoxError,
    },

    #[error("middleware failed in filter '{filter}': {source}")]
    Transform {
        filter: String,
        #[source]
        source: BoxError,
    },

    #[error("filter '{filter}' cannot be updated when parent '{parent}' is in an error state")]
    ParentInError { filter: String, parent: String },

    #[error("cascade from '{origin}' failed in {failures} filter(s): {first}")]
    AggregateCascade {
        origin: String,
        failures: usize,
        first: Box<FilterError>,
    },
}

impl FilterError {
    /// Wrap a middleware failure for the named filter.
    pub fn transform(filter: impl Into<String>, source: BoxError) -> Self {
        Self::Transform {
            filter: filter.into(),
            source,
        }
    }
}
