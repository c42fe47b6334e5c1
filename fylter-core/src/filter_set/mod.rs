//! Filter Sets
//!
//! A filter set owns every filter of one layout, the dependency graph
//! between them and the update callback. It builds the graph from the
//! declared dependencies, loads the root filters and runs a cascade each
//! time a filter's selection changes.
//!
//! # Cascades
//!
//! When filter `F` updates, every transitive dependent of `F` is flagged
//! `Loading` right away, before the cascade future is first polled. The
//! dependents are then reloaded one generation at a time; all filters of a
//! generation load concurrently and the next generation starts once every
//! one of them has settled. A dependent whose parent is in `Error` fails
//! the generation; the failure is reported as a single
//! [`FilterError::AggregateCascade`] and every filter of the set is moved
//! to `Error`.
//!
//! The update callback fires once per settled cascade. While the set is
//! initialising or resetting, per-filter cascades stay silent and the set
//! reports once at the end.
//!
//! Overlapping cascades are not cancelled: two quick selections run two
//! cascades to completion and the one settling last determines the final
//! state.

mod config;

pub use config::{FilterSetConfig, UpdateCallback};

use std::sync::{Arc, Weak};

use futures_util::future::{self, join_all, BoxFuture};
use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use smallvec::smallvec;
use tracing::{debug, warn};

use crate::error::{ConfigError, FilterError};
use crate::fetch::default_fetcher;
use crate::filter::{Filter, FilterContext, FilterState, UpdateHook};
use crate::graph::{Children, DependencyGraph, FilterId};
use crate::render::Surface;
use crate::snapshot::FilterSnapshot;

/// Lifecycle of a filter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterSetState {
    Initialising,
    Idle,
    Error,
    Resetting,
}

impl FilterSetState {
    /// Whether cascades settling in this state stay silent.
    pub fn suppresses_updates(self) -> bool {
        matches!(self, FilterSetState::Initialising | FilterSetState::Resetting)
    }
}

struct Shared {
    filters: Vec<Arc<Filter>>,
    names: IndexMap<String, FilterId>,
    graph: DependencyGraph,
    state: Mutex<FilterSetState>,
    on_update: Option<UpdateCallback>,
    container: Surface,
}

/// A set of interdependent filters. Clones share the same set.
#[derive(Clone)]
pub struct FilterSet {
    shared: Arc<Shared>,
}

impl FilterSet {
    /// Build the set and mount one container per filter on `mount`.
    ///
    /// Fails when two filters share a name, when a dependency names an
    /// unknown filter or when the dependencies form a cycle. The set starts
    /// out `Initialising`; call [`initialise`](Self::initialise) to load it,
    /// or use [`mount`](Self::mount) to do both.
    pub fn new(mount: &Surface, config: FilterSetConfig) -> Result<Self, FilterError> {
        let FilterSetConfig {
            filters: configs,
            on_update,
            fetcher,
        } = config;

        let mut graph = DependencyGraph::new();
        let mut names = IndexMap::with_capacity(configs.len());
        for config in &configs {
            let id = graph.add_node(config.name());
            if names.insert(config.name().to_string(), id).is_some() {
                return Err(ConfigError::DuplicateName(config.name().to_string()).into());
            }
        }

        for (index, config) in configs.iter().enumerate() {
            let child = FilterId::from(index);
            for dependency in config.dependencies() {
                let parent = names.get(dependency).copied().ok_or_else(|| ConfigError::UnknownDependency {
                    filter: config.name().to_string(),
                    dependency: dependency.clone(),
                })?;
                graph.add_edge(parent, child)?;
            }
        }

        let fetcher = fetcher.unwrap_or_else(default_fetcher);
        let container = mount.clone();

        let shared = Arc::new_cyclic(|this: &Weak<Shared>| {
            let filters = configs
                .into_iter()
                .enumerate()
                .map(|(index, config)| {
                    let id = FilterId::from(index);
                    let parent = graph
                        .parent_of(id)
                        .and_then(|parent| graph.get_node(parent))
                        .map(|node| node.name().to_string());

                    Filter::new(
                        config,
                        FilterContext {
                            id,
                            parent,
                            mount: &container,
                            fetcher: fetcher.clone(),
                            on_updated: update_hook(this.clone()),
                        },
                    )
                })
                .collect();

            Shared {
                filters,
                names,
                graph,
                state: Mutex::new(FilterSetState::Initialising),
                on_update,
                container,
            }
        });

        debug!(filters = shared.filters.len(), "filter set built");
        Ok(Self { shared })
    }

    /// Build the set and wait for its first settlement.
    pub async fn mount(mount: &Surface, config: FilterSetConfig) -> Result<Self, FilterError> {
        let set = Self::new(mount, config)?;
        set.initialise().await;
        Ok(set)
    }

    /// Load every root filter and the cascades they start, then report
    /// once.
    pub async fn initialise(&self) {
        let shared = &self.shared;
        shared.set_state(FilterSetState::Initialising);

        join_all(shared.roots().map(|filter| filter.init())).await;

        shared.set_state(FilterSetState::Idle);
        shared.emit();
    }

    /// Re-apply every root filter's default selection, then report once.
    ///
    /// Data is not fetched again for the roots; their dependents reload
    /// through the normal cascade.
    pub async fn reset(&self) {
        let shared = &self.shared;
        shared.set_state(FilterSetState::Resetting);

        let results = join_all(shared.roots().map(|filter| filter.reset())).await;
        if let Some(err) = results.into_iter().find_map(Result::err) {
            shared.catch_generic_error(&err);
        }

        shared.set_state(FilterSetState::Idle);
        shared.emit();
    }

    /// Every filter, in declaration order.
    pub fn get_instances(&self) -> &[Arc<Filter>] {
        &self.shared.filters
    }

    pub fn filter(&self, name: &str) -> Option<&Arc<Filter>> {
        let id = self.shared.names.get(name)?;
        self.shared.filters.get(id.index())
    }

    pub fn state(&self) -> FilterSetState {
        self.shared.state()
    }

    /// The current state and selection of every filter.
    pub fn snapshot(&self) -> Vec<FilterSnapshot> {
        self.shared.snapshot()
    }

    pub fn graph(&self) -> &DependencyGraph {
        &self.shared.graph
    }

    /// The surface the filters are mounted on.
    pub fn container(&self) -> &Surface {
        &self.shared.container
    }
}

impl std::fmt::Debug for FilterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSet")
            .field("state", &self.state())
            .field("filters", &self.shared.filters)
            .finish()
    }
}

/// Hook handed to every filter: runs the cascade for the updated filter.
fn update_hook(shared: Weak<Shared>) -> UpdateHook {
    Arc::new(move |id: FilterId| -> BoxFuture<'static, ()> {
        match shared.upgrade() {
            Some(shared) => shared.on_filter_updated(id),
            None => Box::pin(future::ready(())),
        }
    })
}

impl Shared {
    fn state(&self) -> FilterSetState {
        *self.state.lock()
    }

    fn set_state(&self, next: FilterSetState) {
        let previous = std::mem::replace(&mut *self.state.lock(), next);
        if previous != next {
            debug!(?previous, ?next, "filter set state changed");
        }
    }

    fn roots(&self) -> impl Iterator<Item = &Arc<Filter>> + '_ {
        self.graph.roots().filter_map(|id| self.filters.get(id.index()))
    }

    fn snapshot(&self) -> Vec<FilterSnapshot> {
        self.filters.iter().map(|filter| filter.current_option()).collect()
    }

    fn emit(&self) {
        let Some(on_update) = self.on_update.as_ref() else {
            return;
        };
        let snapshot = self.snapshot();
        debug!(filters = snapshot.len(), "reporting filter set update");
        on_update(&snapshot);
    }

    /// Flag every dependent of `id` as loading, then return the cascade.
    ///
    /// The flags are set before the returned future is first polled.
    fn on_filter_updated(self: Arc<Self>, id: FilterId) -> BoxFuture<'static, ()> {
        for dependent in self.graph.affected(id) {
            if let Some(filter) = self.filters.get(dependent.index()) {
                filter.set_state(FilterState::Loading);
            }
        }

        Box::pin(async move {
            match self.update_filter_tree(id).await {
                Ok(()) => {
                    if self.state() == FilterSetState::Error {
                        self.set_state(FilterSetState::Idle);
                    }
                }
                Err(err) => self.catch_generic_error(&err),
            }

            if !self.state().suppresses_updates() {
                self.emit();
            }
        })
    }

    /// Reload the dependents of `origin` generation by generation.
    async fn update_filter_tree(&self, origin: FilterId) -> Result<(), FilterError> {
        let mut level: Children = smallvec![origin];
        let mut depth = 0usize;

        loop {
            let next = self.graph.next_level(&level);
            if next.is_empty() {
                return Ok(());
            }
            depth += 1;
            debug!(origin = %self.name_of(origin), level = depth, filters = next.len(), "resolving cascade level");

            let updates = next.iter().filter_map(|&child| {
                let parent = self.initiator(child)?;
                let child = self.filters.get(child.index())?;
                Some(child.dependency_did_update(parent))
            });
            let mut failures = join_all(updates).await.into_iter().filter_map(Result::err);

            if let Some(first) = failures.next() {
                return Err(FilterError::AggregateCascade {
                    origin: self.name_of(origin).to_string(),
                    failures: 1 + failures.count(),
                    first: Box::new(first),
                });
            }

            level = next;
        }
    }

    /// The filter `child` is updated from: its stored parent, the last
    /// filter it declares.
    fn initiator(&self, child: FilterId) -> Option<&Filter> {
        let parent = self.graph.parent_of(child)?;
        self.filters.get(parent.index()).map(Arc::as_ref)
    }

    fn catch_generic_error(&self, err: &FilterError) {
        warn!(error = %err, "filter set update failed");
        for filter in &self.filters {
            filter.set_state(FilterState::Error);
        }
        if !self.state().suppresses_updates() {
            self.set_state(FilterSetState::Error);
        }
    }

    fn name_of(&self, id: FilterId) -> &str {
        self.filters.get(id.index()).map(|filter| filter.name()).unwrap_or("<unknown>")
    }
}
