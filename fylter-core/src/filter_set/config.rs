//! Filter set configuration.

use std::sync::Arc;

use crate::fetch::Fetcher;
use crate::filter::{FilterConfig, FilterSetDecl};
use crate::snapshot::FilterSnapshot;

/// Receives the full snapshot each time the set settles.
pub type UpdateCallback = Arc<dyn Fn(&[FilterSnapshot]) + Send + Sync>;

/// Everything needed to build a [`FilterSet`](super::FilterSet).
pub struct FilterSetConfig {
    pub(crate) filters: Vec<FilterConfig>,
    pub(crate) on_update: Option<UpdateCallback>,
    pub(crate) fetcher: Option<Arc<dyn Fetcher>>,
}

impl FilterSetConfig {
    /// Filters in declaration order. Snapshots follow the same order.
    pub fn new(filters: Vec<FilterConfig>) -> Self {
        Self {
            filters,
            on_update: None,
            fetcher: None,
        }
    }

    pub fn on_update<F>(mut self, f: F) -> Self
    where
        F: Fn(&[FilterSnapshot]) + Send + Sync + 'static,
    {
        self.on_update = Some(Arc::new(f));
        self
    }

    /// Resolve URL data sources with `fetcher` instead of the default.
    pub fn fetcher(mut self, fetcher: impl Fetcher + 'static) -> Self {
        self.fetcher = Some(Arc::new(fetcher));
        self
    }

    pub fn shared_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn filters(&self) -> &[FilterConfig] {
        &self.filters
    }
}

impl From<FilterSetDecl> for FilterSetConfig {
    fn from(decl: FilterSetDecl) -> Self {
        Self::new(decl.into_configs())
    }
}

impl std::fmt::Debug for FilterSetConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterSetConfig")
            .field("filters", &self.filters)
            .field("on_update", &self.on_update.is_some())
            .field("fetcher", &self.fetcher.is_some())
            .finish()
    }
}
