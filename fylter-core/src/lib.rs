//! Fylter Core
//!
//! This crate provides the engine behind sets of interdependent selection
//! filters: controls whose options depend on what is selected in another
//! control. It implements:
//!
//! - A dependency graph with cycle and duplicate checks
//! - A per-filter lifecycle state machine with rendering side effects
//! - Level-by-level cascading updates with concurrent loads per level
//! - Snapshot reporting of every filter's state and selection
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - `graph`: Dependency nodes, edge validation and cascade levels
//! - `filter`: Filter configuration, state machine and load protocol
//! - `filter_set`: Cascade orchestration and update reporting
//! - `render`: Rendering capability, surfaces and default controls
//! - `fetch`: Fetch capability for URL data sources
//! - `snapshot`: Reported records and their encodings
//!
//! # Example
//!
//! ```rust,ignore
//! use fylter_core::{disable_when_value, DataSource, FilterConfig, FilterSet, FilterSetConfig, Surface};
//!
//! let competition = FilterConfig::new("competition", |_| DataSource::Url("https://api/competitions".into()))
//!     .decide_default(|_| Ok("-1".to_string()));
//!
//! let season = FilterConfig::new("season", |_| {
//!     DataSource::Url("https://api/competitions/{{competition}}/seasons".into())
//! })
//! .depends_on(["competition"])
//! .enabled_policy(disable_when_value("-1"));
//!
//! let config = FilterSetConfig::new(vec![competition, season])
//!     .on_update(|snapshot| println!("{}", fylter_core::snapshot::to_json(snapshot).unwrap()));
//!
//! let set = FilterSet::mount(&Surface::new(), config).await?;
//! set.filter("competition").unwrap().on_select("1").await;
//! ```

pub mod error;
pub mod fetch;
pub mod filter;
pub mod filter_set;
pub mod graph;
pub mod render;
pub mod snapshot;

pub use error::{BoxError, ConfigError, CyclicDependencyError, EdgeConflict, FetchError, FilterError};
pub use fetch::{default_fetcher, Fetcher, NoFetcher};
#[cfg(feature = "http")]
pub use fetch::HttpFetcher;
pub use filter::{
    disable_when_value, DataSource, Filter, FilterConfig, FilterDecl, FilterOption, FilterSetDecl, FilterState,
    Middlewares,
};
pub use filter_set::{FilterSet, FilterSetConfig, FilterSetState, UpdateCallback};
pub use graph::{DependencyGraph, FilterId};
pub use render::{FilterRenderer, RecordingRenderer, SelectRenderer, Surface};
pub use snapshot::FilterSnapshot;
