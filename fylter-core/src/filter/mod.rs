//! Filters
//!
//! A filter is one selectable control whose options may depend on the
//! selection of another filter. This module contains:
//!
//! - `config`: how a filter is described, in code or as JSON
//! - `instance`: the live filter and its load protocol
//! - `option`: the option type and selection lookup
//! - `state`: the lifecycle state machine

mod config;
mod instance;
mod option;
mod state;

pub use config::{
    disable_when_value, BeforeOptionUpdate, DataFn, DataSource, DecideDefault, DecideEnabled,
    FilterConfig, FilterDecl, FilterSetDecl, Middlewares, DEFAULT_WRAPPER_CLASS,
};
pub(crate) use instance::FilterContext;
pub use instance::{Filter, UpdateHook};
pub use option::{find_option, FilterOption};
pub use state::FilterState;
