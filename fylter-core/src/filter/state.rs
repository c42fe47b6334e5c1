//! Filter State Machine
//!
//! ```text
//! Building ──> Loading ──> Idle
//!                 ^   ├──> Disabled
//!                 │   └──> Error
//!                 └── Idle | Disabled | Error
//! ```
//!
//! `Building` is only occupied while a filter is constructed. Every cascade
//! moves a filter back to `Loading` before it settles again. Settled states
//! may also move straight to `Disabled` or `Error` when a parent disables
//! the filter or the whole set fails.
//!
//! Entering a state fires the matching hooks on the filter's renderer,
//! synchronously and once per transition.

use serde::{Deserialize, Serialize};

use crate::render::FilterRenderer;

/// The state of a single filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterState {
    /// The filter is being constructed.
    Building,
    /// The filter is fetching and transforming its options.
    Loading,
    /// The filter has options and a selection, ready for input.
    Idle,
    /// The filter has no options or was disabled by its parent.
    Disabled,
    /// Loading failed, or the filter's parent is in error.
    Error,
}

impl FilterState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(self, next: FilterState) -> bool {
        use FilterState::*;

        match (self, next) {
            (_, Building) => false,
            (Building, Loading) => true,
            (Building, _) => false,
            (Loading, Idle | Disabled | Error) => true,
            (Idle | Disabled | Error, Loading | Disabled | Error) => true,
            _ => false,
        }
    }

    /// Whether the filter has finished its current load.
    pub fn is_settled(self) -> bool {
        matches!(self, FilterState::Idle | FilterState::Disabled | FilterState::Error)
    }

    /// Fire the renderer hooks for entering this state.
    pub(crate) fn apply_effects(self, ui: &dyn FilterRenderer, title: &str) {
        match self {
            FilterState::Building => {}
            FilterState::Loading => ui.set_loading_state(title),
            FilterState::Idle => ui.remove_loading_state(title),
            FilterState::Disabled => {
                ui.remove_loading_state(title);
                ui.set_disabled_state(title);
            }
            FilterState::Error => {
                ui.remove_loading_state(title);
                ui.set_error_state(title);
            }
        }
    }
}

impl std::fmt::Display for FilterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FilterState::Building => "building",
            FilterState::Loading => "loading",
            FilterState::Idle => "idle",
            FilterState::Disabled => "disabled",
            FilterState::Error => "error",
        };
        f.write_str(name)
    }
}
