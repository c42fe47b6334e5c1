//! Rendering Capability
//!
//! The engine never draws anything itself. Each filter owns one
//! [`FilterRenderer`] and drives it through state changes: the renderer is
//! told when to show a loading placeholder, when to draw the options, and
//! when the filter becomes disabled or fails.
//!
//! User input flows the other way: the renderer receives a
//! [`SelectedCallback`] and invokes it with the chosen option value. The
//! returned future settles once the whole cascade caused by the selection
//! has settled.
//!
//! Renderers are shared handles. Implementations keep their state behind a
//! lock so a caller can hold a clone of the renderer it configured and read
//! it back or simulate input later.
//!
//! Provided implementations:
//!
//! - [`SelectRenderer`]: a labelled single-choice control drawn as text into
//!   a [`Surface`]. Used when a filter configures no renderer.
//! - [`RecordingRenderer`]: records every call; useful for headless hosts
//!   and tests.

mod recording;
mod select;
mod surface;

use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::filter::FilterOption;

pub use recording::{RecordingRenderer, RenderCall, UiState};
pub use select::SelectRenderer;
pub use surface::Surface;

/// Callback handed to a renderer; invoked with the selected option value.
pub type SelectedCallback = Arc<dyn Fn(String) -> BoxFuture<'static, ()> + Send + Sync>;

/// The set of operations a filter performs on its visible control.
pub trait FilterRenderer: Send + Sync {
    /// Store the callback to invoke when the user picks an option.
    fn set_selected_callback(&self, callback: SelectedCallback);

    /// Select an option without notifying the callback.
    fn set_value(&self, id: &str);

    /// Draw the control with the given options and current selection.
    fn render(&self, title: &str, options: &[FilterOption], current: Option<&str>);

    fn set_loading_state(&self, title: &str);

    fn remove_loading_state(&self, title: &str);

    fn set_disabled_state(&self, title: &str);

    fn set_error_state(&self, title: &str);

    /// Attach the surface the control draws into.
    fn set_container(&self, surface: Surface);
}

impl<R: FilterRenderer + ?Sized> FilterRenderer for Arc<R> {
    fn set_selected_callback(&self, callback: SelectedCallback) {
        (**self).set_selected_callback(callback)
    }

    fn set_value(&self, id: &str) {
        (**self).set_value(id)
    }

    fn render(&self, title: &str, options: &[FilterOption], current: Option<&str>) {
        (**self).render(title, options, current)
    }

    fn set_loading_state(&self, title: &str) {
        (**self).set_loading_state(title)
    }

    fn remove_loading_state(&self, title: &str) {
        (**self).remove_loading_state(title)
    }

    fn set_disabled_state(&self, title: &str) {
        (**self).set_disabled_state(title)
    }

    fn set_error_state(&self, title: &str) {
        (**self).set_error_state(title)
    }

    fn set_container(&self, surface: Surface) {
        (**self).set_container(surface)
    }
}
