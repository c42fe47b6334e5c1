//! Default single-choice renderer.
//!
//! Draws a label followed by one row per option, the selected row marked
//! with `>`:
//!
//! ```text
//! competition
//! > All
//!   Comp 1
//!   Comp 2
//! ```
//!
//! State classes on the surface mirror the control's state:
//! `filter--loading`, `filter--disabled` and `filter--overflow` (the control
//! is wider than its surface).

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use tracing::warn;

use super::{FilterRenderer, SelectedCallback, Surface};
use crate::filter::FilterOption;

const LOADING_CLASS: &str = "filter--loading";
const DISABLED_CLASS: &str = "filter--disabled";
const OVERFLOW_CLASS: &str = "filter--overflow";

#[derive(Default)]
struct SelectState {
    container: Option<Surface>,
    callback: Option<SelectedCallback>,
    title: String,
    options: Vec<FilterOption>,
    selected: Option<String>,
}

/// Text select control. Clones share the same control.
#[derive(Clone, Default)]
pub struct SelectRenderer {
    state: Arc<Mutex<SelectState>>,
}

impl SelectRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently selected value.
    pub fn value(&self) -> Option<String> {
        self.state.lock().selected.clone()
    }

    /// Options currently drawn.
    pub fn options(&self) -> Vec<FilterOption> {
        self.state.lock().options.clone()
    }

    /// Simulate the user picking `id`.
    ///
    /// Re-evaluates the overflow class and notifies the filter. The returned
    /// future settles when the resulting cascade has settled.
    pub fn select(&self, id: &str) -> BoxFuture<'static, ()> {
        let callback = {
            let mut state = self.state.lock();
            state.selected = Some(id.to_string());
            draw(&state);
            state.callback.clone()
        };

        match callback {
            Some(callback) => callback(id.to_string()),
            None => {
                warn!(value = id, "select renderer has no selected callback");
                Box::pin(future::ready(()))
            }
        }
    }

    fn show_placeholder(&self, title: &str, name: &str, value: &str) {
        let mut state = self.state.lock();
        state.title = title.to_string();
        state.options = vec![FilterOption::new(name, value)];
        state.selected = Some(value.to_string());
        draw(&state);
    }

    fn with_container(&self, f: impl FnOnce(&Surface)) {
        if let Some(container) = self.state.lock().container.as_ref() {
            f(container);
        }
    }
}

/// Redraw the control into its surface.
fn draw(state: &SelectState) {
    let Some(container) = state.container.as_ref() else {
        return;
    };

    let mut lines = Vec::with_capacity(state.options.len() + 1);
    lines.push(state.title.clone());
    for option in &state.options {
        let marker = if state.selected.as_deref() == Some(option.value.as_str()) {
            '>'
        } else {
            ' '
        };
        lines.push(format!("{marker} {}", option.name));
    }

    let measured = lines.iter().map(|line| line.chars().count()).max().unwrap_or(0);
    match container.width() {
        Some(width) if measured > width => container.add_class(OVERFLOW_CLASS),
        _ => container.remove_class(OVERFLOW_CLASS),
    }

    container.set_lines(lines);
}

impl FilterRenderer for SelectRenderer {
    fn set_selected_callback(&self, callback: SelectedCallback) {
        self.state.lock().callback = Some(callback);
    }

    fn set_value(&self, id: &str) {
        let mut state = self.state.lock();
        state.selected = Some(id.to_string());
        draw(&state);
    }

    fn render(&self, title: &str, options: &[FilterOption], current: Option<&str>) {
        let mut state = self.state.lock();
        state.title = title.to_string();
        state.options = options.to_vec();
        state.selected = current.map(str::to_string);
        draw(&state);
    }

    fn set_loading_state(&self, title: &str) {
        self.show_placeholder(title, "Loading", "-1");
        self.with_container(|c| {
            c.remove_class(DISABLED_CLASS);
            c.add_class(LOADING_CLASS);
        });
    }

    fn remove_loading_state(&self, _title: &str) {
        self.with_container(|c| c.remove_class(LOADING_CLASS));
    }

    fn set_disabled_state(&self, title: &str) {
        self.show_placeholder(title, "Disabled", "disabled");
        self.with_container(|c| {
            c.add_class(DISABLED_CLASS);
            c.remove_class(LOADING_CLASS);
        });
    }

    fn set_error_state(&self, title: &str) {
        self.show_placeholder(title, "Error", "-1");
    }

    fn set_container(&self, surface: Surface) {
        let mut state = self.state.lock();
        state.container = Some(surface);
        draw(&state);
    }
}
