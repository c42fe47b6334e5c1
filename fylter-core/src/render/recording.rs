//! Headless renderer that records every call it receives.

use std::sync::Arc;

use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;

use super::{FilterRenderer, SelectedCallback, Surface};
use crate::filter::FilterOption;

/// A call received by a [`RecordingRenderer`].
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCall {
    SetValue(String),
    Render {
        title: String,
        options: Vec<FilterOption>,
        current: Option<String>,
    },
    SetLoading(String),
    RemoveLoading(String),
    SetDisabled(String),
    SetError(String),
    SetContainer,
}

/// Visible state derived from the calls received so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UiState {
    #[default]
    Idle,
    Loading,
    Disabled,
    Error,
}

#[derive(Default)]
struct Recording {
    calls: Vec<RenderCall>,
    callback: Option<SelectedCallback>,
    container: Option<Surface>,
    value: Option<String>,
    ui_state: UiState,
}

/// Records calls instead of drawing. Clones share the same recording.
#[derive(Clone, Default)]
pub struct RecordingRenderer {
    recording: Arc<Mutex<Recording>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls received, oldest first.
    pub fn calls(&self) -> Vec<RenderCall> {
        self.recording.lock().calls.clone()
    }

    /// Forget the calls received so far.
    pub fn clear_calls(&self) {
        self.recording.lock().calls.clear();
    }

    pub fn ui_state(&self) -> UiState {
        self.recording.lock().ui_state
    }

    /// The value last pushed with `set_value` or picked with `select`.
    pub fn value(&self) -> Option<String> {
        self.recording.lock().value.clone()
    }

    pub fn container(&self) -> Option<Surface> {
        self.recording.lock().container.clone()
    }

    /// The arguments of the most recent `render` call.
    pub fn last_render(&self) -> Option<(String, Vec<FilterOption>, Option<String>)> {
        self.recording.lock().calls.iter().rev().find_map(|call| match call {
            RenderCall::Render {
                title,
                options,
                current,
            } => Some((title.clone(), options.clone(), current.clone())),
            _ => None,
        })
    }

    /// Number of `render` calls received.
    pub fn render_count(&self) -> usize {
        self.recording
            .lock()
            .calls
            .iter()
            .filter(|call| matches!(call, RenderCall::Render { .. }))
            .count()
    }

    /// Simulate the user picking `id`.
    pub fn select(&self, id: &str) -> BoxFuture<'static, ()> {
        let callback = {
            let mut recording = self.recording.lock();
            recording.value = Some(id.to_string());
            recording.callback.clone()
        };
        match callback {
            Some(callback) => callback(id.to_string()),
            None => Box::pin(future::ready(())),
        }
    }

    fn record(&self, call: RenderCall, ui_state: Option<UiState>) {
        let mut recording = self.recording.lock();
        recording.calls.push(call);
        if let Some(state) = ui_state {
            recording.ui_state = state;
        }
    }
}

impl FilterRenderer for RecordingRenderer {
    fn set_selected_callback(&self, callback: SelectedCallback) {
        self.recording.lock().callback = Some(callback);
    }

    fn set_value(&self, id: &str) {
        self.recording.lock().value = Some(id.to_string());
        self.record(RenderCall::SetValue(id.to_string()), None);
    }

    fn render(&self, title: &str, options: &[FilterOption], current: Option<&str>) {
        self.record(
            RenderCall::Render {
                title: title.to_string(),
                options: options.to_vec(),
                current: current.map(str::to_string),
            },
            None,
        );
    }

    fn set_loading_state(&self, title: &str) {
        self.record(RenderCall::SetLoading(title.to_string()), Some(UiState::Loading));
    }

    fn remove_loading_state(&self, title: &str) {
        self.record(RenderCall::RemoveLoading(title.to_string()), Some(UiState::Idle));
    }

    fn set_disabled_state(&self, title: &str) {
        self.record(RenderCall::SetDisabled(title.to_string()), Some(UiState::Disabled));
    }

    fn set_error_state(&self, title: &str) {
        self.record(RenderCall::SetError(title.to_string()), Some(UiState::Error));
    }

    fn set_container(&self, surface: Surface) {
        self.recording.lock().container = Some(surface);
        self.record(RenderCall::SetContainer, None);
    }
}
