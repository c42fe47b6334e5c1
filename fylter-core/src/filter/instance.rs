//! Filter Implementation
//!
//! A filter owns one control: its configuration, its current options and
//! selection, and its renderer. The filter set drives it through four
//! entry points:
//!
//! - [`Filter::init`] loads a root filter for the first time.
//! - [`Filter::dependency_did_update`] reloads a dependent after its parent
//!   settled.
//! - [`Filter::on_select`] records a user selection and starts a cascade.
//! - [`Filter::reset`] re-applies the default selection without fetching.
//!
//! # Loading
//!
//! [`Filter::get_options_data`] either disables the filter (when the
//! updating filter is disabled or the enablement policy says so) or loads
//! it: the data function yields a URL, literal items or a future; the raw
//! items go through `before_option_update`; a non-empty list picks its
//! default and renders, an empty list disables the filter. Failures are
//! logged and leave the filter in `Error`. Loading never fails for the
//! caller.

use std::sync::{Arc, Weak};

use futures_util::future::{self, BoxFuture};
use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use super::config::{json_kind, DataFn, DataSource, FilterConfig, Middlewares};
use super::option::{find_option, FilterOption};
use super::state::FilterState;
use crate::error::{ConfigError, FilterError};
use crate::fetch::Fetcher;
use crate::graph::FilterId;
use crate::render::{FilterRenderer, SelectRenderer, SelectedCallback, Surface};
use crate::snapshot::FilterSnapshot;

/// Invoked when a filter's selection changed. Settles once the cascade
/// started by the change has settled.
pub type UpdateHook = Arc<dyn Fn(FilterId) -> BoxFuture<'static, ()> + Send + Sync>;

/// Everything a filter needs from the set that owns it.
pub(crate) struct FilterContext<'a> {
    pub id: FilterId,
    /// Name of the filter this one depends on, used for URL templates.
    pub parent: Option<String>,
    /// Surface the filter's own container is appended to.
    pub mount: &'a Surface,
    pub fetcher: Arc<dyn Fetcher>,
    pub on_updated: UpdateHook,
}

#[derive(Debug)]
struct FilterInner {
    state: FilterState,
    options: Vec<FilterOption>,
    /// `None` is the unset selection.
    current_id: Option<String>,
}

/// One selectable control and its configuration.
pub struct Filter {
    id: FilterId,
    name: String,
    parent: Option<String>,
    dependencies: Vec<String>,
    data: DataFn,
    middlewares: Middlewares,
    wrapper_class: String,
    inner: Mutex<FilterInner>,
    ui: Box<dyn FilterRenderer>,
    container: Surface,
    fetcher: Arc<dyn Fetcher>,
    on_updated: UpdateHook,
}

impl Filter {
    /// Build the filter, mount its container and move it to `Loading`.
    pub(crate) fn new(config: FilterConfig, ctx: FilterContext<'_>) -> Arc<Self> {
        let FilterConfig {
            name,
            data,
            depends_on,
            middlewares,
            renderer,
            wrapper_class,
        } = config;

        let container = ctx.mount.append_child();
        container.add_class(&wrapper_class);

        let filter = Arc::new_cyclic(|this: &Weak<Filter>| {
            let ui = renderer.unwrap_or_else(|| Box::new(SelectRenderer::new()) as Box<dyn FilterRenderer>);
            ui.set_selected_callback(selected_callback(this.clone()));
            ui.set_container(container.clone());

            Filter {
                id: ctx.id,
                name,
                parent: ctx.parent,
                dependencies: depends_on,
                data,
                middlewares,
                wrapper_class,
                inner: Mutex::new(FilterInner {
                    state: FilterState::Building,
                    options: Vec::new(),
                    current_id: None,
                }),
                ui,
                container,
                fetcher: ctx.fetcher,
                on_updated: ctx.on_updated,
            }
        });

        filter.set_state(FilterState::Loading);
        filter
    }

    pub fn id(&self) -> FilterId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Names of the filters this filter depends on.
    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn wrapper_class(&self) -> &str {
        &self.wrapper_class
    }

    pub fn state(&self) -> FilterState {
        self.inner.lock().state
    }

    pub fn is_disabled(&self) -> bool {
        self.state() == FilterState::Disabled
    }

    /// The options from the last successful load.
    pub fn options(&self) -> Vec<FilterOption> {
        self.inner.lock().options.clone()
    }

    /// The selected value, `None` when unset.
    pub fn current_id(&self) -> Option<String> {
        self.inner.lock().current_id.clone()
    }

    /// The filter's state and, when the selection matches an option, that
    /// option's fields.
    pub fn current_option(&self) -> FilterSnapshot {
        let inner = self.inner.lock();
        let option = find_option(&inner.options, inner.current_id.as_deref());

        FilterSnapshot {
            filter_name: self.name.clone(),
            state: inner.state,
            name: option.map(|o| o.name.clone()),
            value: option.map(|o| o.value.clone()),
            extra: option.and_then(|o| o.extra.clone()),
        }
    }

    pub fn ui(&self) -> &dyn FilterRenderer {
        self.ui.as_ref()
    }

    /// The surface this filter's control is drawn into.
    pub fn container(&self) -> &Surface {
        &self.container
    }

    /// Move to `next` and fire the renderer hooks for it.
    ///
    /// Re-entering the current state is a no-op; illegal transitions are
    /// logged and ignored.
    pub(crate) fn set_state(&self, next: FilterState) {
        let previous = {
            let mut inner = self.inner.lock();
            let previous = inner.state;
            if previous == next {
                return;
            }
            if !previous.can_transition_to(next) {
                warn!(filter = %self.name, from = %previous, to = %next, "ignoring illegal state transition");
                return;
            }
            inner.state = next;
            previous
        };

        debug!(filter = %self.name, from = %previous, to = %next, "filter state changed");
        next.apply_effects(self.ui.as_ref(), &self.name);
    }

    pub(crate) fn set_current_id(&self, id: Option<String>) {
        self.inner.lock().current_id = id;
    }

    /// Load the root filter, then report the resulting selection.
    pub async fn init(&self) {
        self.get_options_data(None).await;
        (self.on_updated)(self.id).await;
    }

    /// Record a user selection and start the cascade it causes.
    ///
    /// A filter left in `Error` by a failed cascade recovers when the
    /// selection names one of its options.
    pub fn on_select(&self, id: impl Into<String>) -> BoxFuture<'static, ()> {
        self.set_current_id(Some(id.into()));
        if self.state() == FilterState::Error && self.current_option().has_selection() {
            self.set_state(FilterState::Loading);
            self.render();
            self.set_state(FilterState::Idle);
        }
        (self.on_updated)(self.id)
    }

    /// Re-apply the default selection over the current options.
    ///
    /// Pushes the default into the renderer and cascades from there; data is
    /// not fetched again.
    pub async fn reset(&self) -> Result<(), FilterError> {
        let options = self.options();
        let default = (self.middlewares.decide_default)(&options)
            .map_err(|e| FilterError::transform(&self.name, e))?;

        self.ui.set_value(&default);
        self.on_select(default).await;
        Ok(())
    }

    /// Called by the filter set after `parent` settled.
    ///
    /// A parent in `Error` puts this filter in `Error` without loading and
    /// fails the update. A parent still `Loading` leaves this filter alone.
    pub async fn dependency_did_update(&self, parent: &Filter) -> Result<(), FilterError> {
        if parent.state() == FilterState::Error {
            self.set_state(FilterState::Error);
            return Err(FilterError::ParentInError {
                filter: self.name.clone(),
                parent: parent.name.clone(),
            });
        }

        if parent.state() == FilterState::Loading {
            // The parent's own cascade reaches this filter once it settles.
            debug!(filter = %self.name, parent = %parent.name, "parent still loading, update deferred");
            return Ok(());
        }

        self.get_options_data(Some(parent)).await;
        Ok(())
    }

    /// (Re)load this filter's options. Always settles; failures end in
    /// `Error`.
    pub async fn get_options_data(&self, initiating: Option<&Filter>) {
        if let Some(initiating) = initiating {
            if initiating.is_disabled() || !(self.middlewares.decide_enabled)(initiating) {
                self.set_current_id(None);
                self.set_state(FilterState::Disabled);
                return;
            }
        }

        self.set_state(FilterState::Loading);
        if let Err(err) = self.load_options(initiating).await {
            self.warn(&err);
            self.set_state(FilterState::Error);
        }
    }

    async fn load_options(&self, initiating: Option<&Filter>) -> Result<(), FilterError> {
        let raw = self.raw_items(initiating).await?;
        if self.state() != FilterState::Loading {
            // Moved on while the data was in flight, e.g. a failed cascade.
            debug!(filter = %self.name, state = %self.state(), "discarding stale options");
            return Ok(());
        }

        let options = (self.middlewares.before_option_update)(raw)
            .map_err(|e| FilterError::transform(&self.name, e))?;

        if options.is_empty() {
            self.inner.lock().options = options;
            self.set_state(FilterState::Disabled);
            return Ok(());
        }

        let default = (self.middlewares.decide_default)(&options);
        self.inner.lock().options = options;
        let default = default.map_err(|e| FilterError::transform(&self.name, e))?;
        self.set_current_id(Some(default));

        self.render();
        self.set_state(FilterState::Idle);
        Ok(())
    }

    async fn raw_items(&self, initiating: Option<&Filter>) -> Result<Vec<Value>, FilterError> {
        match (self.data)(initiating) {
            DataSource::Url(template) => {
                let url = self.build_api_url(&template, initiating);
                let document = self.fetcher.fetch(url).await?;
                Ok(self.items_from_document(document))
            }
            DataSource::Literal(items) => Ok(items),
            DataSource::Pending(items) => items.await.map_err(|source| FilterError::Data {
                filter: self.name.clone(),
                source,
            }),
            DataSource::Invalid(found) => {
                self.warn(&ConfigError::UnexpectedDataShape {
                    filter: self.name.clone(),
                    found,
                });
                Ok(Vec::new())
            }
        }
    }

    /// Accept a bare array or a `{ "data": [...] }` envelope.
    fn items_from_document(&self, document: Value) -> Vec<Value> {
        match document {
            Value::Array(items) => items,
            Value::Object(mut envelope) if envelope.get("data").is_some_and(Value::is_array) => {
                match envelope.remove("data") {
                    Some(Value::Array(items)) => items,
                    _ => Vec::new(),
                }
            }
            other => {
                self.warn(&ConfigError::UnexpectedDataShape {
                    filter: self.name.clone(),
                    found: format!("{} in the fetched document", json_kind(&other)),
                });
                Vec::new()
            }
        }
    }

    /// Substitute `{{Parent}}` with the parent's current value.
    ///
    /// Only the filter's own parent is substituted, and only when it is the
    /// filter that triggered the load.
    fn build_api_url(&self, template: &str, initiating: Option<&Filter>) -> String {
        let (Some(parent), Some(initiating)) = (self.parent.as_deref(), initiating) else {
            return template.to_string();
        };
        if initiating.name() != parent {
            return template.to_string();
        }

        let token = format!("{{{{{parent}}}}}");
        match initiating.current_option().value {
            Some(value) => {
                let url = template.replacen(&token, &value, 1);
                trace!(filter = %self.name, %url, "built data url");
                url
            }
            None => template.to_string(),
        }
    }

    fn render(&self) {
        let (options, current) = {
            let inner = self.inner.lock();
            (inner.options.clone(), inner.current_id.clone())
        };
        self.ui.render(&self.name, &options, current.as_deref());
    }

    fn warn(&self, err: &dyn std::fmt::Display) {
        warn!(filter = %self.name, error = %err, "Filter ({}): {}", self.name, err);
    }
}

/// Callback handed to the renderer: forwards selections to the filter.
fn selected_callback(filter: Weak<Filter>) -> SelectedCallback {
    Arc::new(move |id: String| -> BoxFuture<'static, ()> {
        match filter.upgrade() {
            Some(filter) => filter.on_select(id),
            None => Box::pin(future::ready(())),
        }
    })
}

impl std::fmt::Debug for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("Filter")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("parent", &self.parent)
            .field("state", &inner.state)
            .field("current_id", &inner.current_id)
            .field("options", &inner.options.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{BoxError, FetchError};
    use crate::filter::config::disable_when_value;
    use crate::render::{RecordingRenderer, RenderCall, UiState};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Harness {
        mount: Surface,
        updates: Arc<AtomicUsize>,
        urls: Arc<Mutex<Vec<String>>>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                mount: Surface::new(),
                updates: Arc::new(AtomicUsize::new(0)),
                urls: Arc::new(Mutex::new(Vec::new())),
            }
        }

        fn build(&self, id: usize, parent: Option<&str>, config: FilterConfig) -> Arc<Filter> {
            let updates = self.updates.clone();
            let urls = self.urls.clone();
            let fetcher = move |url: String| -> BoxFuture<'static, Result<Value, FetchError>> {
                urls.lock().push(url.clone());
                let result = if url.contains("broken") {
                    Err(FetchError::Status(500))
                } else {
                    Ok(json!({ "data": [{ "name": url.clone(), "value": url }] }))
                };
                Box::pin(future::ready(result))
            };

            Filter::new(
                config,
                FilterContext {
                    id: FilterId::from(id),
                    parent: parent.map(str::to_string),
                    mount: &self.mount,
                    fetcher: Arc::new(fetcher),
                    on_updated: Arc::new(move |_: FilterId| -> BoxFuture<'static, ()> {
                        updates.fetch_add(1, Ordering::SeqCst);
                        Box::pin(future::ready(()))
                    }),
                },
            )
        }
    }

    fn competitions() -> DataSource {
        DataSource::options([
            FilterOption::new("Comp 1", "1"),
            FilterOption::new("Comp 2", "2"),
            FilterOption::new("All", "-1"),
        ])
    }

    #[test]
    fn construction_mounts_container_and_starts_loading() {
        let harness = Harness::new();
        let ui = RecordingRenderer::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions())
                .wrapper_class("filter filter--competition")
                .renderer(ui.clone()),
        );

        assert_eq!(filter.state(), FilterState::Loading);
        assert_eq!(ui.ui_state(), UiState::Loading);
        assert!(ui.container().unwrap().ptr_eq(filter.container()));
        assert!(filter.container().has_class("filter--competition"));
        assert_eq!(harness.mount.children().len(), 1);
    }

    #[tokio::test]
    async fn load_picks_default_and_renders() {
        let harness = Harness::new();
        let ui = RecordingRenderer::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions())
                .decide_default(|_| Ok("-1".to_string()))
                .renderer(ui.clone()),
        );

        filter.get_options_data(None).await;

        assert_eq!(filter.state(), FilterState::Idle);
        let snapshot = filter.current_option();
        assert_eq!(snapshot.value.as_deref(), Some("-1"));
        assert_eq!(snapshot.name.as_deref(), Some("All"));
        assert_eq!(ui.render_count(), 1);
        assert_eq!(ui.ui_state(), UiState::Idle);
    }

    #[tokio::test]
    async fn empty_options_disable_without_rendering() {
        let harness = Harness::new();
        let ui = RecordingRenderer::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("empty", |_| DataSource::Literal(Vec::new())).renderer(ui.clone()),
        );

        filter.get_options_data(None).await;

        assert_eq!(filter.state(), FilterState::Disabled);
        assert_eq!(ui.render_count(), 0);
        assert!(!filter.current_option().has_selection());
    }

    #[tokio::test]
    async fn transform_failure_ends_in_error() {
        let harness = Harness::new();
        let ui = RecordingRenderer::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions())
                .before_option_update(|_| Err("unexpected row".into()))
                .renderer(ui.clone()),
        );

        filter.get_options_data(None).await;

        assert_eq!(filter.state(), FilterState::Error);
        assert_eq!(ui.ui_state(), UiState::Error);
    }

    #[tokio::test]
    async fn default_policy_failure_ends_in_error() {
        let harness = Harness::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions())
                .decide_default(|_| Err(BoxError::from("no default"))),
        );

        filter.get_options_data(None).await;
        assert_eq!(filter.state(), FilterState::Error);
    }

    #[tokio::test]
    async fn rejected_future_ends_in_error() {
        let harness = Harness::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| {
                DataSource::pending(async { Err::<Vec<Value>, BoxError>("timed out".into()) })
            }),
        );

        filter.get_options_data(None).await;
        assert_eq!(filter.state(), FilterState::Error);
    }

    #[tokio::test]
    async fn rejected_future_keeps_its_cause() {
        let harness = Harness::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| {
                DataSource::pending(async { Err::<Vec<Value>, BoxError>("timed out".into()) })
            }),
        );

        let err = filter.load_options(None).await.unwrap_err();
        assert!(matches!(err, FilterError::Data { ref filter, .. } if filter == "competition"));
        let cause = std::error::Error::source(&err).map(ToString::to_string);
        assert_eq!(cause.as_deref(), Some("timed out"));
    }

    #[tokio::test]
    async fn update_waits_for_a_loading_parent() {
        let harness = Harness::new();
        let parent = harness.build(0, None, FilterConfig::new("competition", |_| competitions()));
        let child = harness.build(
            1,
            Some("competition"),
            FilterConfig::new("season", |_| DataSource::Url("http://api/{{competition}}".into())),
        );

        child.dependency_did_update(&parent).await.unwrap();
        assert_eq!(child.state(), FilterState::Loading);
        assert!(harness.urls.lock().is_empty());

        parent.get_options_data(None).await;
        child.dependency_did_update(&parent).await.unwrap();
        assert_eq!(harness.urls.lock().as_slice(), &["http://api/1".to_string()]);
        assert_eq!(child.state(), FilterState::Idle);
    }

    #[tokio::test]
    async fn invalid_shape_degrades_to_disabled() {
        let harness = Harness::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("odd", |_| DataSource::from_value(&json!({ "not": "a list" }))),
        );

        filter.get_options_data(None).await;
        assert_eq!(filter.state(), FilterState::Disabled);
    }

    #[tokio::test]
    async fn url_substitutes_parent_value() {
        let harness = Harness::new();
        let parent = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions()).decide_default(|_| Ok("2".to_string())),
        );
        let child = harness.build(
            1,
            Some("competition"),
            FilterConfig::new("season", |_| {
                DataSource::Url("http://api/{{competition}}/seasons?c={{competition}}".into())
            })
            .depends_on(["competition"]),
        );

        parent.get_options_data(None).await;
        child.dependency_did_update(&parent).await.unwrap();

        assert_eq!(
            harness.urls.lock().as_slice(),
            &["http://api/2/seasons?c={{competition}}".to_string()]
        );
        assert_eq!(child.state(), FilterState::Idle);
        assert_eq!(
            child.current_id().as_deref(),
            Some("http://api/2/seasons?c={{competition}}")
        );
    }

    #[tokio::test]
    async fn fetch_failure_ends_in_error() {
        let harness = Harness::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| DataSource::Url("http://api/broken".into())),
        );

        filter.get_options_data(None).await;
        assert_eq!(filter.state(), FilterState::Error);
    }

    #[tokio::test]
    async fn policy_disables_without_fetching() {
        let harness = Harness::new();
        let parent = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions()).decide_default(|_| Ok("-1".to_string())),
        );
        let ui = RecordingRenderer::new();
        let child = harness.build(
            1,
            Some("competition"),
            FilterConfig::new("season", |_| DataSource::Url("http://api/{{competition}}".into()))
                .enabled_policy(disable_when_value("-1"))
                .renderer(ui.clone()),
        );

        parent.get_options_data(None).await;
        child.dependency_did_update(&parent).await.unwrap();

        assert_eq!(child.state(), FilterState::Disabled);
        assert!(child.current_id().is_none());
        assert!(harness.urls.lock().is_empty());
        assert_eq!(ui.ui_state(), UiState::Disabled);
    }

    #[tokio::test]
    async fn disabled_parent_disables_child() {
        let harness = Harness::new();
        let parent = harness.build(0, None, FilterConfig::new("empty", |_| DataSource::Literal(Vec::new())));
        let child = harness.build(
            1,
            Some("empty"),
            FilterConfig::new("child", |_| competitions()),
        );

        parent.get_options_data(None).await;
        child.dependency_did_update(&parent).await.unwrap();

        assert_eq!(parent.state(), FilterState::Disabled);
        assert_eq!(child.state(), FilterState::Disabled);
    }

    #[tokio::test]
    async fn parent_in_error_fails_update() {
        let harness = Harness::new();
        let parent = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| DataSource::Url("http://api/broken".into())),
        );
        let child = harness.build(1, Some("competition"), FilterConfig::new("season", |_| competitions()));

        parent.get_options_data(None).await;
        let err = child.dependency_did_update(&parent).await.unwrap_err();

        assert!(matches!(err, FilterError::ParentInError { ref parent, .. } if parent == "competition"));
        assert_eq!(child.state(), FilterState::Error);
    }

    #[tokio::test]
    async fn select_and_init_notify_the_set() {
        let harness = Harness::new();
        let ui = RecordingRenderer::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions()).renderer(ui.clone()),
        );

        filter.init().await;
        assert_eq!(harness.updates.load(Ordering::SeqCst), 1);

        ui.select("2").await;
        assert_eq!(harness.updates.load(Ordering::SeqCst), 2);
        assert_eq!(filter.current_option().name.as_deref(), Some("Comp 2"));
    }

    #[tokio::test]
    async fn reset_reapplies_default_without_fetching() {
        let harness = Harness::new();
        let ui = RecordingRenderer::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| DataSource::Url("http://api/comps".into())).renderer(ui.clone()),
        );

        filter.get_options_data(None).await;
        filter.on_select("other").await;
        assert!(filter.current_option().value.is_none());

        filter.reset().await.unwrap();

        assert_eq!(filter.current_id().as_deref(), Some("http://api/comps"));
        assert_eq!(ui.value().as_deref(), Some("http://api/comps"));
        assert!(ui.calls().contains(&RenderCall::SetValue("http://api/comps".into())));
        assert_eq!(harness.urls.lock().len(), 1);
    }

    #[tokio::test]
    async fn same_state_does_not_refire_effects() {
        let harness = Harness::new();
        let ui = RecordingRenderer::new();
        let filter = harness.build(
            0,
            None,
            FilterConfig::new("competition", |_| competitions()).renderer(ui.clone()),
        );
        ui.clear_calls();

        filter.set_state(FilterState::Loading);
        assert!(ui.calls().is_empty());

        filter.set_state(FilterState::Building);
        assert_eq!(filter.state(), FilterState::Loading);
    }
}
