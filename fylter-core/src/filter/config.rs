//! Filter Configuration
//!
//! A [`FilterConfig`] describes one filter: where its options come from,
//! which filters it depends on, the middleware that shapes its data and the
//! renderer that displays it.
//!
//! Configurations are built in code with the builder methods, or loaded
//! from a JSON document through [`FilterSetDecl`] when the data source is
//! a plain URL template or a literal list.

use std::sync::Arc;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::instance::Filter;
use super::option::FilterOption;
use crate::error::{BoxError, ConfigError};
use crate::render::FilterRenderer;

/// Wrapper class applied when none is configured.
pub const DEFAULT_WRAPPER_CLASS: &str = "filter";

/// What a filter's data function produced.
pub enum DataSource {
    /// An endpoint to fetch. `{{Parent}}` is replaced with the current
    /// value of the parent filter named `Parent`.
    Url(String),
    /// Raw items, ready for `before_option_update`.
    Literal(Vec<Value>),
    /// Raw items that arrive later.
    Pending(BoxFuture<'static, Result<Vec<Value>, BoxError>>),
    /// A declared data value of an unsupported shape. Loads as an empty
    /// option list.
    Invalid(String),
}

impl DataSource {
    /// Interpret a declared JSON value: strings are URLs, arrays are
    /// literal items.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(url) => DataSource::Url(url.clone()),
            Value::Array(items) => DataSource::Literal(items.clone()),
            other => DataSource::Invalid(json_kind(other).to_string()),
        }
    }

    /// Wrap a future yielding raw items.
    pub fn pending<F>(future: F) -> Self
    where
        F: std::future::Future<Output = Result<Vec<Value>, BoxError>> + Send + 'static,
    {
        DataSource::Pending(Box::pin(future))
    }

    /// Literal options, serialised into raw items.
    pub fn options(options: impl IntoIterator<Item = FilterOption>) -> Self {
        DataSource::Literal(
            options
                .into_iter()
                .filter_map(|option| serde_json::to_value(option).ok())
                .collect(),
        )
    }
}

impl std::fmt::Debug for DataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataSource::Url(url) => f.debug_tuple("Url").field(url).finish(),
            DataSource::Literal(items) => f.debug_tuple("Literal").field(&items.len()).finish(),
            DataSource::Pending(_) => f.write_str("Pending"),
            DataSource::Invalid(found) => f.debug_tuple("Invalid").field(found).finish(),
        }
    }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Produces a filter's data source. Receives the filter whose update
/// triggered the load, if any.
pub type DataFn = Arc<dyn Fn(Option<&Filter>) -> DataSource + Send + Sync>;

/// Turns raw items into options.
pub type BeforeOptionUpdate = Arc<dyn Fn(Vec<Value>) -> Result<Vec<FilterOption>, BoxError> + Send + Sync>;

/// Picks the value selected by default from a non-empty option list.
pub type DecideDefault = Arc<dyn Fn(&[FilterOption]) -> Result<String, BoxError> + Send + Sync>;

/// Decides whether a filter stays enabled after the given filter updated.
pub type DecideEnabled = Arc<dyn Fn(&Filter) -> bool + Send + Sync>;

/// Hooks that shape a filter's data and selection.
#[derive(Clone)]
pub struct Middlewares {
    pub before_option_update: BeforeOptionUpdate,
    pub decide_default: DecideDefault,
    pub decide_enabled: DecideEnabled,
}

impl Default for Middlewares {
    fn default() -> Self {
        Self {
            before_option_update: Arc::new(|items: Vec<Value>| {
                items
                    .into_iter()
                    .map(|item| serde_json::from_value(item).map_err(BoxError::from))
                    .collect()
            }),
            decide_default: Arc::new(first_option_value),
            decide_enabled: Arc::new(|_: &Filter| true),
        }
    }
}

fn first_option_value(options: &[FilterOption]) -> Result<String, BoxError> {
    options
        .first()
        .map(|option| option.value.clone())
        .ok_or_else(|| "cannot decide a default without options".into())
}

/// Enablement policy that disables the filter whenever the updating
/// filter's current value equals `value`.
pub fn disable_when_value(value: impl Into<String>) -> DecideEnabled {
    let value = value.into();
    Arc::new(move |updated: &Filter| updated.current_option().value.as_deref() != Some(value.as_str()))
}

/// Configuration of a single filter.
pub struct FilterConfig {
    pub(crate) name: String,
    pub(crate) data: DataFn,
    pub(crate) depends_on: Vec<String>,
    pub(crate) middlewares: Middlewares,
    pub(crate) renderer: Option<Box<dyn FilterRenderer>>,
    pub(crate) wrapper_class: String,
}

impl FilterConfig {
    /// Create a configuration with default middleware and renderer.
    pub fn new<F>(name: impl Into<String>, data: F) -> Self
    where
        F: Fn(Option<&Filter>) -> DataSource + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            data: Arc::new(data),
            depends_on: Vec::new(),
            middlewares: Middlewares::default(),
            renderer: None,
            wrapper_class: DEFAULT_WRAPPER_CLASS.to_string(),
        }
    }

    pub fn depends_on<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends_on = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn before_option_update<F>(mut self, f: F) -> Self
    where
        F: Fn(Vec<Value>) -> Result<Vec<FilterOption>, BoxError> + Send + Sync + 'static,
    {
        self.middlewares.before_option_update = Arc::new(f);
        self
    }

    pub fn decide_default<F>(mut self, f: F) -> Self
    where
        F: Fn(&[FilterOption]) -> Result<String, BoxError> + Send + Sync + 'static,
    {
        self.middlewares.decide_default = Arc::new(f);
        self
    }

    pub fn decide_enabled<F>(mut self, f: F) -> Self
    where
        F: Fn(&Filter) -> bool + Send + Sync + 'static,
    {
        self.middlewares.decide_enabled = Arc::new(f);
        self
    }

    /// Use an already boxed policy, such as [`disable_when_value`].
    pub fn enabled_policy(mut self, policy: DecideEnabled) -> Self {
        self.middlewares.decide_enabled = policy;
        self
    }

    pub fn renderer(mut self, renderer: impl FilterRenderer + 'static) -> Self {
        self.renderer = Some(Box::new(renderer));
        self
    }

    pub fn wrapper_class(mut self, class: impl Into<String>) -> Self {
        self.wrapper_class = class.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.depends_on
    }
}

impl std::fmt::Debug for FilterConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterConfig")
            .field("name", &self.name)
            .field("depends_on", &self.depends_on)
            .field("wrapper_class", &self.wrapper_class)
            .field("custom_renderer", &self.renderer.is_some())
            .finish()
    }
}

/// Declarative form of a filter, as found in a JSON layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterDecl {
    pub name: String,
    #[serde(default)]
    pub depends_on: Vec<String>,
    #[serde(default = "default_wrapper_class")]
    pub wrapper_class: String,
    /// URL template or literal list of options.
    pub data: Value,
}

fn default_wrapper_class() -> String {
    DEFAULT_WRAPPER_CLASS.to_string()
}

impl FilterDecl {
    /// Build a configuration with default middleware.
    pub fn into_config(self) -> FilterConfig {
        let data = self.data;
        FilterConfig::new(self.name, move |_| DataSource::from_value(&data))
            .depends_on(self.depends_on)
            .wrapper_class(self.wrapper_class)
    }
}

/// Declarative layout of a whole filter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSetDecl {
    pub filters: Vec<FilterDecl>,
}

impl FilterSetDecl {
    /// Parse a layout from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn into_configs(self) -> Vec<FilterConfig> {
        self.filters.into_iter().map(FilterDecl::into_config).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn default_transform_parses_options() {
        let middlewares = Middlewares::default();
        let options = (middlewares.before_option_update)(vec![
            json!({ "name": "Home", "value": "Home" }),
            json!({ "name": "Away", "value": "Away" }),
        ])
        .unwrap();
        assert_eq!(options, vec![FilterOption::new("Home", "Home"), FilterOption::new("Away", "Away")]);
    }

    #[test]
    fn default_transform_rejects_malformed_items() {
        let middlewares = Middlewares::default();
        assert!((middlewares.before_option_update)(vec![json!({ "teamName": "FCB" })]).is_err());
    }

    #[test]
    fn default_picks_first_option() {
        let middlewares = Middlewares::default();
        let options = [FilterOption::new("Comp 1", "1"), FilterOption::new("All", "-1")];
        assert_eq!((middlewares.decide_default)(&options).unwrap(), "1");
        assert!((middlewares.decide_default)(&[]).is_err());
    }

    #[test]
    fn data_source_from_declared_value() {
        assert!(matches!(DataSource::from_value(&json!("http://api/{{a}}")), DataSource::Url(u) if u == "http://api/{{a}}"));
        assert!(matches!(DataSource::from_value(&json!([1, 2])), DataSource::Literal(items) if items.len() == 2));
        assert!(matches!(DataSource::from_value(&json!(42)), DataSource::Invalid(kind) if kind == "a number"));
    }

    #[test]
    fn layout_loads_from_json() {
        let layout = FilterSetDecl::from_json(
            r#"{
                "filters": [
                    { "name": "competition", "data": "http://api/competitions" },
                    {
                        "name": "season",
                        "dependsOn": ["competition"],
                        "wrapperClass": "filter filter--season",
                        "data": "http://api/competitions/{{competition}}/seasons"
                    }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(layout.filters.len(), 2);
        assert_eq!(layout.filters[0].wrapper_class, DEFAULT_WRAPPER_CLASS);
        assert!(layout.filters[0].depends_on.is_empty());

        let configs = layout.into_configs();
        assert_eq!(configs[1].name(), "season");
        assert_eq!(configs[1].dependencies(), &["competition".to_string()]);
        assert_eq!(configs[1].wrapper_class, "filter filter--season");
    }

    #[test]
    fn malformed_layout_is_a_config_error() {
        let err = FilterSetDecl::from_json(r#"{ "filters": [ { "dependsOn": [] } ] }"#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDeclaration(_)));
    }
}
