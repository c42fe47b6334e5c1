//! Filter Options
//!
//! An option is one selectable entry of a filter. Values are always
//! compared as strings, so `1` and `"1"` in a JSON payload select the same
//! option. A filter's current selection is an `Option<String>`: `None` is
//! the unset marker and never matches an option, even one whose value is
//! an empty or falsy-looking string such as `"0"`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single selectable entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterOption {
    /// Display name.
    pub name: String,

    /// Identifier used for selection.
    #[serde(deserialize_with = "string_or_scalar")]
    pub value: String,

    /// Arbitrary data carried along with the option.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl FilterOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            extra: None,
        }
    }

    /// Attach extra data to the option.
    pub fn with_extra(mut self, extra: Value) -> Self {
        self.extra = Some(extra);
        self
    }
}

/// Find the option whose value matches `id`.
pub fn find_option<'a>(options: &'a [FilterOption], id: Option<&str>) -> Option<&'a FilterOption> {
    let id = id?;
    options.iter().find(|option| option.value == id)
}

fn string_or_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "option value must be a string or number, found {other}"
        ))),
    }
}
