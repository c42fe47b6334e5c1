//! Snapshots
//!
//! A snapshot is what a filter set reports to its update callback: one
//! record per filter, in declaration order. `name`, `value` and `extra` are
//! present only while the filter has a valid selection.
//!
//! Snapshots serialise to camelCase JSON (`filterName`, `state`, ...) and
//! to MessagePack maps for shipping over a transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::FilterState;

/// State and selection of one filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterSnapshot {
    pub filter_name: String,
    pub state: FilterState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Value>,
}

impl FilterSnapshot {
    /// Whether the filter currently has a valid selected option.
    pub fn has_selection(&self) -> bool {
        self.value.is_some()
    }
}

pub fn to_json(snapshot: &[FilterSnapshot]) -> Result<String, serde_json::Error> {
    serde_json::to_string(snapshot)
}

/// Encode as MessagePack, records as maps so absent fields stay absent.
pub fn to_msgpack(snapshot: &[FilterSnapshot]) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec_named(snapshot)
}

pub fn from_msgpack(bytes: &[u8]) -> Result<Vec<FilterSnapshot>, rmp_serde::decode::Error> {
    rmp_serde::from_slice(bytes)
}
