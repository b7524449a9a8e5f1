use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata shared by every stored record.
///
/// The registry fills the identity fields on first commit and preserves them
/// across updates: once assigned, `uid` and `creation_timestamp` never
/// change, `generation` only grows, and `resource_version` is replaced with
/// a strictly-increasing token on every mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_timestamp: Option<DateTime<Utc>>,

    #[serde(default)]
    pub generation: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub resource_version: String,

    /// Opaque to the registry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,

    /// Opaque to the registry.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

/// Records when the registry last published a commit.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub updated_at: DateTime<Utc>,
}

impl Default for SyncStatus {
    fn default() -> Self {
        Self {
            updated_at: DateTime::<Utc>::MIN_UTC,
        }
    }
}
