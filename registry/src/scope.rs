use netguard_core::ResourceIdentifier;
use serde::{Deserialize, Serialize};

/// Selects the subset of keys a listing or sync addresses.
///
/// `Empty` places no restriction on listings and means "replace everything"
/// in a full sync. In `ByIdentifiers`, an identifier with an empty name and
/// a non-empty namespace addresses every key in that namespace when
/// listing; full-sync deletion only ever matches exact keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    #[default]
    Empty,
    ByIdentifiers(Vec<ResourceIdentifier>),
}

// === impl Scope ===

impl Scope {
    pub fn by_identifiers(ids: impl IntoIterator<Item = ResourceIdentifier>) -> Self {
        Self::ByIdentifiers(ids.into_iter().collect())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl From<ResourceIdentifier> for Scope {
    fn from(id: ResourceIdentifier) -> Self {
        Self::ByIdentifiers(vec![id])
    }
}
