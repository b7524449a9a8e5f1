use serde::{Deserialize, Serialize};

/// Identifies a resource by name within a namespace.
///
/// A cluster-scoped resource has an empty namespace. The canonical string
/// form is `namespace/name`; an identifier with an empty name and a
/// non-empty namespace addresses every resource in that namespace when used
/// in a scope.
#[derive(
    Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ResourceIdentifier {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub namespace: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("not a valid resource key: {0}")]
pub struct KeyParseError(String);

// === impl ResourceIdentifier ===

impl ResourceIdentifier {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// The canonical map key, `namespace/name`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }

    /// True when this identifier addresses a whole namespace rather than a
    /// single resource.
    pub fn is_namespace_only(&self) -> bool {
        self.name.is_empty() && !self.namespace.is_empty()
    }
}

impl std::str::FromStr for ResourceIdentifier {
    type Err = KeyParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((namespace, name)) if !name.is_empty() => Ok(Self::new(namespace, name)),
            _ => Err(KeyParseError(s.to_string())),
        }
    }
}

impl std::fmt::Display for ResourceIdentifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}
