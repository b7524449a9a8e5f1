use crate::{Meta, ResourceIdentifier};
use serde::{Deserialize, Serialize};

/// A CIDR-addressed network. The CIDR is unique across all networks.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Network {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    pub cidr: String,

    /// Back-reference to the binding that attached this network, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub binding_ref: Option<ResourceIdentifier>,

    /// Back-reference to the address group this network is attached to, if
    /// any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address_group_ref: Option<ResourceIdentifier>,
}

/// Attaches a network to an address group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkBinding {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    pub network_ref: ResourceIdentifier,

    pub address_group_ref: ResourceIdentifier,
}

// === impl Network ===

impl Network {
    pub fn new(self_ref: ResourceIdentifier, cidr: impl Into<String>) -> Self {
        Self {
            self_ref,
            cidr: cidr.into(),
            ..Self::default()
        }
    }
}
