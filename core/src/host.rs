use crate::{Meta, ResourceIdentifier};
use serde::{Deserialize, Serialize};

/// A host known to the control plane by its addresses.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Host {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    /// Each entry must parse as an IP address or CIDR block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,
}

/// Attaches a host to an address group.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostBinding {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    pub host_ref: ResourceIdentifier,

    pub address_group_ref: ResourceIdentifier,
}
