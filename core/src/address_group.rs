use crate::{Action, Meta, PortRange, ResourceIdentifier, Transport};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Per-transport port ranges granted to a service by a port mapping.
pub type ProtocolPorts = BTreeMap<Transport, Vec<PortRange>>;

/// A named, namespaced set of CIDR addresses with a default action for
/// unmatched traffic.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressGroup {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    /// Each entry must parse as an IP address or CIDR block.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub addresses: Vec<String>,

    #[serde(default)]
    pub default_action: Action,

    #[serde(default)]
    pub logs: bool,

    #[serde(default)]
    pub trace: bool,
}

/// Binds a service to an address group. Referrer and referents live in the
/// same namespace unless an `AddressGroupBindingPolicy` whitelists the pair.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressGroupBinding {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    pub service_ref: ResourceIdentifier,

    pub address_group_ref: ResourceIdentifier,
}

/// Whitelists one (service, address group) pair for cross-namespace binding.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressGroupBindingPolicy {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    pub service_ref: ResourceIdentifier,

    pub address_group_ref: ResourceIdentifier,
}

/// The ports an address group's members may reach on each bound service,
/// keyed by service.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressGroupPortMapping {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, with = "access_ports", skip_serializing_if = "BTreeMap::is_empty")]
    pub access_ports: BTreeMap<ResourceIdentifier, ProtocolPorts>,
}

// === impl AddressGroup ===

impl AddressGroup {
    pub fn new(self_ref: ResourceIdentifier) -> Self {
        Self {
            self_ref,
            ..Self::default()
        }
    }
}

// === impl AddressGroupBinding ===

impl AddressGroupBinding {
    pub fn new(
        self_ref: ResourceIdentifier,
        service_ref: ResourceIdentifier,
        address_group_ref: ResourceIdentifier,
    ) -> Self {
        Self {
            self_ref,
            service_ref,
            address_group_ref,
            meta: Meta::default(),
        }
    }
}

/// Serializes the access-ports map with `namespace/name` keys, since JSON
/// object keys must be strings.
mod access_ports {
    use super::{ProtocolPorts, ResourceIdentifier};
    use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub(super) fn serialize<S: Serializer>(
        map: &BTreeMap<ResourceIdentifier, ProtocolPorts>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_map(map.iter().map(|(id, ports)| (id.key(), ports)))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<ResourceIdentifier, ProtocolPorts>, D::Error> {
        BTreeMap::<String, ProtocolPorts>::deserialize(deserializer)?
            .into_iter()
            .map(|(key, ports)| {
                key.parse::<ResourceIdentifier>()
                    .map(|id| (id, ports))
                    .map_err(D::Error::custom)
            })
            .collect()
    }
}
