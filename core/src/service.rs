use crate::{Meta, ResourceIdentifier, Transport};
use serde::{Deserialize, Serialize};

/// A service: a named set of ingress ports that address groups can be bound
/// to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ingress_ports: Vec<IngressPort>,

    /// The address groups currently bound to this service.
    ///
    /// Computed from `AddressGroupBinding`s when the service is read; input
    /// values are discarded on write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address_groups: Vec<ResourceIdentifier>,
}

/// One port a service accepts traffic on. The port column is a spec string:
/// a single port or an `a-b` range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressPort {
    #[serde(default)]
    pub protocol: Transport,

    pub port: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// A renameable indirection to a service, used as the endpoint of
/// service-to-service rules.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAlias {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    pub service_ref: ResourceIdentifier,
}

// === impl Service ===

impl Service {
    pub fn new(self_ref: ResourceIdentifier) -> Self {
        Self {
            self_ref,
            ..Self::default()
        }
    }
}

// === impl ServiceAlias ===

impl ServiceAlias {
    pub fn new(self_ref: ResourceIdentifier, service_ref: ResourceIdentifier) -> Self {
        Self {
            self_ref,
            service_ref,
            meta: Meta::default(),
        }
    }
}
