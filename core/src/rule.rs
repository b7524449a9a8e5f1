use crate::{Action, Meta, ResourceIdentifier, Traffic, Transport};
use serde::{Deserialize, Serialize};

/// A rule between two service aliases.
///
/// `service_local_ref` names the alias on whose side the rule is evaluated;
/// the rule lives in that alias's namespace.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleS2S {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default)]
    pub traffic: Traffic,

    pub service_local_ref: ResourceIdentifier,

    pub service_ref: ResourceIdentifier,
}

/// A generated ingress/egress rule between two address groups.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IEAgAgRule {
    pub self_ref: ResourceIdentifier,

    #[serde(default)]
    pub meta: Meta,

    #[serde(default)]
    pub transport: Transport,

    #[serde(default)]
    pub traffic: Traffic,

    pub address_group_local: ResourceIdentifier,

    pub address_group: ResourceIdentifier,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortSpec>,

    #[serde(default)]
    pub action: Action,

    #[serde(default)]
    pub logs: bool,

    #[serde(default)]
    pub priority: i32,
}

/// Source/destination port columns of a generated rule. Each column is a
/// spec string: a single port or an `a-b` range.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    pub destination: String,
}
