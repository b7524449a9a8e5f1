//! Core resource model for the netguard control-plane backend.
//!
//! Defines the typed, namespaced records the registry stores (services,
//! address groups, bindings, rules, networks, hosts), their shared metadata,
//! and the error taxonomy surfaced to callers.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod address_group;
mod cidr;
mod error;
mod host;
mod identifier;
mod meta;
mod network;
pub mod ports;
mod rule;
mod service;

pub use self::{
    address_group::{
        AddressGroup, AddressGroupBinding, AddressGroupBindingPolicy, AddressGroupPortMapping,
        ProtocolPorts,
    },
    cidr::{Cidr, CidrParseError},
    error::Error,
    host::{Host, HostBinding},
    identifier::{KeyParseError, ResourceIdentifier},
    meta::{Meta, SyncStatus},
    network::{Network, NetworkBinding},
    ports::PortRange,
    rule::{IEAgAgRule, PortSpec, RuleS2S},
    service::{IngressPort, Service, ServiceAlias},
};

use serde::{Deserialize, Serialize};

/// A transport protocol recognized by rules and port specifications.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub enum Transport {
    #[default]
    #[serde(rename = "TCP")]
    Tcp,
    #[serde(rename = "UDP")]
    Udp,
}

/// The direction of traffic a rule applies to.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub enum Traffic {
    #[default]
    #[serde(rename = "INGRESS")]
    Ingress,
    #[serde(rename = "EGRESS")]
    Egress,
}

/// What to do with traffic matched by a rule or an address group default.
#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize,
)]
pub enum Action {
    #[serde(rename = "ACCEPT")]
    Accept,
    #[default]
    #[serde(rename = "DROP")]
    Drop,
}

// === impl Transport ===

impl std::fmt::Display for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tcp => "TCP".fmt(f),
            Self::Udp => "UDP".fmt(f),
        }
    }
}

impl std::str::FromStr for Transport {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TCP" => Ok(Self::Tcp),
            "UDP" => Ok(Self::Udp),
            _ => Err(EnumParseError::new("transport protocol", s)),
        }
    }
}

// === impl Traffic ===

impl std::fmt::Display for Traffic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ingress => "INGRESS".fmt(f),
            Self::Egress => "EGRESS".fmt(f),
        }
    }
}

impl std::str::FromStr for Traffic {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INGRESS" => Ok(Self::Ingress),
            "EGRESS" => Ok(Self::Egress),
            _ => Err(EnumParseError::new("traffic direction", s)),
        }
    }
}

// === impl Action ===

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Accept => "ACCEPT".fmt(f),
            Self::Drop => "DROP".fmt(f),
        }
    }
}

impl std::str::FromStr for Action {
    type Err = EnumParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACCEPT" => Ok(Self::Accept),
            "DROP" => Ok(Self::Drop),
            _ => Err(EnumParseError::new("rule action", s)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("not a valid {what}: {value}")]
pub struct EnumParseError {
    what: &'static str,
    value: String,
}

impl EnumParseError {
    fn new(what: &'static str, value: &str) -> Self {
        Self {
            what,
            value: value.to_string(),
        }
    }
}
