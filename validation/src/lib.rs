//! Cross-resource validation for the netguard registry.
//!
//! A [`DependencyValidator`] binds per-kind validators to a reader,
//! typically one derived from an open writer, so that staged records
//! participate in reference and dependency checks before they are
//! committed. Validators never mutate the store; the only record mutation
//! is the documented service-alias namespace auto-fill.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod address_group;
mod host;
mod network;
mod rule;
mod service;

pub use self::{
    address_group::{
        AddressGroupBindingPolicyValidator, AddressGroupBindingValidator,
        AddressGroupPortMappingValidator, AddressGroupValidator,
    },
    host::{HostBindingValidator, HostValidator},
    network::{NetworkBindingValidator, NetworkValidator},
    rule::{IEAgAgRuleValidator, RuleS2SValidator},
    service::{ServiceAliasValidator, ServiceValidator},
};

use netguard_core::{Error, ResourceIdentifier};
use netguard_registry::{Reader, Resource};
use tokio_util::sync::CancellationToken;

/// Per-kind validators over one consistent read view.
pub struct DependencyValidator<'a> {
    reader: &'a Reader<'a>,
}

// === impl DependencyValidator ===

impl<'a> DependencyValidator<'a> {
    pub fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn services(&self) -> ServiceValidator<'a> {
        ServiceValidator::new(self.reader)
    }

    pub fn service_aliases(&self) -> ServiceAliasValidator<'a> {
        ServiceAliasValidator::new(self.reader)
    }

    pub fn address_groups(&self) -> AddressGroupValidator<'a> {
        AddressGroupValidator::new(self.reader)
    }

    pub fn address_group_bindings(&self) -> AddressGroupBindingValidator<'a> {
        AddressGroupBindingValidator::new(self.reader)
    }

    pub fn address_group_port_mappings(&self) -> AddressGroupPortMappingValidator<'a> {
        AddressGroupPortMappingValidator::new(self.reader)
    }

    pub fn address_group_binding_policies(&self) -> AddressGroupBindingPolicyValidator<'a> {
        AddressGroupBindingPolicyValidator::new(self.reader)
    }

    pub fn rules_s2s(&self) -> RuleS2SValidator<'a> {
        RuleS2SValidator::new(self.reader)
    }

    pub fn ie_ag_ag_rules(&self) -> IEAgAgRuleValidator<'a> {
        IEAgAgRuleValidator::new(self.reader)
    }

    pub fn networks(&self) -> NetworkValidator<'a> {
        NetworkValidator::new(self.reader)
    }

    pub fn network_bindings(&self) -> NetworkBindingValidator<'a> {
        NetworkBindingValidator::new(self.reader)
    }

    pub fn hosts(&self) -> HostValidator<'a> {
        HostValidator::new(self.reader)
    }

    pub fn host_bindings(&self) -> HostBindingValidator<'a> {
        HostBindingValidator::new(self.reader)
    }
}

/// Resolves an outbound reference, translating a lookup miss into
/// [`Error::ReferenceInvalid`] against the referring record.
pub(crate) fn resolve_ref<R: Resource>(
    reader: &Reader<'_>,
    ctx: &CancellationToken,
    kind: &'static str,
    owner: &ResourceIdentifier,
    field: &'static str,
    target: &ResourceIdentifier,
) -> Result<R, Error> {
    match reader.get_by_id::<R>(ctx, target) {
        Ok(record) => Ok(record),
        Err(err) if err.is_not_found() => Err(Error::ReferenceInvalid {
            kind,
            id: owner.key(),
            field,
            target: target.key(),
            reason: format!("{} does not exist", R::KIND),
        }),
        Err(err) => Err(err),
    }
}

/// Checks that a record of kind `R` exists, translating a lookup miss into
/// [`Error::EntityNotFound`].
pub(crate) fn ensure_exists<R: Resource>(
    reader: &Reader<'_>,
    ctx: &CancellationToken,
    id: &ResourceIdentifier,
) -> Result<(), Error> {
    match reader.get_by_id::<R>(ctx, id) {
        Ok(_) => Ok(()),
        Err(err) if err.is_not_found() => Err(Error::EntityNotFound {
            kind: R::KIND,
            id: id.key(),
        }),
        Err(err) => Err(err),
    }
}

/// Rejects updates that rewrite the identity metadata assigned at creation.
pub(crate) fn ensure_meta_immutable<R: Resource>(old: &R, new: &R) -> Result<(), Error> {
    if !new.meta().uid.is_empty() && new.meta().uid != old.meta().uid {
        return Err(Error::ShapeInvalid {
            kind: R::KIND,
            id: new.key(),
            field: "metadata.uid",
            reason: "uid is immutable".to_string(),
        });
    }
    if new.meta().creation_timestamp.is_some()
        && new.meta().creation_timestamp != old.meta().creation_timestamp
    {
        return Err(Error::ShapeInvalid {
            kind: R::KIND,
            id: new.key(),
            field: "metadata.creationTimestamp",
            reason: "creation timestamp is immutable".to_string(),
        });
    }
    Ok(())
}
