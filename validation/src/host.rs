use crate::{ensure_exists, ensure_meta_immutable, resolve_ref};
use netguard_core::{AddressGroup, Cidr, Error, Host, HostBinding, ResourceIdentifier};
use netguard_registry::{Reader, Resource, Scope};
use tokio_util::sync::CancellationToken;

pub struct HostValidator<'a> {
    reader: &'a Reader<'a>,
}

pub struct HostBindingValidator<'a> {
    reader: &'a Reader<'a>,
}

// === impl HostValidator ===

impl<'a> HostValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<Host>(self.reader, ctx, id)
    }

    pub fn validate_for_creation(
        &self,
        _ctx: &CancellationToken,
        host: &Host,
    ) -> Result<(), Error> {
        self.validate_shape(host)
    }

    pub fn validate_for_update(
        &self,
        _ctx: &CancellationToken,
        old: &Host,
        new: &Host,
    ) -> Result<(), Error> {
        self.validate_shape(new)?;
        ensure_meta_immutable(old, new)
    }

    pub fn check_dependencies(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        self.reader
            .list::<HostBinding, _>(ctx, &Scope::Empty, |binding| {
                if binding.host_ref == *id {
                    return Err(Error::DependencyExists {
                        kind: Host::KIND,
                        id: id.key(),
                        dependent_kind: HostBinding::KIND,
                        dependent_id: binding.key(),
                    });
                }
                Ok(())
            })
    }

    fn validate_shape(&self, host: &Host) -> Result<(), Error> {
        for address in &host.addresses {
            address.parse::<Cidr>().map_err(|err| Error::ShapeInvalid {
                kind: Host::KIND,
                id: host.self_ref.key(),
                field: "addresses",
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }
}

// === impl HostBindingValidator ===

impl<'a> HostBindingValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<HostBinding>(self.reader, ctx, id)
    }

    /// Both referents must exist in the binding's own namespace.
    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        binding: &HostBinding,
    ) -> Result<(), Error> {
        let host = resolve_ref::<Host>(
            self.reader,
            ctx,
            HostBinding::KIND,
            &binding.self_ref,
            "hostRef",
            &binding.host_ref,
        )?;
        let group = resolve_ref::<AddressGroup>(
            self.reader,
            ctx,
            HostBinding::KIND,
            &binding.self_ref,
            "addressGroupRef",
            &binding.address_group_ref,
        )?;

        let namespace = &binding.self_ref.namespace;
        if host.self_ref.namespace != *namespace {
            return Err(Error::ReferenceInvalid {
                kind: HostBinding::KIND,
                id: binding.self_ref.key(),
                field: "hostRef",
                target: binding.host_ref.key(),
                reason: "binding and host must share a namespace".to_string(),
            });
        }
        if group.self_ref.namespace != *namespace {
            return Err(Error::ReferenceInvalid {
                kind: HostBinding::KIND,
                id: binding.self_ref.key(),
                field: "addressGroupRef",
                target: binding.address_group_ref.key(),
                reason: "binding and address group must share a namespace".to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        binding: &HostBinding,
    ) -> Result<(), Error> {
        self.validate_references(ctx, binding)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &HostBinding,
        new: &HostBinding,
    ) -> Result<(), Error> {
        self.validate_references(ctx, new)?;
        ensure_meta_immutable(old, new)
    }

    pub fn check_dependencies(
        &self,
        _ctx: &CancellationToken,
        _id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        Ok(())
    }
}
