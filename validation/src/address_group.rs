use crate::{ensure_exists, ensure_meta_immutable, resolve_ref};
use netguard_core::{
    AddressGroup, AddressGroupBinding, AddressGroupBindingPolicy, AddressGroupPortMapping, Cidr,
    Error, HostBinding, IEAgAgRule, NetworkBinding, ResourceIdentifier, Service,
};
use netguard_registry::{Reader, Resource, Scope};
use tokio_util::sync::CancellationToken;

pub struct AddressGroupValidator<'a> {
    reader: &'a Reader<'a>,
}

pub struct AddressGroupBindingValidator<'a> {
    reader: &'a Reader<'a>,
}

pub struct AddressGroupBindingPolicyValidator<'a> {
    reader: &'a Reader<'a>,
}

pub struct AddressGroupPortMappingValidator<'a> {
    reader: &'a Reader<'a>,
}

// === impl AddressGroupValidator ===

impl<'a> AddressGroupValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<AddressGroup>(self.reader, ctx, id)
    }

    pub fn validate_for_creation(
        &self,
        _ctx: &CancellationToken,
        group: &AddressGroup,
    ) -> Result<(), Error> {
        self.validate_shape(group)
    }

    pub fn validate_for_update(
        &self,
        _ctx: &CancellationToken,
        old: &AddressGroup,
        new: &AddressGroup,
    ) -> Result<(), Error> {
        self.validate_shape(new)?;
        ensure_meta_immutable(old, new)
    }

    /// An address group cannot be deleted while a binding, port mapping,
    /// rule, or network/host binding still points at it.
    pub fn check_dependencies(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        self.reader
            .list::<AddressGroupBinding, _>(ctx, &Scope::Empty, |binding| {
                if binding.address_group_ref == *id {
                    return Err(dependency(id, AddressGroupBinding::KIND, binding.key()));
                }
                Ok(())
            })?;

        self.reader
            .list::<AddressGroupPortMapping, _>(ctx, &Scope::Empty, |mapping| {
                if mapping.self_ref == *id && !mapping.access_ports.is_empty() {
                    return Err(dependency(id, AddressGroupPortMapping::KIND, mapping.key()));
                }
                Ok(())
            })?;

        self.reader
            .list::<IEAgAgRule, _>(ctx, &Scope::Empty, |rule| {
                if rule.address_group_local == *id || rule.address_group == *id {
                    return Err(dependency(id, IEAgAgRule::KIND, rule.key()));
                }
                Ok(())
            })?;

        self.reader
            .list::<NetworkBinding, _>(ctx, &Scope::Empty, |binding| {
                if binding.address_group_ref == *id {
                    return Err(dependency(id, NetworkBinding::KIND, binding.key()));
                }
                Ok(())
            })?;

        self.reader
            .list::<HostBinding, _>(ctx, &Scope::Empty, |binding| {
                if binding.address_group_ref == *id {
                    return Err(dependency(id, HostBinding::KIND, binding.key()));
                }
                Ok(())
            })
    }

    fn validate_shape(&self, group: &AddressGroup) -> Result<(), Error> {
        for address in &group.addresses {
            address
                .parse::<Cidr>()
                .map_err(|err| Error::ShapeInvalid {
                    kind: AddressGroup::KIND,
                    id: group.self_ref.key(),
                    field: "addresses",
                    reason: err.to_string(),
                })?;
        }
        Ok(())
    }
}

// === impl AddressGroupBindingValidator ===

impl<'a> AddressGroupBindingValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<AddressGroupBinding>(self.reader, ctx, id)
    }

    /// Both referents must exist and share the binding's namespace, unless
    /// a policy whitelists the exact (service, address group) pair.
    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        binding: &AddressGroupBinding,
    ) -> Result<(), Error> {
        let service = resolve_ref::<Service>(
            self.reader,
            ctx,
            AddressGroupBinding::KIND,
            &binding.self_ref,
            "serviceRef",
            &binding.service_ref,
        )?;
        let group = resolve_ref::<AddressGroup>(
            self.reader,
            ctx,
            AddressGroupBinding::KIND,
            &binding.self_ref,
            "addressGroupRef",
            &binding.address_group_ref,
        )?;

        let namespace = &binding.self_ref.namespace;
        let service_local = service.self_ref.namespace == *namespace;
        let group_local = group.self_ref.namespace == *namespace;
        if (!service_local || !group_local) && !self.pair_whitelisted(ctx, binding)? {
            let (field, target) = if service_local {
                ("addressGroupRef", binding.address_group_ref.key())
            } else {
                ("serviceRef", binding.service_ref.key())
            };
            return Err(Error::ReferenceInvalid {
                kind: AddressGroupBinding::KIND,
                id: binding.self_ref.key(),
                field,
                target,
                reason: "cross-namespace binding requires a binding policy".to_string(),
            });
        }
        Ok(())
    }

    /// References plus the duplicate-pair rule: only one binding may join a
    /// given service and address group.
    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        binding: &AddressGroupBinding,
    ) -> Result<(), Error> {
        self.validate_references(ctx, binding)?;

        let key = binding.key();
        self.reader
            .list::<AddressGroupBinding, _>(ctx, &Scope::Empty, |other| {
                if other.key() != key
                    && other.service_ref == binding.service_ref
                    && other.address_group_ref == binding.address_group_ref
                {
                    return Err(Error::ShapeInvalid {
                        kind: AddressGroupBinding::KIND,
                        id: key.clone(),
                        field: "addressGroupRef",
                        reason: format!(
                            "binding {} already joins {} to {}",
                            other.key(),
                            binding.service_ref.key(),
                            binding.address_group_ref.key(),
                        ),
                    });
                }
                Ok(())
            })
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &AddressGroupBinding,
        new: &AddressGroupBinding,
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

    fn pair_whitelisted(
        &self,
        ctx: &CancellationToken,
        binding: &AddressGroupBinding,
    ) -> Result<bool, Error> {
        let mut allowed = false;
        self.reader
            .list::<AddressGroupBindingPolicy, _>(ctx, &Scope::Empty, |policy| {
                if policy.service_ref == binding.service_ref
                    && policy.address_group_ref == binding.address_group_ref
                {
                    allowed = true;
                }
                Ok(())
            })?;
        Ok(allowed)
    }
}

// === impl AddressGroupBindingPolicyValidator ===

impl<'a> AddressGroupBindingPolicyValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<AddressGroupBindingPolicy>(self.reader, ctx, id)
    }

    /// A policy must live in the namespace of at least one of its
    /// referents: it authorizes bindings reaching out of that namespace.
    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        policy: &AddressGroupBindingPolicy,
    ) -> Result<(), Error> {
        let service = resolve_ref::<Service>(
            self.reader,
            ctx,
            AddressGroupBindingPolicy::KIND,
            &policy.self_ref,
            "serviceRef",
            &policy.service_ref,
        )?;
        let group = resolve_ref::<AddressGroup>(
            self.reader,
            ctx,
            AddressGroupBindingPolicy::KIND,
            &policy.self_ref,
            "addressGroupRef",
            &policy.address_group_ref,
        )?;

        let namespace = &policy.self_ref.namespace;
        if service.self_ref.namespace != *namespace && group.self_ref.namespace != *namespace {
            return Err(Error::ReferenceInvalid {
                kind: AddressGroupBindingPolicy::KIND,
                id: policy.self_ref.key(),
                field: "serviceRef",
                target: policy.service_ref.key(),
                reason: "policy must share a namespace with one of its referents".to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        policy: &AddressGroupBindingPolicy,
    ) -> Result<(), Error> {
        self.validate_references(ctx, policy)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &AddressGroupBindingPolicy,
        new: &AddressGroupBindingPolicy,
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

// === impl AddressGroupPortMappingValidator ===

impl<'a> AddressGroupPortMappingValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<AddressGroupPortMapping>(self.reader, ctx, id)
    }

    /// Every service named in the access-ports map must exist.
    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        mapping: &AddressGroupPortMapping,
    ) -> Result<(), Error> {
        for service in mapping.access_ports.keys() {
            resolve_ref::<Service>(
                self.reader,
                ctx,
                AddressGroupPortMapping::KIND,
                &mapping.self_ref,
                "accessPorts",
                service,
            )?;
        }
        Ok(())
    }

    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        mapping: &AddressGroupPortMapping,
    ) -> Result<(), Error> {
        self.validate_shape(mapping)?;
        self.validate_references(ctx, mapping)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &AddressGroupPortMapping,
        new: &AddressGroupPortMapping,
    ) -> Result<(), Error> {
        self.validate_shape(new)?;
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

    fn validate_shape(&self, mapping: &AddressGroupPortMapping) -> Result<(), Error> {
        for (service, protocols) in &mapping.access_ports {
            for ranges in protocols.values() {
                for range in ranges {
                    range.validate().map_err(|err| Error::ShapeInvalid {
                        kind: AddressGroupPortMapping::KIND,
                        id: mapping.self_ref.key(),
                        field: "accessPorts",
                        reason: format!("{}: {}", service.key(), err),
                    })?;
                }
            }
        }
        Ok(())
    }
}

fn dependency(id: &ResourceIdentifier, dependent_kind: &'static str, dependent_id: String) -> Error {
    Error::DependencyExists {
        kind: AddressGroup::KIND,
        id: id.key(),
        dependent_kind,
        dependent_id,
    }
}
