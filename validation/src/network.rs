use crate::{ensure_exists, ensure_meta_immutable, resolve_ref};
use netguard_core::{
    AddressGroup, Cidr, Error, Network, NetworkBinding, ResourceIdentifier,
};
use netguard_registry::{Reader, Resource, Scope};
use tokio_util::sync::CancellationToken;

pub struct NetworkValidator<'a> {
    reader: &'a Reader<'a>,
}

pub struct NetworkBindingValidator<'a> {
    reader: &'a Reader<'a>,
}

// === impl NetworkValidator ===

impl<'a> NetworkValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<Network>(self.reader, ctx, id)
    }

    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        network: &Network,
    ) -> Result<(), Error> {
        if let Some(binding) = &network.binding_ref {
            resolve_ref::<NetworkBinding>(
                self.reader,
                ctx,
                Network::KIND,
                &network.self_ref,
                "bindingRef",
                binding,
            )?;
        }
        if let Some(group) = &network.address_group_ref {
            resolve_ref::<AddressGroup>(
                self.reader,
                ctx,
                Network::KIND,
                &network.self_ref,
                "addressGroupRef",
                group,
            )?;
        }
        Ok(())
    }

    /// The CIDR must parse and be unique across all networks.
    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        network: &Network,
    ) -> Result<(), Error> {
        self.validate_shape(network)?;
        self.validate_cidr_unique(ctx, network)?;
        self.validate_references(ctx, network)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &Network,
        new: &Network,
    ) -> Result<(), Error> {
        self.validate_shape(new)?;
        self.validate_cidr_unique(ctx, new)?;
        self.validate_references(ctx, new)?;
        ensure_meta_immutable(old, new)
    }

    pub fn check_dependencies(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        self.reader
            .list::<NetworkBinding, _>(ctx, &Scope::Empty, |binding| {
                if binding.network_ref == *id {
                    return Err(Error::DependencyExists {
                        kind: Network::KIND,
                        id: id.key(),
                        dependent_kind: NetworkBinding::KIND,
                        dependent_id: binding.key(),
                    });
                }
                Ok(())
            })
    }

    fn validate_shape(&self, network: &Network) -> Result<(), Error> {
        network
            .cidr
            .parse::<Cidr>()
            .map_err(|err| Error::ShapeInvalid {
                kind: Network::KIND,
                id: network.self_ref.key(),
                field: "cidr",
                reason: err.to_string(),
            })?;
        Ok(())
    }

    fn validate_cidr_unique(
        &self,
        ctx: &CancellationToken,
        network: &Network,
    ) -> Result<(), Error> {
        match self.reader.get_network_by_cidr(ctx, &network.cidr) {
            Ok(existing) if existing.self_ref != network.self_ref => Err(Error::ShapeInvalid {
                kind: Network::KIND,
                id: network.self_ref.key(),
                field: "cidr",
                reason: format!("network {} already uses this CIDR", existing.self_ref.key()),
            }),
            Ok(_) => Ok(()),
            Err(err) if err.is_not_found() => Ok(()),
            Err(err) => Err(err),
        }
    }
}

// === impl NetworkBindingValidator ===

impl<'a> NetworkBindingValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<NetworkBinding>(self.reader, ctx, id)
    }

    /// Both referents must exist in the binding's own namespace.
    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        binding: &NetworkBinding,
    ) -> Result<(), Error> {
        let network = resolve_ref::<Network>(
            self.reader,
            ctx,
            NetworkBinding::KIND,
            &binding.self_ref,
            "networkRef",
            &binding.network_ref,
        )?;
        let group = resolve_ref::<AddressGroup>(
            self.reader,
            ctx,
            NetworkBinding::KIND,
            &binding.self_ref,
            "addressGroupRef",
            &binding.address_group_ref,
        )?;

        let namespace = &binding.self_ref.namespace;
        if network.self_ref.namespace != *namespace {
            return Err(Error::ReferenceInvalid {
                kind: NetworkBinding::KIND,
                id: binding.self_ref.key(),
                field: "networkRef",
                target: binding.network_ref.key(),
                reason: "binding and network must share a namespace".to_string(),
            });
        }
        if group.self_ref.namespace != *namespace {
            return Err(Error::ReferenceInvalid {
                kind: NetworkBinding::KIND,
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
        binding: &NetworkBinding,
    ) -> Result<(), Error> {
        self.validate_references(ctx, binding)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &NetworkBinding,
        new: &NetworkBinding,
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
