use crate::{ensure_exists, ensure_meta_immutable, resolve_ref};
use netguard_core::{
    ports, AddressGroup, AddressGroupBinding, AddressGroupPortMapping, Error, ResourceIdentifier,
    RuleS2S, Service, ServiceAlias,
};
use netguard_registry::{Reader, Resource, Scope};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ServiceValidator<'a> {
    reader: &'a Reader<'a>,
}

pub struct ServiceAliasValidator<'a> {
    reader: &'a Reader<'a>,
}

// === impl ServiceValidator ===

impl<'a> ServiceValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<Service>(self.reader, ctx, id)
    }

    /// Every bound address group must resolve.
    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        service: &Service,
    ) -> Result<(), Error> {
        for group in &service.address_groups {
            resolve_ref::<AddressGroup>(
                self.reader,
                ctx,
                Service::KIND,
                &service.self_ref,
                "addressGroups",
                group,
            )?;
        }
        Ok(())
    }

    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        service: &Service,
    ) -> Result<(), Error> {
        self.validate_shape(service)?;
        self.validate_references(ctx, service)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &Service,
        new: &Service,
    ) -> Result<(), Error> {
        self.validate_shape(new)?;
        self.validate_references(ctx, new)?;
        ensure_meta_immutable(old, new)
    }

    /// A service cannot be deleted while an alias, binding, or port mapping
    /// still points at it. Rules reach a service only through one of its
    /// aliases, so the alias check also covers `RuleS2S` dependents.
    pub fn check_dependencies(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        self.reader
            .list::<ServiceAlias, _>(ctx, &Scope::Empty, |alias| {
                if alias.service_ref == *id {
                    return Err(Error::DependencyExists {
                        kind: Service::KIND,
                        id: id.key(),
                        dependent_kind: ServiceAlias::KIND,
                        dependent_id: alias.key(),
                    });
                }
                Ok(())
            })?;

        self.reader
            .list::<AddressGroupBinding, _>(ctx, &Scope::Empty, |binding| {
                if binding.service_ref == *id {
                    return Err(Error::DependencyExists {
                        kind: Service::KIND,
                        id: id.key(),
                        dependent_kind: AddressGroupBinding::KIND,
                        dependent_id: binding.key(),
                    });
                }
                Ok(())
            })?;

        self.reader
            .list::<AddressGroupPortMapping, _>(ctx, &Scope::Empty, |mapping| {
                if mapping.access_ports.keys().any(|service| service == id) {
                    return Err(Error::DependencyExists {
                        kind: Service::KIND,
                        id: id.key(),
                        dependent_kind: AddressGroupPortMapping::KIND,
                        dependent_id: mapping.key(),
                    });
                }
                Ok(())
            })
    }

    fn validate_shape(&self, service: &Service) -> Result<(), Error> {
        for port in &service.ingress_ports {
            ports::parse_port_or_range(&port.port).map_err(|err| Error::ShapeInvalid {
                kind: Service::KIND,
                id: service.self_ref.key(),
                field: "ingressPorts",
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }
}

// === impl ServiceAliasValidator ===

impl<'a> ServiceAliasValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<ServiceAlias>(self.reader, ctx, id)
    }

    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        alias: &ServiceAlias,
    ) -> Result<(), Error> {
        let service = resolve_ref::<Service>(
            self.reader,
            ctx,
            ServiceAlias::KIND,
            &alias.self_ref,
            "serviceRef",
            &alias.service_ref,
        )?;
        if !alias.self_ref.namespace.is_empty()
            && alias.self_ref.namespace != service.self_ref.namespace
        {
            return Err(Error::ReferenceInvalid {
                kind: ServiceAlias::KIND,
                id: alias.self_ref.key(),
                field: "serviceRef",
                target: alias.service_ref.key(),
                reason: "alias must live in its service's namespace".to_string(),
            });
        }
        Ok(())
    }

    /// Fills a missing alias namespace from the referenced service.
    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        alias: &mut ServiceAlias,
    ) -> Result<(), Error> {
        let service = resolve_ref::<Service>(
            self.reader,
            ctx,
            ServiceAlias::KIND,
            &alias.self_ref,
            "serviceRef",
            &alias.service_ref,
        )?;
        if alias.self_ref.namespace.is_empty() {
            debug!(
                alias = %alias.self_ref.name,
                namespace = %service.self_ref.namespace,
                "Filling alias namespace from its service"
            );
            alias.self_ref.namespace = service.self_ref.namespace.clone();
        } else if alias.self_ref.namespace != service.self_ref.namespace {
            return Err(Error::ReferenceInvalid {
                kind: ServiceAlias::KIND,
                id: alias.self_ref.key(),
                field: "serviceRef",
                target: alias.service_ref.key(),
                reason: "alias must live in its service's namespace".to_string(),
            });
        }
        Ok(())
    }

    /// Retargeting an alias is refused while rules still route through it.
    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &ServiceAlias,
        new: &ServiceAlias,
    ) -> Result<(), Error> {
        self.validate_references(ctx, new)?;
        ensure_meta_immutable(old, new)?;
        if new.service_ref != old.service_ref {
            self.check_dependencies(ctx, &old.self_ref)?;
        }
        Ok(())
    }

    pub fn check_dependencies(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        self.reader.list::<RuleS2S, _>(ctx, &Scope::Empty, |rule| {
            if rule.service_local_ref == *id || rule.service_ref == *id {
                return Err(Error::DependencyExists {
                    kind: ServiceAlias::KIND,
                    id: id.key(),
                    dependent_kind: RuleS2S::KIND,
                    dependent_id: rule.key(),
                });
            }
            Ok(())
        })
    }
}
