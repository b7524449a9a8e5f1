use crate::{ensure_exists, ensure_meta_immutable, resolve_ref};
use netguard_core::{
    ports, AddressGroup, Error, IEAgAgRule, ResourceIdentifier, RuleS2S, ServiceAlias,
};
use netguard_registry::{Reader, Resource};
use tokio_util::sync::CancellationToken;

pub struct RuleS2SValidator<'a> {
    reader: &'a Reader<'a>,
}

pub struct IEAgAgRuleValidator<'a> {
    reader: &'a Reader<'a>,
}

// === impl RuleS2SValidator ===

impl<'a> RuleS2SValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<RuleS2S>(self.reader, ctx, id)
    }

    /// Both endpoints must resolve to aliases, and the rule must live in
    /// its local alias's namespace.
    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        rule: &RuleS2S,
    ) -> Result<(), Error> {
        resolve_ref::<ServiceAlias>(
            self.reader,
            ctx,
            RuleS2S::KIND,
            &rule.self_ref,
            "serviceLocalRef",
            &rule.service_local_ref,
        )?;
        resolve_ref::<ServiceAlias>(
            self.reader,
            ctx,
            RuleS2S::KIND,
            &rule.self_ref,
            "serviceRef",
            &rule.service_ref,
        )?;

        if rule.self_ref.namespace != rule.service_local_ref.namespace {
            return Err(Error::ReferenceInvalid {
                kind: RuleS2S::KIND,
                id: rule.self_ref.key(),
                field: "serviceLocalRef",
                target: rule.service_local_ref.key(),
                reason: "rule must live in its local alias's namespace".to_string(),
            });
        }
        Ok(())
    }

    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        rule: &RuleS2S,
    ) -> Result<(), Error> {
        self.validate_references(ctx, rule)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &RuleS2S,
        new: &RuleS2S,
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

// === impl IEAgAgRuleValidator ===

impl<'a> IEAgAgRuleValidator<'a> {
    pub(crate) fn new(reader: &'a Reader<'a>) -> Self {
        Self { reader }
    }

    pub fn validate_exists(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<(), Error> {
        ensure_exists::<IEAgAgRule>(self.reader, ctx, id)
    }

    pub fn validate_references(
        &self,
        ctx: &CancellationToken,
        rule: &IEAgAgRule,
    ) -> Result<(), Error> {
        resolve_ref::<AddressGroup>(
            self.reader,
            ctx,
            IEAgAgRule::KIND,
            &rule.self_ref,
            "addressGroupLocal",
            &rule.address_group_local,
        )?;
        resolve_ref::<AddressGroup>(
            self.reader,
            ctx,
            IEAgAgRule::KIND,
            &rule.self_ref,
            "addressGroup",
            &rule.address_group,
        )?;
        Ok(())
    }

    pub fn validate_for_creation(
        &self,
        ctx: &CancellationToken,
        rule: &IEAgAgRule,
    ) -> Result<(), Error> {
        self.validate_shape(rule)?;
        self.validate_references(ctx, rule)
    }

    pub fn validate_for_update(
        &self,
        ctx: &CancellationToken,
        old: &IEAgAgRule,
        new: &IEAgAgRule,
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

    /// Every port column must parse as a port number or an `a-b` range.
    fn validate_shape(&self, rule: &IEAgAgRule) -> Result<(), Error> {
        for spec in &rule.ports {
            ports::parse_port_or_range(&spec.destination).map_err(|err| Error::ShapeInvalid {
                kind: IEAgAgRule::KIND,
                id: rule.self_ref.key(),
                field: "ports",
                reason: err.to_string(),
            })?;
            if let Some(source) = &spec.source {
                ports::parse_port_or_range(source).map_err(|err| Error::ShapeInvalid {
                    kind: IEAgAgRule::KIND,
                    id: rule.self_ref.key(),
                    field: "ports",
                    reason: err.to_string(),
                })?;
            }
        }
        Ok(())
    }
}
