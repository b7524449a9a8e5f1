use crate::resource::KindMap;
use chrono::Utc;
use netguard_core::{
    AddressGroup, AddressGroupBinding, AddressGroupBindingPolicy, AddressGroupPortMapping, Host,
    HostBinding, IEAgAgRule, Network, NetworkBinding, RuleS2S, Service, ServiceAlias, SyncStatus,
};
use std::sync::atomic::{AtomicI64, Ordering};

/// One consistent point-in-time view of every kind.
///
/// Snapshots are immutable once published: a commit clones the current
/// snapshot, splices the writer's staged maps into the clone, and swaps the
/// published pointer, so concurrent readers always observe all of a commit
/// or none of it.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    pub(crate) services: KindMap<Service>,
    pub(crate) service_aliases: KindMap<ServiceAlias>,
    pub(crate) address_groups: KindMap<AddressGroup>,
    pub(crate) address_group_bindings: KindMap<AddressGroupBinding>,
    pub(crate) address_group_port_mappings: KindMap<AddressGroupPortMapping>,
    pub(crate) address_group_binding_policies: KindMap<AddressGroupBindingPolicy>,
    pub(crate) rules_s2s: KindMap<RuleS2S>,
    pub(crate) ie_ag_ag_rules: KindMap<IEAgAgRule>,
    pub(crate) networks: KindMap<Network>,
    pub(crate) network_bindings: KindMap<NetworkBinding>,
    pub(crate) hosts: KindMap<Host>,
    pub(crate) host_bindings: KindMap<HostBinding>,

    pub(crate) sync_status: SyncStatus,
}

/// A writer's per-kind overlays. `None` means the kind is untouched; a
/// touched kind holds the full intended post-commit map.
#[derive(Clone, Debug, Default)]
pub struct Staged {
    pub(crate) services: Option<KindMap<Service>>,
    pub(crate) service_aliases: Option<KindMap<ServiceAlias>>,
    pub(crate) address_groups: Option<KindMap<AddressGroup>>,
    pub(crate) address_group_bindings: Option<KindMap<AddressGroupBinding>>,
    pub(crate) address_group_port_mappings: Option<KindMap<AddressGroupPortMapping>>,
    pub(crate) address_group_binding_policies: Option<KindMap<AddressGroupBindingPolicy>>,
    pub(crate) rules_s2s: Option<KindMap<RuleS2S>>,
    pub(crate) ie_ag_ag_rules: Option<KindMap<IEAgAgRule>>,
    pub(crate) networks: Option<KindMap<Network>>,
    pub(crate) network_bindings: Option<KindMap<NetworkBinding>>,
    pub(crate) hosts: Option<KindMap<Host>>,
    pub(crate) host_bindings: Option<KindMap<HostBinding>>,
}

// === impl Staged ===

impl Staged {
    /// Replaces every touched kind's map in `next` with the staged one.
    pub(crate) fn splice_into(self, next: &mut Snapshot) {
        let Self {
            services,
            service_aliases,
            address_groups,
            address_group_bindings,
            address_group_port_mappings,
            address_group_binding_policies,
            rules_s2s,
            ie_ag_ag_rules,
            networks,
            network_bindings,
            hosts,
            host_bindings,
        } = self;

        if let Some(map) = services {
            next.services = map;
        }
        if let Some(map) = service_aliases {
            next.service_aliases = map;
        }
        if let Some(map) = address_groups {
            next.address_groups = map;
        }
        if let Some(map) = address_group_bindings {
            next.address_group_bindings = map;
        }
        if let Some(map) = address_group_port_mappings {
            next.address_group_port_mappings = map;
        }
        if let Some(map) = address_group_binding_policies {
            next.address_group_binding_policies = map;
        }
        if let Some(map) = rules_s2s {
            next.rules_s2s = map;
        }
        if let Some(map) = ie_ag_ag_rules {
            next.ie_ag_ag_rules = map;
        }
        if let Some(map) = networks {
            next.networks = map;
        }
        if let Some(map) = network_bindings {
            next.network_bindings = map;
        }
        if let Some(map) = hosts {
            next.hosts = map;
        }
        if let Some(map) = host_bindings {
            next.host_bindings = map;
        }
    }
}

/// Issues resource-version tokens that are strictly increasing across the
/// registry's lifetime. Tokens are nanosecond timestamps, nudged forward
/// whenever the clock would repeat or step back.
#[derive(Debug, Default)]
pub(crate) struct VersionCounter(AtomicI64);

// === impl VersionCounter ===

impl VersionCounter {
    pub(crate) fn next(&self) -> String {
        let now = Utc::now().timestamp_nanos_opt().unwrap_or(0);
        let mut prev = self.0.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .0
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next.to_string(),
                Err(observed) => prev = observed,
            }
        }
    }
}
