use crate::{
    reader::Reader,
    store::{Snapshot, Staged},
};
use netguard_core::{
    AddressGroup, AddressGroupBinding, AddressGroupBindingPolicy, AddressGroupPortMapping, Host,
    HostBinding, IEAgAgRule, Meta, Network, NetworkBinding, ResourceIdentifier, RuleS2S, Service,
    ServiceAlias,
};

/// The key→record map held per kind.
pub type KindMap<R> = ahash::AHashMap<String, R>;

/// The seam between the typed resource model and the store.
///
/// Every stored kind implements this: it names the kind, exposes identity
/// and metadata, and routes generic reads and writes to the kind's map in a
/// [`Snapshot`] or a writer's [`Staged`] overlays. The two hooks cover the
/// service projection: `strip_derived` runs before a record is staged,
/// `decorate` before it is handed to a reader's caller.
pub trait Resource: Clone + PartialEq + Send + Sync + 'static {
    const KIND: &'static str;

    fn self_ref(&self) -> &ResourceIdentifier;

    fn meta(&self) -> &Meta;

    fn meta_mut(&mut self) -> &mut Meta;

    fn committed(snapshot: &Snapshot) -> &KindMap<Self>;

    fn staged(staged: &Staged) -> &Option<KindMap<Self>>;

    fn staged_mut(staged: &mut Staged) -> &mut Option<KindMap<Self>>;

    fn key(&self) -> String {
        self.self_ref().key()
    }

    /// Compares everything but metadata; used to decide generation bumps.
    fn spec_eq(&self, other: &Self) -> bool {
        let mut a = self.clone();
        let mut b = other.clone();
        *a.meta_mut() = Meta::default();
        *b.meta_mut() = Meta::default();
        a == b
    }

    /// Drops read-side projections before the record is staged.
    fn strip_derived(&mut self) {}

    /// Recomputes read-side projections before the record leaves a reader.
    fn decorate(&mut self, _reader: &Reader<'_>) {}
}

macro_rules! resources {
    ($($kind:ty => $name:literal, $field:ident;)*) => {$(
        impl Resource for $kind {
            const KIND: &'static str = $name;

            fn self_ref(&self) -> &ResourceIdentifier {
                &self.self_ref
            }

            fn meta(&self) -> &Meta {
                &self.meta
            }

            fn meta_mut(&mut self) -> &mut Meta {
                &mut self.meta
            }

            fn committed(snapshot: &Snapshot) -> &KindMap<Self> {
                &snapshot.$field
            }

            fn staged(staged: &Staged) -> &Option<KindMap<Self>> {
                &staged.$field
            }

            fn staged_mut(staged: &mut Staged) -> &mut Option<KindMap<Self>> {
                &mut staged.$field
            }
        }
    )*};
}

resources! {
    ServiceAlias => "ServiceAlias", service_aliases;
    AddressGroup => "AddressGroup", address_groups;
    AddressGroupBinding => "AddressGroupBinding", address_group_bindings;
    AddressGroupPortMapping => "AddressGroupPortMapping", address_group_port_mappings;
    AddressGroupBindingPolicy => "AddressGroupBindingPolicy", address_group_binding_policies;
    RuleS2S => "RuleS2S", rules_s2s;
    IEAgAgRule => "IEAgAgRule", ie_ag_ag_rules;
    Network => "Network", networks;
    NetworkBinding => "NetworkBinding", network_bindings;
    Host => "Host", hosts;
    HostBinding => "HostBinding", host_bindings;
}

// Services carry the bound-address-groups projection, so their impl is
// written out: the projection is stripped on write and recomputed from the
// (possibly staged) bindings on read.
impl Resource for Service {
    const KIND: &'static str = "Service";

    fn self_ref(&self) -> &ResourceIdentifier {
        &self.self_ref
    }

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn committed(snapshot: &Snapshot) -> &KindMap<Self> {
        &snapshot.services
    }

    fn staged(staged: &Staged) -> &Option<KindMap<Self>> {
        &staged.services
    }

    fn staged_mut(staged: &mut Staged) -> &mut Option<KindMap<Self>> {
        &mut staged.services
    }

    fn strip_derived(&mut self) {
        self.address_groups.clear();
    }

    fn decorate(&mut self, reader: &Reader<'_>) {
        let mut groups = reader
            .kind_map::<AddressGroupBinding>()
            .values()
            .filter(|binding| binding.service_ref == self.self_ref)
            .map(|binding| binding.address_group_ref.clone())
            .collect::<Vec<_>>();
        groups.sort();
        groups.dedup();
        self.address_groups = groups;
    }
}
