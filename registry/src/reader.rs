use crate::{
    ensure_live,
    resource::{KindMap, Resource},
    scope::Scope,
    store::{Snapshot, Staged},
};
use netguard_core::{Cidr, Error, Network, ResourceIdentifier, SyncStatus};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// A read-only, snapshot-consistent view of the registry.
///
/// A committed reader sees the snapshot that was current when it was
/// opened; a reader obtained from a writer additionally sees that writer's
/// staged overlays, kind by kind, so validators can check the
/// to-be-committed state. Records are handed out as copies.
pub struct Reader<'w> {
    snapshot: Arc<Snapshot>,
    staged: Option<&'w Staged>,
}

// === impl Reader ===

impl<'w> Reader<'w> {
    pub(crate) fn committed(snapshot: Arc<Snapshot>) -> Reader<'static> {
        Reader {
            snapshot,
            staged: None,
        }
    }

    pub(crate) fn overlay(snapshot: Arc<Snapshot>, staged: &'w Staged) -> Self {
        Self {
            snapshot,
            staged: Some(staged),
        }
    }

    /// The map this reader resolves `R` against: the writer's overlay when
    /// the kind has been touched, the committed snapshot otherwise.
    pub(crate) fn kind_map<R: Resource>(&self) -> &KindMap<R> {
        if let Some(staged) = self.staged {
            if let Some(overlay) = R::staged(staged) {
                return overlay;
            }
        }
        R::committed(&self.snapshot)
    }

    /// Invokes `consume` for each record matched by `scope`, in unspecified
    /// order. An error from `consume` stops the listing and propagates.
    pub fn list<R, F>(
        &self,
        ctx: &CancellationToken,
        scope: &Scope,
        mut consume: F,
    ) -> Result<(), Error>
    where
        R: Resource,
        F: FnMut(R) -> Result<(), Error>,
    {
        ensure_live(ctx)?;
        let map = self.kind_map::<R>();
        match scope {
            Scope::Empty => {
                for record in map.values() {
                    ensure_live(ctx)?;
                    consume(self.export(record.clone()))?;
                }
            }
            Scope::ByIdentifiers(ids) => {
                for id in ids {
                    ensure_live(ctx)?;
                    if id.is_namespace_only() {
                        for record in map
                            .values()
                            .filter(|record| record.self_ref().namespace == id.namespace)
                        {
                            ensure_live(ctx)?;
                            consume(self.export(record.clone()))?;
                        }
                        // The listing ends with the first namespace-wide
                        // identifier; any identifiers after it are ignored.
                        return Ok(());
                    }
                    if let Some(record) = map.get(&id.key()) {
                        consume(self.export(record.clone()))?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Returns the record with the exact key of `id`.
    pub fn get_by_id<R: Resource>(
        &self,
        ctx: &CancellationToken,
        id: &ResourceIdentifier,
    ) -> Result<R, Error> {
        ensure_live(ctx)?;
        self.kind_map::<R>()
            .get(&id.key())
            .cloned()
            .map(|record| self.export(record))
            .ok_or_else(|| Error::NotFound {
                kind: R::KIND,
                id: id.key(),
            })
    }

    /// Finds the network whose CIDR equals `cidr`, comparing parsed values
    /// so that equivalent spellings collide.
    pub fn get_network_by_cidr(
        &self,
        ctx: &CancellationToken,
        cidr: &str,
    ) -> Result<Network, Error> {
        ensure_live(ctx)?;
        let target = cidr.parse::<Cidr>().ok();
        for network in self.kind_map::<Network>().values() {
            ensure_live(ctx)?;
            if network.cidr == cidr {
                return Ok(network.clone());
            }
            if let (Some(target), Ok(stored)) = (target, network.cidr.parse::<Cidr>()) {
                if stored.as_net() == target.as_net() {
                    return Ok(network.clone());
                }
            }
        }
        Err(Error::NotFound {
            kind: Network::KIND,
            id: cidr.to_string(),
        })
    }

    pub fn get_sync_status(&self, ctx: &CancellationToken) -> Result<SyncStatus, Error> {
        ensure_live(ctx)?;
        Ok(self.snapshot.sync_status)
    }

    fn export<R: Resource>(&self, mut record: R) -> R {
        record.decorate(self);
        record
    }
}
