use crate::{
    ensure_live,
    notify::CommitEvent,
    reader::Reader,
    resource::{KindMap, Resource},
    scope::Scope,
    store::{Snapshot, Staged},
    Shared,
};
use ahash::AHashSet;
use chrono::Utc;
use netguard_core::{Error, ResourceIdentifier, SyncStatus};
use std::sync::{atomic::Ordering, Arc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// How a sync call treats records absent from its input.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum SyncOp {
    /// Replace everything the scope selects: staged records not in the
    /// input are deleted, input records are upserted.
    #[default]
    FullSync,

    /// Create-or-update only; never deletes.
    Upsert,

    /// Delete the input records' keys; never adds.
    Delete,
}

/// Options recognized by [`Writer::sync`].
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncOpts {
    pub operation: SyncOp,
}

impl From<SyncOp> for SyncOpts {
    fn from(operation: SyncOp) -> Self {
        Self { operation }
    }
}

/// A transaction over the registry.
///
/// Mutations accumulate in per-kind overlays; the first touch of a kind
/// copies that kind's committed map, so an overlay always holds the full
/// intended post-commit state. Nothing is visible to committed readers
/// until [`Writer::commit`] publishes every touched kind at once.
pub struct Writer {
    shared: Arc<Shared>,
    base: Arc<Snapshot>,
    staged: Staged,
}

// === impl Writer ===

impl Writer {
    pub(crate) fn new(shared: Arc<Shared>, base: Arc<Snapshot>) -> Self {
        Self {
            shared,
            base,
            staged: Staged::default(),
        }
    }

    pub(crate) fn belongs_to(&self, shared: &Arc<Shared>) -> bool {
        Arc::ptr_eq(&self.shared, shared)
    }

    pub(crate) fn overlay_reader(&self) -> Reader<'_> {
        Reader::overlay(self.base.clone(), &self.staged)
    }

    /// Stages `records` for kind `R` according to `opts.operation`.
    ///
    /// Full sync deletes the staged records the scope selects by exact key
    /// (a namespace-only identifier selects nothing for deletion) and
    /// upserts the input; an empty scope replaces the whole kind.
    pub fn sync<R: Resource>(
        &mut self,
        ctx: &CancellationToken,
        records: Vec<R>,
        scope: &Scope,
        opts: SyncOpts,
    ) -> Result<(), Error> {
        ensure_live(ctx)?;
        debug!(
            kind = %R::KIND,
            records = records.len(),
            operation = ?opts.operation,
            "Syncing"
        );
        let overlay = overlay_entry::<R>(&mut self.staged, &self.base);
        match opts.operation {
            SyncOp::FullSync => {
                let incoming: AHashSet<String> = records.iter().map(Resource::key).collect();
                match scope {
                    Scope::Empty => overlay.retain(|key, _| incoming.contains(key)),
                    Scope::ByIdentifiers(ids) => {
                        let selected: AHashSet<String> = ids
                            .iter()
                            .filter(|id| !id.name.is_empty())
                            .map(ResourceIdentifier::key)
                            .collect();
                        overlay.retain(|key, _| !selected.contains(key) || incoming.contains(key));
                    }
                }
                for record in records {
                    ensure_live(ctx)?;
                    stage(&self.shared, overlay, record);
                }
            }
            SyncOp::Upsert => {
                for record in records {
                    ensure_live(ctx)?;
                    stage(&self.shared, overlay, record);
                }
            }
            SyncOp::Delete => {
                for record in &records {
                    ensure_live(ctx)?;
                    overlay.remove(&record.key());
                }
            }
        }
        Ok(())
    }

    /// Removes the given keys from the staged overlay. Missing keys are
    /// no-ops.
    pub fn delete_by_ids<R: Resource>(
        &mut self,
        ctx: &CancellationToken,
        ids: &[ResourceIdentifier],
    ) -> Result<(), Error> {
        ensure_live(ctx)?;
        let overlay = overlay_entry::<R>(&mut self.staged, &self.base);
        for id in ids {
            ensure_live(ctx)?;
            overlay.remove(&id.key());
        }
        Ok(())
    }

    /// Atomically publishes every touched kind and notifies the registry's
    /// subject. The store is untouched on failure.
    pub fn commit(self) -> Result<(), Error> {
        let Self { shared, staged, .. } = self;
        if shared.closed.load(Ordering::SeqCst) {
            return Err(Error::RegistryClosed);
        }

        let updated_at = Utc::now();
        {
            let mut state = shared.state.write();
            let mut next = Snapshot::clone(&state);
            staged.splice_into(&mut next);
            next.sync_status = SyncStatus { updated_at };
            *state = Arc::new(next);
        }
        debug!(%updated_at, "Committed");

        shared.subject.notify(&CommitEvent { updated_at });
        Ok(())
    }

    /// Discards all staged overlays.
    pub fn abort(self) {
        debug!("Aborted");
    }
}

fn overlay_entry<'s, R: Resource>(staged: &'s mut Staged, base: &Snapshot) -> &'s mut KindMap<R> {
    R::staged_mut(staged).get_or_insert_with(|| R::committed(base).clone())
}

/// Applies the metadata rules and places the record in the overlay.
///
/// A staged predecessor donates its UID and creation timestamp when the
/// incoming record leaves them unset; the generation grows when the spec
/// portion changed. Every staged write gets a fresh resource version.
fn stage<R: Resource>(shared: &Shared, overlay: &mut KindMap<R>, mut record: R) {
    record.strip_derived();
    let key = record.key();

    if let Some(prev) = overlay.get(&key) {
        let prev_meta = prev.meta().clone();
        let spec_unchanged = record.spec_eq(prev);
        let meta = record.meta_mut();
        if meta.uid.is_empty() {
            meta.uid = prev_meta.uid;
        }
        if meta.creation_timestamp.is_none() {
            meta.creation_timestamp = prev_meta.creation_timestamp;
        }
        if meta.generation == 0 {
            meta.generation = if spec_unchanged {
                prev_meta.generation
            } else {
                prev_meta.generation + 1
            };
        }
    }

    let meta = record.meta_mut();
    if meta.uid.is_empty() {
        meta.uid = uuid::Uuid::new_v4().to_string();
    }
    if meta.creation_timestamp.is_none() {
        meta.creation_timestamp = Some(Utc::now());
    }
    if meta.generation == 0 {
        meta.generation = 1;
    }
    meta.resource_version = shared.versions.next();

    overlay.insert(key, record);
}
