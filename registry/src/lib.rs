//! The netguard transactional object registry.
//!
//! The registry keeps one in-memory map per resource kind and mutates them
//! through transactions: a [`Writer`] stages per-kind overlays, a commit
//! publishes every touched kind atomically, and [`Reader`]s observe
//! snapshot-consistent views, optionally overlaid with a writer's staged
//! state for pre-commit validation.

#![deny(warnings, rust_2018_idioms)]
#![forbid(unsafe_code)]

mod notify;
mod reader;
mod resource;
mod scope;
mod store;
#[cfg(test)]
mod tests;
mod writer;

pub use self::{
    notify::{CommitEvent, Observer, Subject, SubscriptionId},
    reader::Reader,
    resource::{KindMap, Resource},
    scope::Scope,
    store::{Snapshot, Staged},
    writer::{SyncOp, SyncOpts, Writer},
};

use netguard_core::Error;
use parking_lot::RwLock;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use tokio_util::sync::CancellationToken;
use tracing::info;

pub(crate) struct Shared {
    pub(crate) state: RwLock<Arc<Snapshot>>,
    pub(crate) subject: Subject,
    pub(crate) closed: AtomicBool,
    pub(crate) versions: store::VersionCounter,
}

/// Process-wide owner of the netguard object graph.
///
/// Readers and writers are snapshots over shared state: any number of
/// concurrent readers is supported, and one writer at a time is assumed.
/// After [`Registry::close`], reader and writer factories fail with
/// [`Error::RegistryClosed`].
pub struct Registry {
    shared: Arc<Shared>,
}

// === impl Registry ===

impl Registry {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: RwLock::new(Arc::new(Snapshot::default())),
                subject: Subject::default(),
                closed: AtomicBool::new(false),
                versions: store::VersionCounter::default(),
            }),
        }
    }

    /// Opens a reader over the currently-committed snapshot.
    pub fn reader(&self, ctx: &CancellationToken) -> Result<Reader<'static>, Error> {
        ensure_live(ctx)?;
        self.ensure_open()?;
        Ok(Reader::committed(self.shared.state.read().clone()))
    }

    /// Opens a transaction. At most one writer is expected to be active at
    /// a time; commits serialize on the store lock regardless.
    pub fn writer(&self, ctx: &CancellationToken) -> Result<Writer, Error> {
        ensure_live(ctx)?;
        self.ensure_open()?;
        Ok(Writer::new(
            self.shared.clone(),
            self.shared.state.read().clone(),
        ))
    }

    /// Opens a reader that prefers `writer`'s staged overlays, so
    /// validators can see the to-be-committed state.
    pub fn reader_from_writer<'w>(
        &self,
        ctx: &CancellationToken,
        writer: &'w Writer,
    ) -> Result<Reader<'w>, Error> {
        ensure_live(ctx)?;
        self.ensure_open()?;
        if !writer.belongs_to(&self.shared) {
            return Err(Error::ForeignWriter);
        }
        Ok(writer.overlay_reader())
    }

    /// The subject notified after each commit.
    pub fn subject(&self) -> &Subject {
        &self.shared.subject
    }

    /// Shuts the registry down. Idempotent; existing readers keep their
    /// snapshots, and an uncommitted writer can no longer commit.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::SeqCst) {
            info!("Registry closed");
        }
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.shared.closed.load(Ordering::SeqCst) {
            return Err(Error::RegistryClosed);
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn ensure_live(ctx: &CancellationToken) -> Result<(), Error> {
    if ctx.is_cancelled() {
        return Err(Error::Cancelled);
    }
    Ok(())
}
