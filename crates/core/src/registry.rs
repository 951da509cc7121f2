//! Live-execution registries for out-of-band cancellation.
//!
//! A read or write registers a cancellable handle under its
//! [`RequestIdentity`] when streaming begins and deregisters on normal
//! completion. A separate control request can then cancel one execution
//! by identity, or bulk-cancel everything matching a {profile, server}
//! pair. Cancellation is advisory: the registry finds and signals the
//! handle, and the operation must notice and stop its own I/O loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use fedgate_error::{ErrorCode, ErrorContext, FedgateError, Result};

use crate::model::RequestIdentity;

/// A handle that can be asked to stop. Implementations must make the
/// running operation observe the signal promptly; the registry does not
/// guarantee an immediate stop.
pub trait Cancellable: Send + Sync {
    fn cancel(&self);
}

/// Atomic-flag handle for operations that poll for cancellation between
/// I/O steps.
#[derive(Debug, Default)]
pub struct CancelFlag {
    cancelled: AtomicBool,
}

impl CancelFlag {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Cancellable for CancelFlag {
    fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

/// Concurrent table of in-flight executions. The gateway keeps one for
/// the read path and one for the write path.
pub struct ExecutionRegistry {
    name: &'static str,
    entries: DashMap<RequestIdentity, Arc<dyn Cancellable>>,
}

impl ExecutionRegistry {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
        }
    }

    /// Insert-if-absent. A duplicate identity means two executions claim
    /// the same segment slot, which is a caller bug.
    pub fn register(&self, identity: RequestIdentity, handle: Arc<dyn Cancellable>) -> Result<()> {
        match self.entries.entry(identity.clone()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(FedgateError::new(
                ErrorCode::AlreadyRegistered,
                format!(
                    "Segment {} of transaction {} is already registered for {}",
                    identity.segment_id, identity.transaction_id, self.name
                ),
            )
            .with_context(ErrorContext::Registration {
                transaction_id: identity.transaction_id,
                segment_id: identity.segment_id,
            })),
            dashmap::mapref::entry::Entry::Vacant(entry) => {
                entry.insert(handle);
                debug!(target: "execution_registry", registry = self.name, "Registered execution");
                Ok(())
            }
        }
    }

    /// Remove on normal completion. Returns whether an entry was present.
    pub fn deregister(&self, identity: &RequestIdentity) -> bool {
        self.entries.remove(identity).is_some()
    }

    /// Signal and remove one execution. Returns whether a handle was
    /// present at cancel time.
    pub fn cancel(&self, identity: &RequestIdentity) -> bool {
        match self.entries.remove(identity) {
            Some((_, handle)) => {
                handle.cancel();
                info!(
                    target: "execution_registry",
                    registry = self.name,
                    transaction_id = %identity.transaction_id,
                    segment_id = identity.segment_id,
                    "Cancelled execution"
                );
                true
            }
            None => false,
        }
    }

    /// Bulk-cancel every execution matching the given profile and server;
    /// a blank field matches everything. Returns the number cancelled.
    pub fn cancel_matching(&self, profile: &str, server: &str) -> usize {
        let matching: Vec<RequestIdentity> = self
            .entries
            .iter()
            .filter(|entry| {
                let id = entry.key();
                (profile.is_empty() || id.profile == profile)
                    && (server.is_empty() || id.server == server)
            })
            .map(|entry| entry.key().clone())
            .collect();

        let mut cancelled = 0;
        for identity in matching {
            if self.cancel(&identity) {
                cancelled += 1;
            }
        }
        if cancelled > 0 {
            info!(
                target: "execution_registry",
                registry = self.name,
                profile,
                server,
                cancelled,
                "Bulk-cancelled executions"
            );
        }
        cancelled
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The gateway's pair of registries, created once at startup.
pub struct ExecutionTracker {
    pub reads: ExecutionRegistry,
    pub writes: ExecutionRegistry,
}

impl ExecutionTracker {
    pub fn new() -> Self {
        Self {
            reads: ExecutionRegistry::new("reads"),
            writes: ExecutionRegistry::new("writes"),
        }
    }

    /// Control-surface entry point: cancel in-flight reads and writes
    /// matching {profile, server}. Blank fields match everything.
    pub fn cancel_matching(&self, profile: &str, server: &str) -> usize {
        self.reads.cancel_matching(profile, server) + self.writes.cancel_matching(profile, server)
    }
}

impl Default for ExecutionTracker {
    fn default() -> Self {
        Self::new()
    }
}
