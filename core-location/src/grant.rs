//! Background execution grant manager.
//!
//! Tracks the single live grant obtained from the host's
//! [`BackgroundTaskProvider`]. Every transition is a compare-exchange on one
//! atomic slot holding the live handle, so concurrent `acquire`, `release` and
//! host expiry callbacks cannot double-acquire or double-release.
//!
//! ```text
//!            acquire()                      release() / expiry
//!   INVALID ───────────> handle (active) ─────────────────────> INVALID
//!      ▲                                                          │
//!      └──────────────────────────────────────────────────────────┘
//! ```

use crate::error::Result;
use bridge_traits::{BackgroundTaskProvider, GrantHandle};
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};
use tracing::{debug, warn};

/// A grant handed out by [`GrantManager::acquire`].
///
/// Only the manager can create one, so a handle that was never acquired can
/// never reach [`GrantManager::release`].
#[derive(Clone)]
pub struct ExecutionGrant {
    handle: GrantHandle,
    slot: Arc<AtomicU64>,
}

impl ExecutionGrant {
    pub fn handle(&self) -> GrantHandle {
        self.handle
    }

    /// Whether this grant is still the live one.
    pub fn is_active(&self) -> bool {
        self.handle.is_valid() && self.slot.load(Ordering::SeqCst) == self.handle.0
    }
}

impl PartialEq for ExecutionGrant {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl Eq for ExecutionGrant {}

impl fmt::Debug for ExecutionGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecutionGrant")
            .field("handle", &self.handle)
            .field("is_active", &self.is_active())
            .finish()
    }
}

const TICKET_PENDING: u8 = 0;
const TICKET_RECORDED: u8 = 1;
const TICKET_EXPIRED_EARLY: u8 = 2;

/// Hand-off between `acquire` and the expiry callback for one request.
///
/// The host may expire a grant before `begin_background_task` has even
/// returned its handle; whichever side loses the race on `state` is the one
/// that ends the grant.
struct GrantTicket {
    handle: OnceLock<GrantHandle>,
    state: AtomicU8,
}

impl GrantTicket {
    fn new() -> Self {
        Self {
            handle: OnceLock::new(),
            state: AtomicU8::new(TICKET_PENDING),
        }
    }
}

/// Owner of the single live background execution grant.
pub struct GrantManager {
    provider: Arc<dyn BackgroundTaskProvider>,
    slot: Arc<AtomicU64>,
}

impl GrantManager {
    pub fn new(provider: Arc<dyn BackgroundTaskProvider>) -> Self {
        Self {
            provider,
            slot: Arc::new(AtomicU64::new(GrantHandle::INVALID.0)),
        }
    }

    /// The live grant, if any.
    pub fn active(&self) -> Option<ExecutionGrant> {
        let raw = self.slot.load(Ordering::SeqCst);
        let handle = GrantHandle::new(raw);
        handle.is_valid().then(|| self.grant(handle))
    }

    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }

    /// Seconds left on the live grant's budget.
    ///
    /// `None` when no grant is live or the host does not expose its budget.
    pub fn remaining_time_secs(&self) -> Option<f64> {
        if self.is_active() {
            self.provider.remaining_time_secs()
        } else {
            None
        }
    }

    fn grant(&self, handle: GrantHandle) -> ExecutionGrant {
        ExecutionGrant {
            handle,
            slot: Arc::clone(&self.slot),
        }
    }

    /// Return the live grant, requesting a new one from the host if none is live.
    ///
    /// The host receives an expiry callback that releases the grant
    /// synchronously when the budget runs out.
    ///
    /// # Errors
    ///
    /// Fails only when the host refuses to issue a grant.
    pub fn acquire(&self) -> Result<ExecutionGrant> {
        if let Some(grant) = self.active() {
            debug!(
                handle = %grant.handle,
                remaining_secs = ?self.provider.remaining_time_secs(),
                "Reusing live background grant"
            );
            return Ok(grant);
        }

        let ticket = Arc::new(GrantTicket::new());
        let on_expiration = {
            let ticket = Arc::clone(&ticket);
            let slot = Arc::clone(&self.slot);
            let provider = Arc::clone(&self.provider);
            Box::new(move || {
                if ticket
                    .state
                    .compare_exchange(
                        TICKET_PENDING,
                        TICKET_EXPIRED_EARLY,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    )
                    .is_ok()
                {
                    return;
                }
                if let Some(handle) = ticket.handle.get() {
                    if release_handle(&slot, provider.as_ref(), *handle) {
                        warn!(%handle, "Background grant expired before work completed");
                    }
                }
            })
        };

        let handle = self.provider.begin_background_task(on_expiration)?;
        // The ticket is fresh, so the cell is still empty.
        let _ = ticket.handle.set(handle);

        match self.slot.compare_exchange(
            GrantHandle::INVALID.0,
            handle.0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        ) {
            Ok(_) => {
                let recorded = ticket
                    .state
                    .compare_exchange(
                        TICKET_PENDING,
                        TICKET_RECORDED,
                        Ordering::SeqCst,
                        Ordering::SeqCst,
                    )
                    .is_ok();

                if !recorded {
                    // Expired while we were installing it.
                    release_handle(&self.slot, self.provider.as_ref(), handle);
                    warn!(%handle, "Background grant expired during acquisition");
                } else {
                    debug!(%handle, "Acquired background grant");
                }
                Ok(self.grant(handle))
            }
            Err(winner) => {
                // A concurrent acquire installed its grant first. Ours never
                // became live, so the expiry callback can no longer match it.
                let _ = ticket.state.compare_exchange(
                    TICKET_PENDING,
                    TICKET_RECORDED,
                    Ordering::SeqCst,
                    Ordering::SeqCst,
                );
                self.provider.end_background_task(handle);
                debug!(%handle, winner, "Returned duplicate background grant");
                Ok(self.grant(GrantHandle::new(winner)))
            }
        }
    }

    /// Release `grant` if it is still live.
    ///
    /// Returns `true` only for the call that actually returned the handle to
    /// the host. Releasing an inactive grant, or a grant issued by another
    /// manager, is a no-op.
    pub fn release(&self, grant: &ExecutionGrant) -> bool {
        if !Arc::ptr_eq(&grant.slot, &self.slot) {
            return false;
        }
        release_handle(&self.slot, self.provider.as_ref(), grant.handle)
    }

    /// Release whichever grant is live. Returns `false` when none is.
    pub fn release_active(&self) -> bool {
        match self.active() {
            Some(grant) => self.release(&grant),
            None => false,
        }
    }
}

impl fmt::Debug for GrantManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GrantManager")
            .field("active", &self.active().map(|grant| grant.handle))
            .finish()
    }
}

fn release_handle(slot: &AtomicU64, provider: &dyn BackgroundTaskProvider, handle: GrantHandle) -> bool {
    if !handle.is_valid() {
        return false;
    }

    let released = slot
        .compare_exchange(
            handle.0,
            GrantHandle::INVALID.0,
            Ordering::SeqCst,
            Ordering::SeqCst,
        )
        .is_ok();

    if released {
        provider.end_background_task(handle);
        debug!(%handle, "Released background grant");
    }
    released
}
