//! Background Execution Grant Implementation

use bridge_traits::{
    background::{BackgroundTaskProvider, ExpirationHandler, GrantHandle},
    error::{BridgeError, Result},
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Budget granted per background task on iOS.
pub const DEFAULT_GRANT_BUDGET: Duration = Duration::from_secs(30);

type GrantTable = Arc<Mutex<HashMap<GrantHandle, GrantInfo>>>;

/// Tokio-based grant provider for desktop.
///
/// Desktop processes are never suspended, so the provider only emulates the
/// mobile contract: each grant gets a timer, and when the budget elapses the
/// expiration handler is invoked on a Tokio worker.
pub struct TokioBackgroundTaskProvider {
    grants: GrantTable,
    next_handle: AtomicU64,
    budget: Duration,
}

struct GrantInfo {
    timer: Option<JoinHandle<()>>,
    started_at: Instant,
    expiring: bool,
}

fn lock(grants: &GrantTable) -> MutexGuard<'_, HashMap<GrantHandle, GrantInfo>> {
    grants.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TokioBackgroundTaskProvider {
    /// Create a provider with the default 30 second budget.
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_GRANT_BUDGET)
    }

    /// Create a provider with a custom per-grant budget.
    pub fn with_budget(budget: Duration) -> Self {
        Self {
            grants: Arc::new(Mutex::new(HashMap::new())),
            next_handle: AtomicU64::new(1),
            budget,
        }
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    /// Number of grants that have been issued but not yet ended.
    pub fn outstanding(&self) -> usize {
        lock(&self.grants).len()
    }

    pub fn is_outstanding(&self, handle: GrantHandle) -> bool {
        lock(&self.grants).contains_key(&handle)
    }

    async fn run_expiry_timer(
        grants: GrantTable,
        handle: GrantHandle,
        budget: Duration,
        on_expiration: ExpirationHandler,
    ) {
        tokio::time::sleep(budget).await;

        {
            let mut grants = lock(&grants);
            match grants.get_mut(&handle) {
                Some(info) => info.expiring = true,
                None => return,
            }
        }

        debug!(%handle, "Background grant budget exhausted, invoking expiration handler");
        on_expiration();

        if lock(&grants).remove(&handle).is_some() {
            warn!(%handle, "Expiration handler returned without ending the grant");
        }
    }
}

impl Default for TokioBackgroundTaskProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl BackgroundTaskProvider for TokioBackgroundTaskProvider {
    fn begin_background_task(&self, on_expiration: ExpirationHandler) -> Result<GrantHandle> {
        let runtime = Handle::try_current().map_err(|e| {
            BridgeError::NotAvailable(format!("Background grants require a Tokio runtime: {}", e))
        })?;

        let handle = GrantHandle::new(self.next_handle.fetch_add(1, Ordering::SeqCst));

        lock(&self.grants).insert(
            handle,
            GrantInfo {
                timer: None,
                started_at: Instant::now(),
                expiring: false,
            },
        );

        let timer = runtime.spawn(Self::run_expiry_timer(
            Arc::clone(&self.grants),
            handle,
            self.budget,
            on_expiration,
        ));

        if let Some(info) = lock(&self.grants).get_mut(&handle) {
            info.timer = Some(timer);
        }

        debug!(%handle, budget_secs = self.budget.as_secs_f64(), "Background grant issued");
        Ok(handle)
    }

    fn end_background_task(&self, handle: GrantHandle) {
        let Some(info) = lock(&self.grants).remove(&handle) else {
            warn!(%handle, "Ending a background grant that is not outstanding");
            return;
        };

        // The expiring timer is the caller in that case; it finishes on its own.
        if !info.expiring {
            if let Some(timer) = info.timer {
                timer.abort();
            }
        }

        debug!(%handle, held_ms = info.started_at.elapsed().as_millis() as u64, "Background grant ended");
    }

    fn remaining_time_secs(&self) -> Option<f64> {
        let grants = lock(&self.grants);
        grants
            .values()
            .map(|info| self.budget.saturating_sub(info.started_at.elapsed()))
            .min()
            .map(|remaining| remaining.as_secs_f64())
    }
}
