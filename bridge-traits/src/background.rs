//! Background Execution Grants
//!
//! Provides the host's time-bounded "keep running after suspension" budget.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Opaque identifier of a background execution grant.
///
/// Handles are issued by the host and are only meaningful to the provider that
/// issued them. [`GrantHandle::INVALID`] never identifies a live grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GrantHandle(pub u64);

impl GrantHandle {
    pub const INVALID: GrantHandle = GrantHandle(0);

    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for GrantHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "grant#{}", self.0)
    }
}

/// Callback the host invokes when a grant's time budget runs out.
///
/// The handler must release the grant synchronously before returning.
pub type ExpirationHandler = Box<dyn FnOnce() + Send + 'static>;

/// Outcome reported back to the host after an opportunistic background fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchResult {
    NewData,
    NoData,
    Failed,
}

/// Background execution grant provider
///
/// Abstracts the platform's finite background execution budget:
/// - **iOS**: `UIApplication.beginBackgroundTask(expirationHandler:)`
/// - **Android**: foreground service / `WorkManager` expedited work
/// - **Desktop**: timer-backed emulation (no real suspension)
///
/// # Contract
///
/// - Every handle returned by [`begin_background_task`] must eventually be
///   passed to [`end_background_task`] exactly once.
/// - The expiration handler is invoked at most once, and only if the grant has
///   not been ended before its budget elapses.
///
/// [`begin_background_task`]: BackgroundTaskProvider::begin_background_task
/// [`end_background_task`]: BackgroundTaskProvider::end_background_task
///
/// # Example
///
/// ```ignore
/// use bridge_traits::background::BackgroundTaskProvider;
///
/// fn run_guarded(provider: &dyn BackgroundTaskProvider) -> Result<()> {
///     let handle = provider.begin_background_task(Box::new(|| {
///         // release the grant here
///     }))?;
///     do_work();
///     provider.end_background_task(handle);
///     Ok(())
/// }
/// ```
pub trait BackgroundTaskProvider: Send + Sync {
    /// Request a new grant. The returned handle is always valid.
    fn begin_background_task(&self, on_expiration: ExpirationHandler) -> Result<GrantHandle>;

    /// Return a grant to the host.
    fn end_background_task(&self, handle: GrantHandle);

    /// Remaining budget in seconds, when the host exposes it.
    fn remaining_time_secs(&self) -> Option<f64> {
        None
    }
}
