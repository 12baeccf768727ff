//! Session lifecycle controller.
//!
//! A two-state machine (`Stopped` / `Running`) over the
//! [`LocationSourceAdapter`]. Transitions are compare-exchange operations on a
//! single atomic, so only the caller that wins a transition touches the
//! adapter; every other caller observes a no-op success.

use crate::adapter::LocationSourceAdapter;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    Stopped,
    Running,
}

impl SessionState {
    fn as_u8(self) -> u8 {
        match self {
            SessionState::Stopped => 0,
            SessionState::Running => 1,
        }
    }

    fn from_u8(raw: u8) -> Self {
        match raw {
            1 => SessionState::Running,
            _ => SessionState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Stopped => write!(f, "stopped"),
            SessionState::Running => write!(f, "running"),
        }
    }
}

pub struct SessionController {
    adapter: Arc<LocationSourceAdapter>,
    state: AtomicU8,
}

impl SessionController {
    pub fn new(adapter: Arc<LocationSourceAdapter>) -> Self {
        Self {
            adapter,
            state: AtomicU8::new(SessionState::Stopped.as_u8()),
        }
    }

    pub fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub fn adapter(&self) -> &Arc<LocationSourceAdapter> {
        &self.adapter
    }

    fn transition(&self, from: SessionState, to: SessionState) -> bool {
        self.state
            .compare_exchange(from.as_u8(), to.as_u8(), Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    /// `Stopped -> Running`, configuring the adapter.
    ///
    /// Returns `Ok(false)` when the session was already running.
    ///
    /// # Errors
    ///
    /// When the adapter cannot be configured the session is rolled back to
    /// `Stopped` and the adapter error is returned.
    pub fn start(&self) -> Result<bool> {
        if !self.transition(SessionState::Stopped, SessionState::Running) {
            debug!("Session already running");
            return Ok(false);
        }

        if let Err(err) = self.adapter.configure() {
            self.transition(SessionState::Running, SessionState::Stopped);
            warn!(error = %err, "Failed to start location session");
            return Err(err);
        }

        // A stop that won the race while we were configuring may have cleared
        // the adapter's flag before any mode was started.
        if !self.state().is_running() {
            debug!("Session stopped while configuring");
            self.adapter.stop_modes()?;
            return Ok(true);
        }

        info!("Location session started");
        Ok(true)
    }

    /// `Running -> Stopped`, tearing the adapter down.
    ///
    /// Returns `Ok(false)` without touching the adapter when already stopped.
    /// Teardown errors are returned but the session stays `Stopped`.
    pub fn stop(&self) -> Result<bool> {
        if !self.transition(SessionState::Running, SessionState::Stopped) {
            debug!("Session already stopped");
            return Ok(false);
        }

        self.adapter.teardown()?;
        info!("Location session stopped");
        Ok(true)
    }
}

impl fmt::Debug for SessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state())
            .field("updating", &self.adapter.is_updating())
            .finish()
    }
}
