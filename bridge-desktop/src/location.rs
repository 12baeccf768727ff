//! Simulated Location Service
//!
//! Desktop has no sensor stack worth tracking, so the service is driven by the
//! host application (or a test): it records the settings and update modes the
//! core asks for and forwards injected samples to the registered delegate the
//! way a mobile location manager would.

use bridge_traits::{
    error::{BridgeError, Result},
    location::{
        AuthorizationState, LocationEventSink, LocationService, LocationSettings, RawLocation,
        UpdateMode,
    },
};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError, Weak};
use tracing::{debug, trace};

/// In-process stand-in for the platform location manager.
pub struct SimulatedLocationService {
    state: Mutex<SimulatorState>,
}

struct SimulatorState {
    settings: Option<LocationSettings>,
    delegate: Option<Weak<dyn LocationEventSink>>,
    active_modes: HashSet<UpdateMode>,
    authorization: AuthorizationState,
    services_enabled: bool,
    settings_applied: usize,
    start_calls: usize,
    stop_calls: usize,
}

impl SimulatedLocationService {
    /// Create a simulator with services enabled and `AuthorizedAlways`.
    pub fn new() -> Self {
        Self::with_authorization(AuthorizationState::AuthorizedAlways)
    }

    pub fn with_authorization(authorization: AuthorizationState) -> Self {
        Self {
            state: Mutex::new(SimulatorState {
                settings: None,
                delegate: None,
                active_modes: HashSet::new(),
                authorization,
                services_enabled: true,
                settings_applied: 0,
                start_calls: 0,
                stop_calls: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SimulatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn delegate(&self) -> Option<std::sync::Arc<dyn LocationEventSink>> {
        self.lock().delegate.as_ref().and_then(Weak::upgrade)
    }

    /// Deliver a batch to the delegate, as the platform would after a fix.
    ///
    /// Returns `false` when nothing was delivered: no update mode is running
    /// or the delegate is gone.
    pub fn deliver(&self, batch: &[RawLocation]) -> bool {
        if self.lock().active_modes.is_empty() {
            trace!(samples = batch.len(), "Dropping batch, no update mode running");
            return false;
        }

        match self.delegate() {
            Some(delegate) => {
                delegate.on_samples(batch);
                true
            }
            None => false,
        }
    }

    /// Report a location failure to the delegate.
    pub fn fail(&self, message: &str) -> bool {
        match self.delegate() {
            Some(delegate) => {
                delegate.on_failure(message);
                true
            }
            None => false,
        }
    }

    /// Change the authorization state and notify the delegate.
    pub fn set_authorization(&self, authorization: AuthorizationState) {
        self.lock().authorization = authorization;
        debug!(status = %authorization, "Simulated authorization change");

        if let Some(delegate) = self.delegate() {
            delegate.on_authorization_changed(authorization);
        }
    }

    pub fn set_services_enabled(&self, enabled: bool) {
        self.lock().services_enabled = enabled;
    }

    pub fn is_updating(&self, mode: UpdateMode) -> bool {
        self.lock().active_modes.contains(&mode)
    }

    pub fn settings(&self) -> Option<LocationSettings> {
        self.lock().settings.clone()
    }

    /// Number of times settings were applied.
    pub fn settings_applied(&self) -> usize {
        self.lock().settings_applied
    }

    pub fn start_calls(&self) -> usize {
        self.lock().start_calls
    }

    pub fn stop_calls(&self) -> usize {
        self.lock().stop_calls
    }
}

impl Default for SimulatedLocationService {
    fn default() -> Self {
        Self::new()
    }
}

impl LocationService for SimulatedLocationService {
    fn apply_settings(
        &self,
        settings: &LocationSettings,
        delegate: Weak<dyn LocationEventSink>,
    ) -> Result<()> {
        if settings.allows_background_updates && settings.update_modes.is_empty() {
            return Err(BridgeError::OperationFailed(
                "Background updates requested without any update mode".to_string(),
            ));
        }

        let mut state = self.lock();
        state.settings = Some(settings.clone());
        state.delegate = Some(delegate);
        state.settings_applied += 1;
        debug!(accuracy = ?settings.accuracy, activity = ?settings.activity_type, "Applied simulated location settings");
        Ok(())
    }

    fn start_updates(&self, mode: UpdateMode) -> Result<()> {
        let mut state = self.lock();
        state.start_calls += 1;
        state.active_modes.insert(mode);
        Ok(())
    }

    fn stop_updates(&self, mode: UpdateMode) -> Result<()> {
        let mut state = self.lock();
        state.stop_calls += 1;
        state.active_modes.remove(&mode);
        Ok(())
    }

    fn services_enabled(&self) -> bool {
        self.lock().services_enabled
    }

    fn authorization_state(&self) -> AuthorizationState {
        self.lock().authorization
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingSink {
        batches: Mutex<Vec<usize>>,
        failures: Mutex<Vec<String>>,
        authorizations: Mutex<Vec<AuthorizationState>>,
    }

    impl LocationEventSink for RecordingSink {
        fn on_samples(&self, batch: &[RawLocation]) {
            self.batches.lock().unwrap().push(batch.len());
        }

        fn on_authorization_changed(&self, state: AuthorizationState) {
            self.authorizations.lock().unwrap().push(state);
        }

        fn on_failure(&self, message: &str) {
            self.failures.lock().unwrap().push(message.to_string());
        }
    }

    fn sample() -> RawLocation {
        RawLocation {
            latitude: 10.77,
            longitude: 106.70,
            horizontal_accuracy: 5.0,
            altitude: 3.0,
            speed: 2.5,
            speed_accuracy: 0.5,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_delivers_only_while_updating() {
        let service = SimulatedLocationService::new();
        let sink = Arc::new(RecordingSink::default());
        let delegate: Arc<dyn LocationEventSink> = sink.clone();

        service
            .apply_settings(&LocationSettings::default(), Arc::downgrade(&delegate))
            .unwrap();
        assert!(!service.deliver(&[sample()]));

        service.start_updates(UpdateMode::Continuous).unwrap();
        assert!(service.deliver(&[sample(), sample()]));
        assert_eq!(*sink.batches.lock().unwrap(), vec![2]);

        service.stop_updates(UpdateMode::Continuous).unwrap();
        assert!(!service.deliver(&[sample()]));
    }

    #[test]
    fn test_dropped_delegate_receives_nothing() {
        let service = SimulatedLocationService::new();
        let delegate: Arc<dyn LocationEventSink> = Arc::new(RecordingSink::default());
        service
            .apply_settings(&LocationSettings::default(), Arc::downgrade(&delegate))
            .unwrap();
        service.start_updates(UpdateMode::Continuous).unwrap();
        drop(delegate);

        assert!(!service.deliver(&[sample()]));
        assert!(!service.fail("signal lost"));
    }

    #[test]
    fn test_authorization_change_notifies_delegate() {
        let service = SimulatedLocationService::with_authorization(AuthorizationState::NotDetermined);
        let sink = Arc::new(RecordingSink::default());
        let delegate: Arc<dyn LocationEventSink> = sink.clone();
        service
            .apply_settings(&LocationSettings::default(), Arc::downgrade(&delegate))
            .unwrap();

        service.set_authorization(AuthorizationState::Denied);

        assert_eq!(service.authorization_state(), AuthorizationState::Denied);
        assert_eq!(
            *sink.authorizations.lock().unwrap(),
            vec![AuthorizationState::Denied]
        );
    }

    #[test]
    fn test_rejects_background_without_modes() {
        let service = SimulatedLocationService::new();
        let delegate: Arc<dyn LocationEventSink> = Arc::new(RecordingSink::default());
        let settings = LocationSettings {
            update_modes: Vec::new(),
            ..Default::default()
        };

        let result = service.apply_settings(&settings, Arc::downgrade(&delegate));

        assert!(matches!(result, Err(BridgeError::OperationFailed(_))));
        assert_eq!(service.settings_applied(), 0);
    }
}
