//! # Location Source Adapter
//!
//! Owns the host location session and turns host callbacks into normalized
//! events.
//!
//! ## Overview
//!
//! The adapter is registered with the host [`LocationService`] as its
//! [`LocationEventSink`]. The host only keeps a weak reference, so dropping the
//! bridge silently detaches it.
//!
//! - [`configure`](LocationSourceAdapter::configure) applies the session
//!   settings once per process and starts every configured update mode.
//! - [`teardown`](LocationSourceAdapter::teardown) stops both update modes.
//! - Sample batches are reduced to their most recent element and normalized
//!   into a [`LocationSample`]; authorization changes and failures are passed
//!   through untouched.
//!
//! Both operations are guarded by atomic flags, so repeated or racing calls
//! reach the host at most once.

use crate::error::Result;
use bridge_traits::{
    AuthorizationState, LocationEventSink, LocationService, LocationSettings, RawLocation,
    UpdateMode,
};
use core_runtime::events::LocationSample;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info, trace, warn};

/// Receiver of the adapter's normalized output.
pub trait SourceEventHandler: Send + Sync {
    /// The most recent sample of a host batch.
    fn on_location(&self, sample: LocationSample);

    fn on_authorization(&self, state: AuthorizationState);

    /// A human-readable failure reported by the host.
    fn on_failure(&self, message: &str);
}

pub struct LocationSourceAdapter {
    service: Arc<dyn LocationService>,
    settings: LocationSettings,
    handler: Arc<dyn SourceEventHandler>,
    self_ref: Weak<LocationSourceAdapter>,
    /// Settings were applied and the delegate registered.
    configured: AtomicBool,
    /// Update modes are running.
    updating: AtomicBool,
}

impl LocationSourceAdapter {
    pub fn new(
        service: Arc<dyn LocationService>,
        settings: LocationSettings,
        handler: Arc<dyn SourceEventHandler>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            service,
            settings,
            handler,
            self_ref: self_ref.clone(),
            configured: AtomicBool::new(false),
            updating: AtomicBool::new(false),
        })
    }

    pub fn settings(&self) -> &LocationSettings {
        &self.settings
    }

    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::SeqCst)
    }

    pub fn is_updating(&self) -> bool {
        self.updating.load(Ordering::SeqCst)
    }

    /// Configure the host session and start updates.
    ///
    /// Returns `Ok(false)` without touching the host when updates are already
    /// running. Settings are applied only on the first successful call; a
    /// restart after [`teardown`](Self::teardown) only restarts the modes.
    ///
    /// # Errors
    ///
    /// Returns the host error when settings cannot be applied or an update
    /// mode cannot be started. Modes started by this call are stopped again.
    pub fn configure(&self) -> Result<bool> {
        if self
            .updating
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("Location updates already running");
            return Ok(false);
        }

        if self
            .configured
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let delegate: Weak<dyn LocationEventSink> = self.self_ref.clone();
            if let Err(err) = self.service.apply_settings(&self.settings, delegate) {
                self.configured.store(false, Ordering::SeqCst);
                self.updating.store(false, Ordering::SeqCst);
                return Err(err.into());
            }
            debug!(
                accuracy = ?self.settings.accuracy,
                activity = ?self.settings.activity_type,
                background = self.settings.allows_background_updates,
                "Applied location session settings"
            );
        }

        let mut started = Vec::with_capacity(self.settings.update_modes.len());
        for &mode in &self.settings.update_modes {
            if let Err(err) = self.service.start_updates(mode) {
                for &running in &started {
                    if let Err(stop_err) = self.service.stop_updates(running) {
                        warn!(mode = ?running, error = %stop_err, "Failed to roll back update mode");
                    }
                }
                self.updating.store(false, Ordering::SeqCst);
                return Err(err.into());
            }
            started.push(mode);
        }

        info!(modes = ?started, "Background location capabilities set up");
        Ok(true)
    }

    /// Stop both update modes.
    ///
    /// Returns `Ok(false)` without touching the host when updates are not
    /// running. Every mode is asked to stop even if an earlier one fails; the
    /// first failure is returned.
    pub fn teardown(&self) -> Result<bool> {
        if self
            .updating
            .compare_exchange(true, false, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            trace!("Location updates not running");
            return Ok(false);
        }

        self.stop_modes()?;
        Ok(true)
    }

    /// Stop every update mode regardless of the `updating` flag.
    ///
    /// Used when a stop already cleared the flag while a concurrent
    /// [`configure`](Self::configure) was still starting modes.
    pub(crate) fn stop_modes(&self) -> Result<()> {
        self.updating.store(false, Ordering::SeqCst);

        let mut first_error = None;
        for mode in UpdateMode::ALL {
            if let Err(err) = self.service.stop_updates(mode) {
                warn!(mode = ?mode, error = %err, "Failed to stop update mode");
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => {
                info!("Background location updates stopped");
                Ok(())
            }
        }
    }
}

impl LocationEventSink for LocationSourceAdapter {
    fn on_samples(&self, batch: &[RawLocation]) {
        if !self.is_updating() {
            trace!(samples = batch.len(), "Ignoring batch delivered after teardown");
            return;
        }

        let Some(latest) = batch.last() else {
            return;
        };

        if batch.len() > 1 {
            trace!(discarded = batch.len() - 1, "Keeping most recent sample of batch");
        }
        self.handler.on_location(LocationSample::from_raw(latest));
    }

    fn on_authorization_changed(&self, state: AuthorizationState) {
        debug!(status = %state, "Authorization changed");
        self.handler.on_authorization(state);
    }

    fn on_failure(&self, message: &str) {
        warn!(message, "Location service failure");
        self.handler.on_failure(message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{error::Result as BridgeResult, BridgeError};
    use chrono::{TimeZone, Utc};
    use mockall::{mock, predicate::*};
    use std::sync::Mutex;

    mock! {
        Service {}

        impl LocationService for Service {
            fn apply_settings(
                &self,
                settings: &LocationSettings,
                delegate: Weak<dyn LocationEventSink>,
            ) -> BridgeResult<()>;
            fn start_updates(&self, mode: UpdateMode) -> BridgeResult<()>;
            fn stop_updates(&self, mode: UpdateMode) -> BridgeResult<()>;
            fn services_enabled(&self) -> bool;
            fn authorization_state(&self) -> AuthorizationState;
        }
    }

    #[derive(Default)]
    struct RecordingHandler {
        samples: Mutex<Vec<LocationSample>>,
        authorizations: Mutex<Vec<AuthorizationState>>,
        failures: Mutex<Vec<String>>,
    }

    impl SourceEventHandler for RecordingHandler {
        fn on_location(&self, sample: LocationSample) {
            self.samples.lock().unwrap().push(sample);
        }

        fn on_authorization(&self, state: AuthorizationState) {
            self.authorizations.lock().unwrap().push(state);
        }

        fn on_failure(&self, message: &str) {
            self.failures.lock().unwrap().push(message.to_string());
        }
    }

    fn raw(second: u32, speed: f64) -> RawLocation {
        RawLocation {
            latitude: 10.7769,
            longitude: 106.7009,
            horizontal_accuracy: 5.0,
            altitude: 9.0,
            speed,
            speed_accuracy: 0.5,
            timestamp: Utc.with_ymd_and_hms(2024, 3, 1, 6, 0, second).unwrap(),
        }
    }

    fn permissive_service() -> MockService {
        let mut service = MockService::new();
        service.expect_apply_settings().returning(|_, _| Ok(()));
        service.expect_start_updates().returning(|_| Ok(()));
        service.expect_stop_updates().returning(|_| Ok(()));
        service
    }

    fn adapter_with(service: MockService) -> (Arc<RecordingHandler>, Arc<LocationSourceAdapter>) {
        let handler = Arc::new(RecordingHandler::default());
        let adapter = LocationSourceAdapter::new(
            Arc::new(service),
            LocationSettings::default(),
            handler.clone(),
        );
        (handler, adapter)
    }

    #[test]
    fn test_configure_applies_settings_once() {
        let mut service = MockService::new();
        service
            .expect_apply_settings()
            .withf(|settings, _| *settings == LocationSettings::default())
            .times(1)
            .returning(|_, _| Ok(()));
        service
            .expect_start_updates()
            .with(eq(UpdateMode::Continuous))
            .times(1)
            .returning(|_| Ok(()));
        service
            .expect_start_updates()
            .with(eq(UpdateMode::SignificantChange))
            .times(1)
            .returning(|_| Ok(()));

        let (_, adapter) = adapter_with(service);

        assert!(adapter.configure().unwrap());
        assert!(!adapter.configure().unwrap());
        assert!(adapter.is_configured());
        assert!(adapter.is_updating());
    }

    #[test]
    fn test_teardown_when_never_started_skips_host() {
        let mut service = MockService::new();
        service.expect_stop_updates().never();

        let (_, adapter) = adapter_with(service);

        assert!(!adapter.teardown().unwrap());
        assert!(!adapter.teardown().unwrap());
    }

    #[test]
    fn test_teardown_stops_both_modes() {
        let mut service = MockService::new();
        service.expect_apply_settings().returning(|_, _| Ok(()));
        service.expect_start_updates().returning(|_| Ok(()));
        service
            .expect_stop_updates()
            .with(eq(UpdateMode::Continuous))
            .times(1)
            .returning(|_| Ok(()));
        service
            .expect_stop_updates()
            .with(eq(UpdateMode::SignificantChange))
            .times(1)
            .returning(|_| Ok(()));

        let (_, adapter) = adapter_with(service);
        adapter.configure().unwrap();

        assert!(adapter.teardown().unwrap());
        assert!(!adapter.is_updating());
    }

    #[test]
    fn test_restart_does_not_reapply_settings() {
        let mut service = MockService::new();
        service
            .expect_apply_settings()
            .times(1)
            .returning(|_, _| Ok(()));
        service.expect_start_updates().times(4).returning(|_| Ok(()));
        service.expect_stop_updates().times(2).returning(|_| Ok(()));

        let (_, adapter) = adapter_with(service);

        adapter.configure().unwrap();
        adapter.teardown().unwrap();
        assert!(adapter.configure().unwrap());
    }

    #[test]
    fn test_failed_settings_can_be_retried() {
        let mut service = MockService::new();
        let mut attempts = 0;
        service.expect_apply_settings().times(2).returning(move |_, _| {
            attempts += 1;
            if attempts == 1 {
                Err(BridgeError::NotAvailable("location services off".to_string()))
            } else {
                Ok(())
            }
        });
        service.expect_start_updates().times(2).returning(|_| Ok(()));

        let (_, adapter) = adapter_with(service);

        assert!(adapter.configure().is_err());
        assert!(!adapter.is_configured());
        assert!(!adapter.is_updating());
        assert!(adapter.configure().unwrap());
    }

    #[test]
    fn test_failed_mode_rolls_back_started_modes() {
        let mut service = MockService::new();
        service.expect_apply_settings().returning(|_, _| Ok(()));
        service
            .expect_start_updates()
            .with(eq(UpdateMode::Continuous))
            .returning(|_| Ok(()));
        service
            .expect_start_updates()
            .with(eq(UpdateMode::SignificantChange))
            .returning(|_| Err(BridgeError::OperationFailed("unsupported".to_string())));
        service
            .expect_stop_updates()
            .with(eq(UpdateMode::Continuous))
            .times(1)
            .returning(|_| Ok(()));

        let (_, adapter) = adapter_with(service);

        assert!(adapter.configure().is_err());
        assert!(!adapter.is_updating());
    }

    #[test]
    fn test_only_latest_sample_is_forwarded() {
        let (handler, adapter) = adapter_with(permissive_service());
        adapter.configure().unwrap();

        adapter.on_samples(&[raw(1, 1.0), raw(2, 2.0), raw(3, 3.0)]);

        let samples = handler.samples.lock().unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].speed_meters_per_second, 3.0);
        assert_eq!(
            samples[0].captured_at_epoch_millis,
            raw(3, 3.0).timestamp.timestamp_millis()
        );
    }

    #[test]
    fn test_empty_batch_produces_nothing() {
        let (handler, adapter) = adapter_with(permissive_service());
        adapter.configure().unwrap();

        adapter.on_samples(&[]);

        assert!(handler.samples.lock().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_speed_is_clamped() {
        let (handler, adapter) = adapter_with(permissive_service());
        adapter.configure().unwrap();

        let mut reading = raw(0, -1.0);
        reading.speed_accuracy = -1.0;
        adapter.on_samples(&[reading]);

        let samples = handler.samples.lock().unwrap();
        assert_eq!(samples[0].speed_meters_per_second, 0.0);
        assert_eq!(samples[0].speed_accuracy, 0.0);
    }

    #[test]
    fn test_samples_after_teardown_are_ignored() {
        let (handler, adapter) = adapter_with(permissive_service());
        adapter.configure().unwrap();
        adapter.teardown().unwrap();

        adapter.on_samples(&[raw(0, 1.0)]);

        assert!(handler.samples.lock().unwrap().is_empty());
    }

    #[test]
    fn test_authorization_and_failure_pass_through() {
        let (handler, adapter) = adapter_with(permissive_service());

        adapter.on_authorization_changed(AuthorizationState::Denied);
        adapter.on_failure("signal lost");

        assert_eq!(
            *handler.authorizations.lock().unwrap(),
            vec![AuthorizationState::Denied]
        );
        assert_eq!(*handler.failures.lock().unwrap(), vec!["signal lost".to_string()]);
    }

    #[test]
    fn test_host_holds_adapter_weakly() {
        let captured: Arc<Mutex<Option<Weak<dyn LocationEventSink>>>> = Arc::default();
        let slot = captured.clone();

        let mut service = MockService::new();
        service.expect_apply_settings().returning(move |_, delegate| {
            *slot.lock().unwrap() = Some(delegate);
            Ok(())
        });
        service.expect_start_updates().returning(|_| Ok(()));

        let (_, adapter) = adapter_with(service);
        adapter.configure().unwrap();

        let delegate = captured.lock().unwrap().clone().unwrap();
        assert!(delegate.upgrade().is_some());

        drop(adapter);
        assert!(delegate.upgrade().is_none());
    }
}
