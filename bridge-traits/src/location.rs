//! Location Service Abstractions
//!
//! Contract between the core and the host's location stack (CoreLocation,
//! FusedLocationProvider, a simulator on desktop). The host owns the sensor
//! session; the core only configures it and receives callbacks through a
//! [`LocationEventSink`].

use std::fmt;
use std::sync::Weak;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Location authorization state as reported by the host.
///
/// The bridge never changes this value, it only observes and reports it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AuthorizationState {
    NotDetermined,
    Restricted,
    Denied,
    AuthorizedAlways,
    AuthorizedWhenInUse,
    #[serde(other)]
    Unknown,
}

impl AuthorizationState {
    /// Wire representation used by the `authorizationStatus` event.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorizationState::NotDetermined => "notDetermined",
            AuthorizationState::Restricted => "restricted",
            AuthorizationState::Denied => "denied",
            AuthorizationState::AuthorizedAlways => "authorizedAlways",
            AuthorizationState::AuthorizedWhenInUse => "authorizedWhenInUse",
            AuthorizationState::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AuthorizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single reading as delivered by the host, before normalization.
///
/// Speed and speed accuracy follow the CoreLocation convention: a negative
/// value means the reading is invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawLocation {
    pub latitude: f64,
    pub longitude: f64,
    /// Radius of uncertainty in meters
    pub horizontal_accuracy: f64,
    /// Meters above sea level
    pub altitude: f64,
    /// Meters per second, negative when invalid
    pub speed: f64,
    /// Meters per second, negative when invalid
    pub speed_accuracy: f64,
    /// When the fix was captured by the sensor stack
    pub timestamp: DateTime<Utc>,
}

/// Requested positional accuracy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccuracyMode {
    /// Highest available accuracy, with additional sensor fusion
    BestForNavigation,
    Best,
    NearestTenMeters,
    HundredMeters,
    Kilometer,
    Reduced,
}

/// Activity profile hint the host uses to tune power management.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActivityType {
    Other,
    AutomotiveNavigation,
    /// Continuous pedestrian motion (running, walking, cycling)
    Fitness,
    OtherNavigation,
    Airborne,
}

/// The two update modes a session runs side by side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Continuous high-cadence updates
    Continuous,
    /// Coarse low-power updates used as a backup channel
    SignificantChange,
}

impl UpdateMode {
    pub const ALL: [UpdateMode; 2] = [UpdateMode::Continuous, UpdateMode::SignificantChange];
}

/// Settings applied to the host location session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationSettings {
    pub accuracy: AccuracyMode,
    /// Keep delivering updates after the app is suspended
    pub allows_background_updates: bool,
    /// Let the host pause updates when it thinks the device is stationary
    pub pauses_updates_automatically: bool,
    pub activity_type: ActivityType,
    /// Show the system indicator while tracking in the background
    pub shows_background_indicator: bool,
    /// Update modes started together when the session starts
    pub update_modes: Vec<UpdateMode>,
}

impl Default for LocationSettings {
    fn default() -> Self {
        Self {
            accuracy: AccuracyMode::BestForNavigation,
            allows_background_updates: true,
            pauses_updates_automatically: false,
            activity_type: ActivityType::Fitness,
            shows_background_indicator: true,
            update_modes: UpdateMode::ALL.to_vec(),
        }
    }
}

/// Receiver of host location callbacks.
///
/// The host delivers samples in batches that may be coalesced; the batch is
/// ordered oldest first. Each callback body runs to completion.
pub trait LocationEventSink: Send + Sync {
    /// New readings are available.
    fn on_samples(&self, batch: &[RawLocation]);

    /// Authorization state changed (or was reported for the first time).
    fn on_authorization_changed(&self, state: AuthorizationState);

    /// The host could not determine a location.
    fn on_failure(&self, message: &str);
}

/// Host location service trait
///
/// Abstracts the platform's location stack:
/// - **iOS**: `CLLocationManager`
/// - **Android**: `FusedLocationProviderClient`
/// - **Desktop**: simulated provider driven by the host application
///
/// # Delegate lifetime
///
/// The service keeps only a [`Weak`] reference to the delegate, mirroring the
/// weak delegate convention of mobile SDKs. Callbacks to a dropped delegate are
/// discarded by the host.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::location::{LocationService, LocationSettings, UpdateMode};
///
/// fn begin(service: &dyn LocationService, delegate: Weak<dyn LocationEventSink>) -> Result<()> {
///     service.apply_settings(&LocationSettings::default(), delegate)?;
///     service.start_updates(UpdateMode::Continuous)?;
///     service.start_updates(UpdateMode::SignificantChange)
/// }
/// ```
pub trait LocationService: Send + Sync {
    /// Apply session settings and register the delegate.
    fn apply_settings(
        &self,
        settings: &LocationSettings,
        delegate: Weak<dyn LocationEventSink>,
    ) -> Result<()>;

    /// Begin delivering updates in the given mode.
    fn start_updates(&self, mode: UpdateMode) -> Result<()>;

    /// Stop delivering updates in the given mode. Stopping a mode that is not
    /// running is a no-op on every supported host.
    fn stop_updates(&self, mode: UpdateMode) -> Result<()>;

    /// Whether location services are enabled device-wide.
    fn services_enabled(&self) -> bool;

    /// Current authorization state.
    fn authorization_state(&self) -> AuthorizationState;
}
