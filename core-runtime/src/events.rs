//! # Bridge Events
//!
//! Typed events that cross the boundary between the location core and the
//! application layer.
//!
//! ## Overview
//!
//! Three independent streams (location fixes, authorization changes and
//! failures) are normalized into a single [`BridgeEvent`] envelope. Each
//! variant knows its channel method name and its wire payload, so the
//! multiplexer never inspects event contents.
//!
//! ```text
//! ┌────────────────┐
//! │ location fixes ├───────┐
//! └────────────────┘       │
//! ┌────────────────┐       ▼        ┌─────────────┐  invoke_method  ┌───────────┐
//! │ authorization  ├──> BridgeEvent ├─> Multiplexer├───────────────>│  channel  │
//! └────────────────┘       ▲        └─────────────┘                 └───────────┘
//! ┌────────────────┐       │
//! │ failures       ├───────┘
//! └────────────────┘
//! ```
//!
//! ## Wire format
//!
//! | Variant                | Method                | Payload |
//! |------------------------|-----------------------|---------|
//! | `LocationUpdate`       | `locationUpdate`      | `{latitude, longitude, accuracy, timestamp, altitude, speed, speedAccuracy}` |
//! | `AuthorizationChanged` | `authorizationStatus` | `{status}` |
//! | `Failure`              | `locationError`       | `{message}` |
//!
//! `timestamp` is milliseconds since the Unix epoch.
//!
//! ## Usage
//!
//! ```rust
//! use bridge_traits::location::AuthorizationState;
//! use core_runtime::events::BridgeEvent;
//!
//! let event = BridgeEvent::AuthorizationChanged(AuthorizationState::Denied);
//! assert_eq!(event.method_name(), "authorizationStatus");
//! assert_eq!(event.arguments()["status"], "denied");
//! ```

use bridge_traits::location::{AuthorizationState, RawLocation};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// Channel method carrying [`BridgeEvent::LocationUpdate`].
pub const LOCATION_UPDATE_METHOD: &str = "locationUpdate";
/// Channel method carrying [`BridgeEvent::Failure`].
pub const LOCATION_ERROR_METHOD: &str = "locationError";
/// Channel method carrying [`BridgeEvent::AuthorizationChanged`].
pub const AUTHORIZATION_STATUS_METHOD: &str = "authorizationStatus";

// ============================================================================
// Location Sample
// ============================================================================

/// A normalized location fix.
///
/// Produced once from a [`RawLocation`] and never mutated afterwards. Speed
/// and speed accuracy are `0.0` when the host reported them as invalid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationSample {
    pub latitude: f64,
    pub longitude: f64,
    pub horizontal_accuracy_meters: f64,
    pub altitude_meters: f64,
    pub speed_meters_per_second: f64,
    pub speed_accuracy: f64,
    pub captured_at_epoch_millis: i64,
}

impl LocationSample {
    /// Normalize a host reading.
    pub fn from_raw(raw: &RawLocation) -> Self {
        Self {
            latitude: raw.latitude,
            longitude: raw.longitude,
            horizontal_accuracy_meters: raw.horizontal_accuracy,
            altitude_meters: raw.altitude,
            speed_meters_per_second: clamp_unknown(raw.speed),
            speed_accuracy: clamp_unknown(raw.speed_accuracy),
            captured_at_epoch_millis: raw.timestamp.timestamp_millis(),
        }
    }
}

impl From<&RawLocation> for LocationSample {
    fn from(raw: &RawLocation) -> Self {
        Self::from_raw(raw)
    }
}

/// Negative (and NaN) readings mean "unknown" and are reported as zero.
fn clamp_unknown(value: f64) -> f64 {
    if value >= 0.0 {
        value
    } else {
        0.0
    }
}

// ============================================================================
// Bridge Event
// ============================================================================

/// The single unit crossing the outbound channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum BridgeEvent {
    /// A fresh location fix
    LocationUpdate(LocationSample),
    /// The host reported an authorization state
    AuthorizationChanged(AuthorizationState),
    /// The host could not determine a location
    Failure(String),
}

impl BridgeEvent {
    /// Channel method name for this event.
    pub fn method_name(&self) -> &'static str {
        match self {
            BridgeEvent::LocationUpdate(_) => LOCATION_UPDATE_METHOD,
            BridgeEvent::AuthorizationChanged(_) => AUTHORIZATION_STATUS_METHOD,
            BridgeEvent::Failure(_) => LOCATION_ERROR_METHOD,
        }
    }

    /// Flat key-value payload sent with [`method_name`](Self::method_name).
    pub fn arguments(&self) -> Value {
        match self {
            BridgeEvent::LocationUpdate(sample) => json!({
                "latitude": sample.latitude,
                "longitude": sample.longitude,
                "accuracy": sample.horizontal_accuracy_meters,
                "timestamp": sample.captured_at_epoch_millis,
                "altitude": sample.altitude_meters,
                "speed": sample.speed_meters_per_second,
                "speedAccuracy": sample.speed_accuracy,
            }),
            BridgeEvent::AuthorizationChanged(state) => json!({ "status": state.as_str() }),
            BridgeEvent::Failure(message) => json!({ "message": message }),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            BridgeEvent::LocationUpdate(_) => EventSeverity::Debug,
            BridgeEvent::AuthorizationChanged(AuthorizationState::Denied)
            | BridgeEvent::AuthorizationChanged(AuthorizationState::Restricted) => {
                EventSeverity::Warning
            }
            BridgeEvent::AuthorizationChanged(_) => EventSeverity::Info,
            BridgeEvent::Failure(_) => EventSeverity::Error,
        }
    }
}

impl fmt::Display for BridgeEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BridgeEvent::LocationUpdate(sample) => write!(
                f,
                "Location updated (captured at {})",
                sample.captured_at_epoch_millis
            ),
            BridgeEvent::AuthorizationChanged(state) => {
                write!(f, "Authorization status changed: {}", state)
            }
            BridgeEvent::Failure(message) => write!(f, "Location failure: {}", message),
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    /// Debug-level events (verbose)
    Debug,
    /// Informational events
    Info,
    /// Warning events
    Warning,
    /// Error events
    Error,
}
