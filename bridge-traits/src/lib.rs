//! # Host Bridge Traits
//!
//! Platform abstraction traits that must be implemented by each host platform.
//!
//! ## Overview
//!
//! This crate defines the contract between the location bridge core and the
//! platform-specific pieces it cannot own: the sensor stack, the background
//! execution budget and the message channel to the application layer. Each
//! trait represents a capability that the core requires but that must be
//! implemented differently per platform (desktop, iOS, Android).
//!
//! ## Traits
//!
//! ### Location
//! - [`LocationService`](location::LocationService) - Session settings and update modes
//! - [`LocationEventSink`](location::LocationEventSink) - Delegate receiving samples, authorization changes and failures
//!
//! ### Platform Integration
//! - [`BackgroundTaskProvider`](background::BackgroundTaskProvider) - Time-bounded execution grants with expiry callbacks
//! - [`MessageChannel`](channel::MessageChannel) - Fire-and-forget calls into the application layer
//!
//! ### Utilities
//! - [`Clock`](time::Clock) - Time source for deterministic testing
//! - [`LoggerSink`](time::LoggerSink) - Forward structured logs to host logging
//!
//! ## Platform Requirements
//!
//! | Platform | Implementation Crate | Status |
//! |----------|---------------------|--------|
//! | Desktop  | `bridge-desktop`    | ✅ Simulated |
//! | iOS      | TBD                 | 📋 Planned |
//! | Android  | TBD                 | 📋 Planned |
//!
//! ## Error Handling
//!
//! All bridge traits use the [`BridgeError`](error::BridgeError) type. Host
//! callbacks (`LocationEventSink`, expiration handlers) are infallible by
//! design: the host has nobody to report an error to.
//!
//! ## Thread Safety
//!
//! All bridge traits require `Send + Sync` so implementations can be shared
//! between the host's callback thread and the control channel.

pub mod background;
pub mod channel;
pub mod error;
pub mod location;
pub mod time;

pub use error::BridgeError;

// Re-export commonly used types
pub use background::{BackgroundTaskProvider, ExpirationHandler, FetchResult, GrantHandle};
pub use channel::{MessageChannel, MethodCall, MethodResponse, OutboundMessage};
pub use location::{
    AccuracyMode, ActivityType, AuthorizationState, LocationEventSink, LocationService,
    LocationSettings, RawLocation, UpdateMode,
};
pub use time::{Clock, LogEntry, LogLevel, LoggerSink, ManualClock, StderrLogger, SystemClock};
