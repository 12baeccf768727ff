//! Workspace facade crate.
//!
//! Exposes feature flags that map to the individual workspace crates
//! (`core-location`, `core-runtime`). Host applications can depend on
//! `location-bridge-workspace` and enable `desktop-shims` to get the bridge
//! wired to the in-process desktop implementations.

#[cfg(feature = "desktop-shims")]
pub use core_location::{
    ControlCommand, LocationBridge, LocationError, SessionState,
};

#[cfg(feature = "desktop-shims")]
pub use core_runtime::{
    config::{BridgeConfig, BridgeConfigBuilder},
    events::{BridgeEvent, LocationSample},
    logging::{init_logging, LogFormat, LoggingConfig},
};
