//! # Bridge Configuration Module
//!
//! Provides configuration management for the location bridge.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `BridgeConfig` instance that holds every host capability and setting the
//! bridge needs. It enforces fail-fast validation so a missing bridge is
//! reported at construction time, not on the first location callback.
//!
//! ## Required Dependencies
//!
//! - `LocationService` - The host location stack
//! - `BackgroundTaskProvider` - Background execution grants
//! - `MessageChannel` - Outbound channel to the application layer
//!
//! ## Optional Dependencies (with defaults)
//!
//! - `Clock` - Time source for sample freshness (default: `SystemClock`)
//!
//! When the `desktop-shims` feature is enabled, desktop-ready defaults for all
//! three required capabilities are injected automatically if not provided.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::BridgeConfig;
//! use std::sync::Arc;
//!
//! let config = BridgeConfig::builder()
//!     .location_service(Arc::new(MyLocationService))
//!     .grant_provider(Arc::new(MyGrantProvider))
//!     .message_channel(Arc::new(MyChannel))
//!     .max_sample_age(Duration::from_secs(5))
//!     .build()
//!     .expect("Failed to build config");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{
    BackgroundTaskProvider, Clock, LocationService, LocationSettings, MessageChannel, SystemClock,
};
use std::sync::Arc;
use std::time::Duration;

/// Name of the method channel shared with the application layer.
pub const DEFAULT_CHANNEL_NAME: &str = "com.duorun.location/background";

/// Samples older (or newer) than this relative to "now" are dropped.
pub const DEFAULT_MAX_SAMPLE_AGE: Duration = Duration::from_millis(5_000);

/// Upper bound accepted for `max_sample_age`.
pub const MAX_SAMPLE_AGE_LIMIT: Duration = Duration::from_secs(600);

/// Bridge configuration.
///
/// This struct holds all dependencies and settings required to construct the
/// location bridge. Use [`BridgeConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct BridgeConfig {
    /// Host location stack (required)
    pub location_service: Arc<dyn LocationService>,

    /// Background execution grants (required)
    pub grant_provider: Arc<dyn BackgroundTaskProvider>,

    /// Outbound channel to the application layer (required)
    pub message_channel: Arc<dyn MessageChannel>,

    /// Time source used to judge sample freshness
    pub clock: Arc<dyn Clock>,

    /// Settings applied to the host location session
    pub location_settings: LocationSettings,

    /// Freshness window for forwarded samples
    pub max_sample_age: Duration,

    /// Start the session as part of host application launch
    pub start_on_launch: bool,

    /// Name of the method channel
    pub channel_name: String,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("location_service", &"LocationService { ... }")
            .field("grant_provider", &"BackgroundTaskProvider { ... }")
            .field("message_channel", &"MessageChannel { ... }")
            .field("clock", &"Clock { ... }")
            .field("location_settings", &self.location_settings)
            .field("max_sample_age", &self.max_sample_age)
            .field("start_on_launch", &self.start_on_launch)
            .field("channel_name", &self.channel_name)
            .finish()
    }
}

impl BridgeConfig {
    /// Creates a new builder for constructing a `BridgeConfig`.
    pub fn builder() -> BridgeConfigBuilder {
        BridgeConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - The freshness window is > 0 and at most ten minutes
    /// - The channel name is not empty
    /// - Background updates have at least one update mode to run
    pub fn validate(&self) -> Result<()> {
        if self.max_sample_age.is_zero() {
            return Err(Error::Config(
                "Maximum sample age must be greater than 0ms".to_string(),
            ));
        }

        if self.max_sample_age > MAX_SAMPLE_AGE_LIMIT {
            return Err(Error::Config(
                "Maximum sample age exceeds the limit of 10 minutes (600,000ms)".to_string(),
            ));
        }

        if self.channel_name.trim().is_empty() {
            return Err(Error::Config("Channel name cannot be empty".to_string()));
        }

        if self.location_settings.update_modes.is_empty() {
            return Err(Error::Config(
                "Location settings must request at least one update mode".to_string(),
            ));
        }

        Ok(())
    }

    /// Freshness window in whole milliseconds.
    pub fn max_sample_age_millis(&self) -> u64 {
        self.max_sample_age.as_millis().min(u64::MAX as u128) as u64
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn location_service_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "LocationService".to_string(),
        message: "LocationService implementation is required to observe device position. \
                 Desktop: enable the 'desktop-shims' feature to use SimulatedLocationService. \
                 Mobile: inject the platform location manager adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn grant_provider_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "BackgroundTaskProvider".to_string(),
        message: "BackgroundTaskProvider implementation is required to finish work after suspension. \
                 Desktop: enable the 'desktop-shims' feature to use TokioBackgroundTaskProvider. \
                 Mobile: inject the platform background task adapter."
            .to_string(),
    }
}

#[cfg(not(feature = "desktop-shims"))]
fn message_channel_missing_error() -> Error {
    Error::CapabilityMissing {
        capability: "MessageChannel".to_string(),
        message: "MessageChannel implementation is required to deliver events to the application layer. \
                 Desktop: enable the 'desktop-shims' feature to use BroadcastMessageChannel. \
                 Mobile: inject the platform method channel adapter."
            .to_string(),
    }
}

#[cfg(feature = "desktop-shims")]
fn provide_default_location_service() -> Result<Arc<dyn LocationService>> {
    use bridge_desktop::SimulatedLocationService;

    let service: Arc<dyn LocationService> = Arc::new(SimulatedLocationService::new());
    Ok(service)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_location_service() -> Result<Arc<dyn LocationService>> {
    Err(location_service_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_grant_provider() -> Result<Arc<dyn BackgroundTaskProvider>> {
    use bridge_desktop::TokioBackgroundTaskProvider;

    let provider: Arc<dyn BackgroundTaskProvider> = Arc::new(TokioBackgroundTaskProvider::new());
    Ok(provider)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_grant_provider() -> Result<Arc<dyn BackgroundTaskProvider>> {
    Err(grant_provider_missing_error())
}

#[cfg(feature = "desktop-shims")]
fn provide_default_message_channel(channel_name: &str) -> Result<Arc<dyn MessageChannel>> {
    use bridge_desktop::BroadcastMessageChannel;

    let channel: Arc<dyn MessageChannel> = Arc::new(BroadcastMessageChannel::new(channel_name));
    Ok(channel)
}

#[cfg(not(feature = "desktop-shims"))]
fn provide_default_message_channel(_channel_name: &str) -> Result<Arc<dyn MessageChannel>> {
    Err(message_channel_missing_error())
}

/// Builder for constructing [`BridgeConfig`] instances.
///
/// Use this builder to incrementally set configuration options and then call
/// [`build()`](BridgeConfigBuilder::build) to create the final config. The
/// builder validates required dependencies and provides helpful error
/// messages.
#[derive(Default)]
pub struct BridgeConfigBuilder {
    location_service: Option<Arc<dyn LocationService>>,
    grant_provider: Option<Arc<dyn BackgroundTaskProvider>>,
    message_channel: Option<Arc<dyn MessageChannel>>,
    clock: Option<Arc<dyn Clock>>,
    location_settings: Option<LocationSettings>,
    max_sample_age: Option<Duration>,
    start_on_launch: Option<bool>,
    channel_name: Option<String>,
}

impl BridgeConfigBuilder {
    /// Sets the host location service.
    pub fn location_service(mut self, service: Arc<dyn LocationService>) -> Self {
        self.location_service = Some(service);
        self
    }

    /// Sets the background grant provider.
    pub fn grant_provider(mut self, provider: Arc<dyn BackgroundTaskProvider>) -> Self {
        self.grant_provider = Some(provider);
        self
    }

    /// Sets the outbound message channel.
    pub fn message_channel(mut self, channel: Arc<dyn MessageChannel>) -> Self {
        self.message_channel = Some(channel);
        self
    }

    /// Sets the time source. Defaults to [`SystemClock`].
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Overrides the host session settings.
    pub fn location_settings(mut self, settings: LocationSettings) -> Self {
        self.location_settings = Some(settings);
        self
    }

    /// Sets the freshness window (default: 5 seconds).
    pub fn max_sample_age(mut self, age: Duration) -> Self {
        self.max_sample_age = Some(age);
        self
    }

    /// Whether the session starts during launch (default: `true`).
    pub fn start_on_launch(mut self, start: bool) -> Self {
        self.start_on_launch = Some(start);
        self
    }

    /// Sets the method channel name (default: [`DEFAULT_CHANNEL_NAME`]).
    pub fn channel_name(mut self, name: impl Into<String>) -> Self {
        self.channel_name = Some(name.into());
        self
    }

    /// Builds the configuration, filling optional values with defaults.
    ///
    /// # Errors
    ///
    /// - [`Error::CapabilityMissing`] when a required capability is absent and
    ///   no desktop default is available
    /// - [`Error::Config`] when validation fails
    pub fn build(self) -> Result<BridgeConfig> {
        let channel_name = self
            .channel_name
            .unwrap_or_else(|| DEFAULT_CHANNEL_NAME.to_string());

        let location_service = match self.location_service {
            Some(service) => service,
            None => provide_default_location_service()?,
        };

        let grant_provider = match self.grant_provider {
            Some(provider) => provider,
            None => provide_default_grant_provider()?,
        };

        let message_channel = match self.message_channel {
            Some(channel) => channel,
            None => provide_default_message_channel(&channel_name)?,
        };

        let config = BridgeConfig {
            location_service,
            grant_provider,
            message_channel,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
            location_settings: self.location_settings.unwrap_or_default(),
            max_sample_age: self.max_sample_age.unwrap_or(DEFAULT_MAX_SAMPLE_AGE),
            start_on_launch: self.start_on_launch.unwrap_or(true),
            channel_name,
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{
        error::Result as BridgeResult, AuthorizationState, ExpirationHandler, GrantHandle,
        LocationEventSink, ManualClock, UpdateMode,
    };
    use serde_json::Value;
    use std::sync::Weak;

    struct NoopLocationService;

    impl LocationService for NoopLocationService {
        fn apply_settings(
            &self,
            _settings: &LocationSettings,
            _delegate: Weak<dyn LocationEventSink>,
        ) -> BridgeResult<()> {
            Ok(())
        }

        fn start_updates(&self, _mode: UpdateMode) -> BridgeResult<()> {
            Ok(())
        }

        fn stop_updates(&self, _mode: UpdateMode) -> BridgeResult<()> {
            Ok(())
        }

        fn services_enabled(&self) -> bool {
            true
        }

        fn authorization_state(&self) -> AuthorizationState {
            AuthorizationState::AuthorizedAlways
        }
    }

    struct NoopGrantProvider;

    impl BackgroundTaskProvider for NoopGrantProvider {
        fn begin_background_task(&self, _on_expiration: ExpirationHandler) -> BridgeResult<GrantHandle> {
            Ok(GrantHandle::new(1))
        }

        fn end_background_task(&self, _handle: GrantHandle) {}
    }

    struct NoopChannel;

    impl MessageChannel for NoopChannel {
        fn invoke_method(&self, _method: &str, _arguments: Value) -> BridgeResult<()> {
            Ok(())
        }
    }

    fn complete_builder() -> BridgeConfigBuilder {
        BridgeConfig::builder()
            .location_service(Arc::new(NoopLocationService))
            .grant_provider(Arc::new(NoopGrantProvider))
            .message_channel(Arc::new(NoopChannel))
    }

    #[test]
    fn test_defaults() {
        let config = complete_builder().build().unwrap();

        assert_eq!(config.max_sample_age, DEFAULT_MAX_SAMPLE_AGE);
        assert_eq!(config.max_sample_age_millis(), 5_000);
        assert!(config.start_on_launch);
        assert_eq!(config.channel_name, DEFAULT_CHANNEL_NAME);
        assert_eq!(config.location_settings, LocationSettings::default());
    }

    #[test]
    fn test_overrides() {
        let clock = Arc::new(ManualClock::from_millis(42));
        let config = complete_builder()
            .clock(clock)
            .max_sample_age(Duration::from_secs(2))
            .start_on_launch(false)
            .channel_name("test/location")
            .build()
            .unwrap();

        assert_eq!(config.clock.unix_timestamp_millis(), 42);
        assert_eq!(config.max_sample_age_millis(), 2_000);
        assert!(!config.start_on_launch);
        assert_eq!(config.channel_name, "test/location");
    }

    #[test]
    fn test_zero_sample_age_rejected() {
        let result = complete_builder().max_sample_age(Duration::ZERO).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_excessive_sample_age_rejected() {
        let result = complete_builder()
            .max_sample_age(Duration::from_secs(601))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_channel_name_rejected() {
        let result = complete_builder().channel_name("  ").build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_settings_without_update_modes_rejected() {
        let settings = LocationSettings {
            update_modes: Vec::new(),
            ..Default::default()
        };
        let result = complete_builder().location_settings(settings).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_location_service() {
        let result = BridgeConfig::builder()
            .grant_provider(Arc::new(NoopGrantProvider))
            .message_channel(Arc::new(NoopChannel))
            .build();

        match result {
            Err(Error::CapabilityMissing { capability, .. }) => {
                assert_eq!(capability, "LocationService");
            }
            other => panic!("expected CapabilityMissing, got {:?}", other),
        }
    }

    #[cfg(not(feature = "desktop-shims"))]
    #[test]
    fn test_missing_channel() {
        let result = BridgeConfig::builder()
            .location_service(Arc::new(NoopLocationService))
            .grant_provider(Arc::new(NoopGrantProvider))
            .build();

        assert!(matches!(
            result,
            Err(Error::CapabilityMissing { ref capability, .. }) if capability == "MessageChannel"
        ));
    }

    #[cfg(feature = "desktop-shims")]
    #[test]
    fn test_desktop_defaults_fill_missing_capabilities() {
        let config = BridgeConfig::builder().build().unwrap();

        assert!(config.location_service.services_enabled());
    }
}
