//! # Location Bridge
//!
//! Top-level façade wiring the host collaborators from a [`BridgeConfig`]
//! into one running bridge.
//!
//! ## Overview
//!
//! ```text
//!   host location service ──> LocationSourceAdapter ──> ForwardingPipeline ──> MessageChannel
//!                                     ▲                        │
//!   MethodCall ──> LocationBridge ──> SessionController        └──> GrantManager
//! ```
//!
//! - Control commands arrive through [`LocationBridge::handle_method_call`]
//!   and are acknowledged immediately.
//! - Telemetry flows from the host callbacks straight to the channel.
//! - Background fetch opportunities go through
//!   [`LocationBridge::perform_background_fetch`].
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_traits::MethodCall;
//! use core_location::LocationBridge;
//! use core_runtime::config::BridgeConfig;
//!
//! let config = BridgeConfig::builder()
//!     .location_service(service)
//!     .grant_provider(grants)
//!     .message_channel(channel)
//!     .build()?;
//!
//! let bridge = LocationBridge::new(config)?;
//! bridge.launch();
//!
//! let response = bridge.handle_method_call(&MethodCall::new("stopBackgroundLocationUpdates"));
//! assert_eq!(response, MethodResponse::ack());
//! ```

use crate::adapter::{LocationSourceAdapter, SourceEventHandler};
use crate::command::ControlCommand;
use crate::error::Result;
use crate::filter::SampleFilter;
use crate::grant::GrantManager;
use crate::multiplexer::EventMultiplexer;
use crate::pipeline::ForwardingPipeline;
use crate::session::{SessionController, SessionState};
use bridge_traits::{
    AuthorizationState, FetchResult, LocationEventSink, LocationService, MethodCall,
    MethodResponse,
};
use core_runtime::config::BridgeConfig;
use core_runtime::events::BridgeEvent;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct LocationBridge {
    location_service: Arc<dyn LocationService>,
    pipeline: Arc<ForwardingPipeline>,
    grants: Arc<GrantManager>,
    session: SessionController,
    channel_name: String,
    start_on_launch: bool,
}

impl LocationBridge {
    /// Build a bridge from a validated configuration.
    ///
    /// Nothing is started; call [`launch`](Self::launch) or
    /// [`start`](Self::start).
    pub fn new(config: BridgeConfig) -> Result<Self> {
        config.validate()?;

        let grants = Arc::new(GrantManager::new(Arc::clone(&config.grant_provider)));
        let pipeline = Arc::new(ForwardingPipeline::new(
            SampleFilter::new(config.max_sample_age),
            EventMultiplexer::new(Arc::clone(&config.message_channel)),
            Arc::clone(&grants),
            Arc::clone(&config.clock),
        ));

        let handler: Arc<dyn SourceEventHandler> = pipeline.clone();
        let adapter = LocationSourceAdapter::new(
            Arc::clone(&config.location_service),
            config.location_settings.clone(),
            handler,
        );

        info!(
            channel = %config.channel_name,
            max_sample_age_ms = config.max_sample_age_millis(),
            "Location bridge created"
        );

        Ok(Self {
            location_service: config.location_service,
            pipeline,
            grants,
            session: SessionController::new(adapter),
            channel_name: config.channel_name,
            start_on_launch: config.start_on_launch,
        })
    }

    pub fn channel_name(&self) -> &str {
        &self.channel_name
    }

    /// Host application launch hook.
    ///
    /// Starts the session when `start_on_launch` is configured and returns
    /// whether this call started it.
    pub fn launch(&self) -> bool {
        if !self.start_on_launch {
            debug!("Start on launch disabled");
            return false;
        }
        self.start()
    }

    /// Dispatch an inbound control command.
    ///
    /// Known commands are always acknowledged with `true`, whatever the
    /// session did; anything else is answered with
    /// [`MethodResponse::NotImplemented`] and leaves the session untouched.
    #[instrument(skip(self, call), fields(method = %call.method))]
    pub fn handle_method_call(&self, call: &MethodCall) -> MethodResponse {
        match call.method.parse::<ControlCommand>() {
            Ok(command) => {
                self.execute(command);
                MethodResponse::ack()
            }
            Err(err) => {
                debug!(error = %err, "Rejecting control command");
                MethodResponse::NotImplemented
            }
        }
    }

    /// Run a parsed command; returns whether the session changed state.
    pub fn execute(&self, command: ControlCommand) -> bool {
        match command {
            ControlCommand::StartBackgroundLocationUpdates => self.start(),
            ControlCommand::StopBackgroundLocationUpdates => self.stop(),
        }
    }

    /// Start the session. Returns whether this call started it.
    ///
    /// A host failure is reported to the application as a `locationError`
    /// event and leaves the session stopped.
    pub fn start(&self) -> bool {
        match self.session.start() {
            Ok(started) => started,
            Err(err) => {
                self.report_failure(err.to_string());
                false
            }
        }
    }

    /// Stop the session. Returns whether this call stopped it.
    ///
    /// Does not cancel a background grant in flight.
    pub fn stop(&self) -> bool {
        match self.session.stop() {
            Ok(stopped) => stopped,
            Err(err) => {
                self.report_failure(err.to_string());
                true
            }
        }
    }

    fn report_failure(&self, message: String) {
        warn!(message = %message, "Reporting location session failure");
        self.pipeline.publish(BridgeEvent::Failure(message));
    }

    /// Opportunistic background fetch.
    ///
    /// A grant is acquired before checking whether location services are
    /// enabled. With services on the grant is kept until the next forwarded
    /// sample or the host expiry; otherwise it is returned immediately.
    #[instrument(skip(self))]
    pub fn perform_background_fetch(&self) -> FetchResult {
        let grant = match self.grants.acquire() {
            Ok(grant) => grant,
            Err(err) => {
                warn!(error = %err, "Background grant unavailable");
                return FetchResult::Failed;
            }
        };

        if self.location_service.services_enabled() {
            debug!(
                handle = %grant.handle(),
                remaining_secs = ?self.grants.remaining_time_secs(),
                "Location services enabled, holding grant"
            );
            FetchResult::NewData
        } else {
            self.grants.release(&grant);
            debug!("Location services disabled");
            FetchResult::NoData
        }
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    /// Current host authorization, read without emitting an event.
    pub fn authorization_state(&self) -> AuthorizationState {
        self.location_service.authorization_state()
    }

    pub fn grants(&self) -> &GrantManager {
        &self.grants
    }

    /// The delegate registered with the host location service.
    ///
    /// Host bindings that deliver callbacks themselves route them here.
    pub fn event_sink(&self) -> Arc<dyn LocationEventSink> {
        let adapter: Arc<LocationSourceAdapter> = Arc::clone(self.session.adapter());
        adapter
    }
}

impl fmt::Debug for LocationBridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocationBridge")
            .field("channel_name", &self.channel_name)
            .field("session", &self.session)
            .field("grants", &self.grants)
            .field("max_sample_age_ms", &self.pipeline.filter().max_age_millis())
            .finish()
    }
}
