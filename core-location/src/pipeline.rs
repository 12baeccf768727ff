//! Forwarding pipeline.
//!
//! Connects the adapter's output to the outbound channel:
//!
//! ```text
//! LocationSourceAdapter ─> SampleFilter ─> EventMultiplexer ─> channel
//!                                                  │
//!                                                  └─> GrantManager::release_active
//! ```
//!
//! Authorization changes and failures skip the filter. Once the channel has
//! accepted a sample the live background grant, if any, is returned to the
//! host; a sample the channel drops leaves the grant live.

use crate::adapter::SourceEventHandler;
use crate::filter::SampleFilter;
use crate::grant::GrantManager;
use crate::multiplexer::EventMultiplexer;
use bridge_traits::{AuthorizationState, Clock};
use core_runtime::events::{BridgeEvent, LocationSample};
use core_runtime::logging::coarsen_coordinate;
use std::sync::Arc;
use tracing::{debug, trace};

pub struct ForwardingPipeline {
    filter: SampleFilter,
    multiplexer: EventMultiplexer,
    grants: Arc<GrantManager>,
    clock: Arc<dyn Clock>,
}

impl ForwardingPipeline {
    pub fn new(
        filter: SampleFilter,
        multiplexer: EventMultiplexer,
        grants: Arc<GrantManager>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            filter,
            multiplexer,
            grants,
            clock,
        }
    }

    pub fn filter(&self) -> &SampleFilter {
        &self.filter
    }

    /// Publish an event directly, bypassing the filter.
    pub fn publish(&self, event: BridgeEvent) -> bool {
        self.multiplexer.publish(event)
    }
}

impl SourceEventHandler for ForwardingPipeline {
    fn on_location(&self, sample: LocationSample) {
        let now = self.clock.unix_timestamp_millis();
        if !self.filter.accept(&sample, now) {
            trace!(
                age_ms = SampleFilter::age_millis(&sample, now),
                max_age_ms = self.filter.max_age_millis(),
                "Dropping stale sample"
            );
            return;
        }

        debug!(
            lat = %coarsen_coordinate(sample.latitude),
            lon = %coarsen_coordinate(sample.longitude),
            accuracy_m = sample.horizontal_accuracy_meters,
            "Forwarding location sample"
        );
        if !self.multiplexer.publish(BridgeEvent::LocationUpdate(sample)) {
            return;
        }

        if self.grants.release_active() {
            trace!("Background work completed after forwarded sample");
        }
    }

    fn on_authorization(&self, state: AuthorizationState) {
        self.multiplexer
            .publish(BridgeEvent::AuthorizationChanged(state));
    }

    fn on_failure(&self, message: &str) {
        self.multiplexer
            .publish(BridgeEvent::Failure(message.to_string()));
    }
}
