//! Event multiplexer.
//!
//! Funnels location updates, authorization changes and failures into one
//! outbound channel. Each event is sent as soon as it is published: there is
//! no queue, no acknowledgement and no retry, so ordering is exactly the order
//! of `publish` calls on the calling thread.

use bridge_traits::MessageChannel;
use core_runtime::events::BridgeEvent;
use std::sync::Arc;
use tracing::{debug, trace};

pub struct EventMultiplexer {
    channel: Arc<dyn MessageChannel>,
}

impl EventMultiplexer {
    pub fn new(channel: Arc<dyn MessageChannel>) -> Self {
        Self { channel }
    }

    /// Serialize and dispatch `event`, fire-and-forget.
    ///
    /// Returns whether the channel accepted the message. A rejected message is
    /// dropped; callers are not expected to act on the result.
    pub fn publish(&self, event: BridgeEvent) -> bool {
        let method = event.method_name();

        match self.channel.invoke_method(method, event.arguments()) {
            Ok(()) => {
                trace!(method, severity = ?event.severity(), "Published bridge event");
                true
            }
            Err(err) => {
                debug!(method, error = %err, "Channel dropped bridge event");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::{error::Result as BridgeResult, AuthorizationState, BridgeError};
    use core_runtime::events::LocationSample;
    use mockall::{mock, predicate::*, Sequence};
    use serde_json::{json, Value};

    mock! {
        Channel {}

        impl MessageChannel for Channel {
            fn invoke_method(&self, method: &str, arguments: Value) -> BridgeResult<()>;
        }
    }

    fn sample() -> LocationSample {
        LocationSample {
            latitude: 10.7769,
            longitude: 106.7009,
            horizontal_accuracy_meters: 5.0,
            altitude_meters: 9.5,
            speed_meters_per_second: 2.75,
            speed_accuracy: 0.25,
            captured_at_epoch_millis: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_location_update_is_flat_map() {
        let mut channel = MockChannel::new();
        channel
            .expect_invoke_method()
            .with(
                eq("locationUpdate"),
                eq(json!({
                    "latitude": 10.7769,
                    "longitude": 106.7009,
                    "accuracy": 5.0,
                    "timestamp": 1_700_000_000_000_i64,
                    "altitude": 9.5,
                    "speed": 2.75,
                    "speedAccuracy": 0.25,
                })),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let multiplexer = EventMultiplexer::new(Arc::new(channel));
        assert!(multiplexer.publish(BridgeEvent::LocationUpdate(sample())));
    }

    #[test]
    fn test_single_key_payloads() {
        let mut channel = MockChannel::new();
        channel
            .expect_invoke_method()
            .with(eq("authorizationStatus"), eq(json!({ "status": "denied" })))
            .times(1)
            .returning(|_, _| Ok(()));
        channel
            .expect_invoke_method()
            .with(eq("locationError"), eq(json!({ "message": "signal lost" })))
            .times(1)
            .returning(|_, _| Ok(()));

        let multiplexer = EventMultiplexer::new(Arc::new(channel));
        multiplexer.publish(BridgeEvent::AuthorizationChanged(AuthorizationState::Denied));
        multiplexer.publish(BridgeEvent::Failure("signal lost".to_string()));
    }

    #[test]
    fn test_publish_order_is_preserved() {
        let mut seq = Sequence::new();
        let mut channel = MockChannel::new();
        for method in ["authorizationStatus", "locationUpdate", "locationError"] {
            channel
                .expect_invoke_method()
                .with(eq(method), always())
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let multiplexer = EventMultiplexer::new(Arc::new(channel));
        multiplexer.publish(BridgeEvent::AuthorizationChanged(AuthorizationState::AuthorizedAlways));
        multiplexer.publish(BridgeEvent::LocationUpdate(sample()));
        multiplexer.publish(BridgeEvent::Failure("timeout".to_string()));
    }

    #[test]
    fn test_dropped_message_is_not_retried() {
        let mut channel = MockChannel::new();
        channel
            .expect_invoke_method()
            .times(1)
            .returning(|_, _| Err(BridgeError::ChannelClosed("test".to_string())));

        let multiplexer = EventMultiplexer::new(Arc::new(channel));
        assert!(!multiplexer.publish(BridgeEvent::Failure("lost".to_string())));
    }
}
