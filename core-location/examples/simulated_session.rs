//! Drives a location bridge against the desktop simulator and prints every
//! outbound message.
//!
//! ```text
//! RUST_LOG=debug cargo run -p core-location --example simulated_session
//! ```

use anyhow::{Context, Result};
use bridge_desktop::{BroadcastMessageChannel, SimulatedLocationService, TokioBackgroundTaskProvider};
use bridge_traits::{AuthorizationState, MethodCall, RawLocation};
use chrono::Utc;
use core_location::LocationBridge;
use core_runtime::config::{BridgeConfig, DEFAULT_CHANNEL_NAME};
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> Result<()> {
    init_logging(LoggingConfig::default().with_format(LogFormat::Compact))
        .context("failed to initialise logging")?;

    let service = Arc::new(SimulatedLocationService::new());
    let channel = Arc::new(BroadcastMessageChannel::new(DEFAULT_CHANNEL_NAME));
    let mut outbound = channel.subscribe();

    let config = BridgeConfig::builder()
        .location_service(service.clone())
        .grant_provider(Arc::new(TokioBackgroundTaskProvider::with_budget(
            Duration::from_secs(2),
        )))
        .message_channel(channel)
        .build()
        .context("invalid bridge configuration")?;
    let bridge = LocationBridge::new(config)?;

    let printer = tokio::spawn(async move {
        while let Ok(message) = outbound.recv().await {
            println!("{} {}", message.method, message.arguments);
        }
    });

    bridge.launch();
    println!("fetch: {:?}", bridge.perform_background_fetch());

    let mut position = (21.0285, 105.8542);
    for step in 0..5 {
        position.0 += 0.0001;
        position.1 += 0.0002;
        let fix = RawLocation {
            latitude: position.0,
            longitude: position.1,
            horizontal_accuracy: 5.0,
            altitude: 12.0,
            speed: if step == 0 { -1.0 } else { 3.2 },
            speed_accuracy: 0.5,
            timestamp: Utc::now(),
        };
        service.deliver(&[fix]);
        tokio::time::sleep(Duration::from_millis(200)).await;
    }

    service.set_authorization(AuthorizationState::AuthorizedWhenInUse);
    service.fail("simulated signal loss");

    let response = bridge.handle_method_call(&MethodCall::new("stopBackgroundLocationUpdates"));
    println!("stop: {:?}, session: {}", response, bridge.session_state());

    drop(bridge);
    tokio::time::sleep(Duration::from_millis(100)).await;
    printer.abort();
    Ok(())
}
