//! In-process Message Channel
//!
//! Delivers outbound method calls to any number of in-process listeners over
//! `tokio::sync::broadcast`, which keeps per-sender ordering.

use bridge_traits::{
    channel::{MessageChannel, OutboundMessage},
    error::{BridgeError, Result},
};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::trace;

pub use tokio::sync::broadcast::error::{RecvError, TryRecvError};
pub use tokio::sync::broadcast::Receiver;

/// Default number of undelivered messages kept per listener.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 256;

/// Broadcast-backed [`MessageChannel`].
///
/// Messages sent while no listener is subscribed are dropped and reported as
/// [`BridgeError::ChannelClosed`]. Listeners that fall behind by more than the
/// capacity observe `RecvError::Lagged`.
#[derive(Debug, Clone)]
pub struct BroadcastMessageChannel {
    name: String,
    sender: broadcast::Sender<OutboundMessage>,
}

impl BroadcastMessageChannel {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_capacity(name, DEFAULT_CHANNEL_CAPACITY)
    }

    pub fn with_capacity(name: impl Into<String>, capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            name: name.into(),
            sender,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Subscribe to all future outbound messages.
    pub fn subscribe(&self) -> Receiver<OutboundMessage> {
        self.sender.subscribe()
    }

    pub fn listener_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl MessageChannel for BroadcastMessageChannel {
    fn invoke_method(&self, method: &str, arguments: Value) -> Result<()> {
        let message = OutboundMessage {
            method: method.to_string(),
            arguments,
        };

        match self.sender.send(message) {
            Ok(listeners) => {
                trace!(channel = %self.name, method, listeners, "Delivered outbound message");
                Ok(())
            }
            Err(_) => Err(BridgeError::ChannelClosed(format!(
                "no listener on channel '{}'",
                self.name
            ))),
        }
    }
}
