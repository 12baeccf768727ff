//! Cross-boundary Message Channel
//!
//! The named, ordered method channel between the core and the application
//! layer (Flutter `MethodChannel`, a JNI bridge, an in-process broadcast on
//! desktop). Outbound calls are fire-and-forget; inbound calls are answered
//! with an immediate [`MethodResponse`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// An inbound method invocation from the application layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: None,
        }
    }

    pub fn with_arguments(mut self, arguments: Value) -> Self {
        self.arguments = Some(arguments);
        self
    }
}

/// Immediate acknowledgement of an inbound [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum MethodResponse {
    /// The call was handled; carries the result value
    Success(Value),
    /// No handler exists for the method name
    NotImplemented,
}

impl MethodResponse {
    pub fn ack() -> Self {
        MethodResponse::Success(Value::Bool(true))
    }

    pub fn is_not_implemented(&self) -> bool {
        matches!(self, MethodResponse::NotImplemented)
    }
}

/// An outbound method invocation as it crosses the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub method: String,
    pub arguments: Value,
}

/// Outbound message channel trait
///
/// Delivery is ordered per calling thread and at-most-once. The core never
/// waits for an acknowledgement and never retries; an `Err` only tells the
/// caller the message was dropped.
///
/// # Example
///
/// ```ignore
/// use bridge_traits::channel::MessageChannel;
/// use serde_json::json;
///
/// fn report(channel: &dyn MessageChannel) {
///     let _ = channel.invoke_method("locationError", json!({ "message": "signal lost" }));
/// }
/// ```
pub trait MessageChannel: Send + Sync {
    /// Send a method call to the application layer without waiting for a reply.
    fn invoke_method(&self, method: &str, arguments: Value) -> Result<()>;
}
