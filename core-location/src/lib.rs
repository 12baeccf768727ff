//! # Core Location
//!
//! Background location bridge: observes the host location session, filters
//! and normalizes samples, forwards them with authorization changes and
//! failures over a single outbound channel, and manages the host's background
//! execution grant.
//!
//! ## Components
//!
//! - [`LocationSourceAdapter`] - owns the host session and receives its callbacks
//! - [`SampleFilter`] - freshness check on each sample
//! - [`EventMultiplexer`] - encodes [`BridgeEvent`]s onto the channel
//! - [`GrantManager`] - the single live background execution grant
//! - [`SessionController`] - idempotent start/stop state machine
//! - [`LocationBridge`] - façade wiring everything from a `BridgeConfig`
//!
//! [`BridgeEvent`]: core_runtime::events::BridgeEvent

pub mod adapter;
pub mod bridge;
pub mod command;
pub mod error;
pub mod filter;
pub mod grant;
pub mod multiplexer;
pub mod pipeline;
pub mod session;

pub use adapter::{LocationSourceAdapter, SourceEventHandler};
pub use bridge::LocationBridge;
pub use command::ControlCommand;
pub use error::{LocationError, Result};
pub use filter::SampleFilter;
pub use grant::{ExecutionGrant, GrantManager};
pub use multiplexer::EventMultiplexer;
pub use pipeline::ForwardingPipeline;
pub use session::{SessionController, SessionState};
