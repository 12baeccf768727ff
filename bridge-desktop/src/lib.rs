//! # Desktop Bridge Implementations
//!
//! Default implementations of bridge traits for desktop platforms
//! (macOS, Windows, Linux).
//!
//! ## Overview
//!
//! Desktop machines are never suspended and rarely carry a GNSS receiver, so
//! these implementations emulate the mobile contracts closely enough to run
//! the location bridge end to end:
//! - `LocationService` as [`SimulatedLocationService`], fed by the host
//! - `BackgroundTaskProvider` as [`TokioBackgroundTaskProvider`], with
//!   timer-driven expiry
//! - `MessageChannel` as [`BroadcastMessageChannel`] over
//!   `tokio::sync::broadcast`
//!
//! ## Usage
//!
//! ```ignore
//! use bridge_desktop::{BroadcastMessageChannel, SimulatedLocationService, TokioBackgroundTaskProvider};
//!
//! #[tokio::main]
//! async fn main() {
//!     let channel = BroadcastMessageChannel::new("com.duorun.location/background");
//!     let mut listener = channel.subscribe();
//!     let grants = TokioBackgroundTaskProvider::new();
//!     let location = SimulatedLocationService::new();
//!
//!     // Use in bridge configuration
//! }
//! ```

mod background;
mod channel;
mod location;

pub use background::{TokioBackgroundTaskProvider, DEFAULT_GRANT_BUDGET};
pub use channel::{
    BroadcastMessageChannel, Receiver, RecvError, TryRecvError, DEFAULT_CHANNEL_CAPACITY,
};
pub use location::SimulatedLocationService;
