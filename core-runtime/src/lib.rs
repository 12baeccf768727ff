//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the location bridge:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Bridge event types and their wire encoding
//!
//! ## Overview
//!
//! This crate contains the runtime utilities the location core depends on. It
//! establishes the configuration contract with the host, the logging
//! conventions, and the event envelope that crosses the message channel.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use error::{Error, Result};
