//! Inbound control commands.

use crate::error::LocationError;
use std::fmt;
use std::str::FromStr;

pub const START_METHOD: &str = "startBackgroundLocationUpdates";
pub const STOP_METHOD: &str = "stopBackgroundLocationUpdates";

/// A control command received from the application layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ControlCommand {
    StartBackgroundLocationUpdates,
    StopBackgroundLocationUpdates,
}

impl ControlCommand {
    pub fn method_name(&self) -> &'static str {
        match self {
            ControlCommand::StartBackgroundLocationUpdates => START_METHOD,
            ControlCommand::StopBackgroundLocationUpdates => STOP_METHOD,
        }
    }
}

impl FromStr for ControlCommand {
    type Err = LocationError;

    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            START_METHOD => Ok(ControlCommand::StartBackgroundLocationUpdates),
            STOP_METHOD => Ok(ControlCommand::StopBackgroundLocationUpdates),
            other => Err(LocationError::UnknownCommand(other.to_string())),
        }
    }
}

impl fmt::Display for ControlCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.method_name())
    }
}
