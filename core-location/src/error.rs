use bridge_traits::BridgeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LocationError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Unknown control command: {0}")]
    UnknownCommand(String),
}

pub type Result<T> = std::result::Result<T, LocationError>;
