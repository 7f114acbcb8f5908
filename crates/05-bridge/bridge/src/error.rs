use bridge_protocol::{Command, ProtocolError};
use thiserror::Error;
use transport::TransportError;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("invalid args for {command}: {source}")]
    InvalidArgs {
        command: Command,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid bridge configuration: {0}")]
    Config(String),
}

impl BridgeError {
    pub fn config(msg: impl Into<String>) -> Self {
        BridgeError::Config(msg.into())
    }
}
