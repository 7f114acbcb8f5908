use bridge_protocol::ProtocolError;
use thiserror::Error;
use transport::TransportError;

pub type ClientResult<T> = Result<T, ClientError>;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("no handoff tagged `{sentinel}` has been observed")]
    NoHandoff { sentinel: String },

    #[error("client dropped before the reply arrived")]
    Closed,

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
