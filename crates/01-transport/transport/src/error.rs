//! Error handling helpers for the transport crate.
//!
//! The transport layer keeps its error surface small: a peer that went away, and
//! misuse of the one-shot page initialization and handoff capabilities.

use thiserror::Error;

/// Convenience result alias for fallible transport operations.
pub type TransportResult<T, E = TransportError> = Result<T, E>;

/// Errors surfaced by channel and handoff helpers.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The peer endpoint was dropped; the message was not delivered.
    #[error("channel peer disconnected")]
    Disconnected,

    /// The page already minted its init token.
    #[error("page {origin} was already initialized")]
    AlreadyInitialized { origin: String },

    /// The handed-off port was taken by an earlier listener.
    #[error("handoff port already claimed")]
    PortClaimed,
}
