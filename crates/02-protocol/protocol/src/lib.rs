//! Wire protocol spoken between the extension-side client and the page-side bridge.
//!
//! Both directions use the same JSON shape, `{cmd, id, args}`. Commands form a
//! closed set ([`Command`]); results are tagged with a [`ResultTag`] that need not
//! match the originating command.

mod codec;
mod envelope;
mod error;
pub mod schema;

pub use codec::{Codec, JsonCodec};
pub use envelope::{
    Args, CommandEnvelope, ConvertArgs, NodeMml, ResultEnvelope, ResultPayload, SignalArgs,
};
pub use error::{ProtocolError, ProtocolResult};
pub use schema::{Command, CorrelationId, ResultTag, DEFAULT_SENTINEL};
