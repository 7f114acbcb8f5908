//! Per-command handlers.
//!
//! A handler receives the correlation id and raw args of one command and returns
//! how its results will arrive. Argument validation happens here, not in the
//! dispatcher; malformed args fail the handler.

use bridge_protocol::{Args, Command, ConvertArgs, CorrelationId, ResultEnvelope, SignalArgs};
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};
use math_adapter::{MathAdapter, NodeMarkup, NodeStream, Notation};
use serde::de::DeserializeOwned;

use crate::config::BridgeConfig;
use crate::error::{BridgeError, BridgeResult};

/// How a handled command produces its result envelopes.
pub(crate) enum Completion {
    /// Exactly one envelope, emitted before dispatch returns.
    Now(ResultEnvelope),
    /// Envelopes emitted whenever the adapter yields, possibly never.
    Deferred(BoxStream<'static, ResultEnvelope>),
    /// No envelope at all.
    Silent,
}

pub(crate) type Handler<A> =
    fn(&A, &BridgeConfig, CorrelationId, &Args) -> BridgeResult<Completion>;

pub(crate) fn active<A: MathAdapter>(
    adapter: &A,
    _config: &BridgeConfig,
    id: CorrelationId,
    _args: &Args,
) -> BridgeResult<Completion> {
    Ok(Completion::Now(ResultEnvelope::active(id, adapter.is_present())))
}

pub(crate) fn all_jax<A: MathAdapter>(
    adapter: &A,
    _config: &BridgeConfig,
    id: CorrelationId,
    _args: &Args,
) -> BridgeResult<Completion> {
    Ok(forward_nodes(id, adapter.enumerate_math_nodes()))
}

pub(crate) fn ascii_math_to_mml<A: MathAdapter>(
    adapter: &A,
    config: &BridgeConfig,
    id: CorrelationId,
    args: &Args,
) -> BridgeResult<Completion> {
    convert(adapter, config, id, args, Command::AsciiMathToMml, Notation::AsciiMath)
}

pub(crate) fn tex_to_mml<A: MathAdapter>(
    adapter: &A,
    config: &BridgeConfig,
    id: CorrelationId,
    args: &Args,
) -> BridgeResult<Completion> {
    convert(adapter, config, id, args, Command::TexToMml, Notation::Tex)
}

pub(crate) fn inject_scripts<A: MathAdapter>(
    adapter: &A,
    _config: &BridgeConfig,
    _id: CorrelationId,
    _args: &Args,
) -> BridgeResult<Completion> {
    adapter.inject_config();
    adapter.inject_loader();
    Ok(Completion::Silent)
}

pub(crate) fn reg_sig<A: MathAdapter>(
    adapter: &A,
    _config: &BridgeConfig,
    id: CorrelationId,
    args: &Args,
) -> BridgeResult<Completion> {
    let SignalArgs { sig } = parse_args(Command::RegSig, args)?;
    Ok(forward_nodes(id, adapter.subscribe(&sig)))
}

fn convert<A: MathAdapter>(
    adapter: &A,
    config: &BridgeConfig,
    id: CorrelationId,
    args: &Args,
    command: Command,
    notation: Notation,
) -> BridgeResult<Completion> {
    let ConvertArgs {
        alt,
        id: element_id,
    } = parse_args(command, args)?;
    let markup = adapter.convert(notation, &alt, config.display_math);
    let result = markup.map(move |mathml| node_mml(&id, NodeMarkup { mathml, element_id }));
    Ok(Completion::Deferred(result.into_stream().boxed()))
}

fn forward_nodes(id: CorrelationId, nodes: NodeStream) -> Completion {
    Completion::Deferred(nodes.map(move |node| node_mml(&id, node)).boxed())
}

/// Shapes adapter output into a `NodeMml` envelope. Every markup-producing
/// command goes through here.
pub(crate) fn node_mml(id: &CorrelationId, node: NodeMarkup) -> ResultEnvelope {
    ResultEnvelope::node_mml(id.clone(), node.mathml, node.element_id)
}

fn parse_args<T: DeserializeOwned>(command: Command, args: &Args) -> BridgeResult<T> {
    serde_json::from_value(args.clone())
        .map_err(|source| BridgeError::InvalidArgs { command, source })
}
