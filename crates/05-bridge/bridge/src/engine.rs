use std::task::{Context, Poll};

use bridge_protocol::{Codec, JsonCodec, ResultEnvelope};
use futures::stream::{BoxStream, SelectAll};
use futures::task::noop_waker_ref;
use futures::StreamExt;
use math_adapter::MathAdapter;
use transport::{Channel, HandoffMessage, InitToken, Message, PageContext, Port, ServiceEngine};

use crate::config::BridgeConfig;
use crate::dispatch;
use crate::error::BridgeResult;
use crate::handlers::Completion;

/// Counters describing what the bridge has done so far.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BridgeMetrics {
    /// Commands routed to a handler.
    pub dispatched: u64,
    /// Messages ignored because they named no known command.
    pub dropped_unknown: u64,
    /// Handler or decode failures.
    pub faults: u64,
    /// Result envelopes posted to the peer.
    pub results_emitted: u64,
    /// Result envelopes the peer could not receive.
    pub send_failures: u64,
}

/// Page-side end of the bridge.
///
/// Owns the only inbound port, so it is the single consumer of every command the
/// extension sends. Deferred results are held as streams and emitted in the order
/// the adapter produces them; none of them ever times out or gets cancelled.
pub struct Bridge<A> {
    port: Port,
    adapter: A,
    codec: JsonCodec,
    config: BridgeConfig,
    in_flight: SelectAll<BoxStream<'static, ResultEnvelope>>,
    metrics: BridgeMetrics,
}

impl<A: MathAdapter> Bridge<A> {
    /// Establishes the page's channel: keeps one port, and broadcasts the other on
    /// the page bus tagged with the configured sentinel. Consumes the page's init
    /// token, so a page can only ever be initialized once.
    pub fn initialize(token: InitToken, adapter: A, config: BridgeConfig) -> Self {
        let (local, remote) = Channel::new();
        let handoff = HandoffMessage::new(config.sentinel.clone(), token.origin().clone(), remote);
        let delivered = token.bus().broadcast(handoff, &config.target_origin);
        tracing::info!(
            origin = %token.origin(),
            sentinel = %config.sentinel,
            target = ?config.target_origin,
            delivered,
            "bridge channel established"
        );
        Self::attach(local, adapter, config)
    }

    /// Mints the page's init token and initializes. Fails on a second call for
    /// the same page.
    pub fn install(page: &PageContext, adapter: A, config: BridgeConfig) -> BridgeResult<Self> {
        config.validate()?;
        let token = page.init_token()?;
        Ok(Self::initialize(token, adapter, config))
    }

    /// Serves commands arriving on an already established port.
    pub fn attach(port: Port, adapter: A, config: BridgeConfig) -> Self {
        Self {
            port,
            adapter,
            codec: JsonCodec,
            config,
            in_flight: SelectAll::new(),
            metrics: BridgeMetrics::default(),
        }
    }

    /// Decodes one inbound message and routes it to its handler.
    ///
    /// Messages that name no known command are dropped without a reply or a log
    /// line. Synchronous results are posted before this returns; deferred ones
    /// are emitted by [`Bridge::poll_completions`].
    pub fn dispatch(&mut self, raw: &Message) -> BridgeResult<()> {
        let result = self.try_dispatch(raw);
        if result.is_err() {
            self.metrics.faults += 1;
        }
        result
    }

    fn try_dispatch(&mut self, raw: &Message) -> BridgeResult<()> {
        let Some(envelope) = self.codec.decode_cmd(raw)? else {
            self.metrics.dropped_unknown += 1;
            return Ok(());
        };
        self.metrics.dispatched += 1;

        match dispatch::route(&self.adapter, &self.config, envelope)? {
            Completion::Now(rep) => self.publish(&rep)?,
            Completion::Deferred(results) => self.in_flight.push(results),
            Completion::Silent => {}
        }
        Ok(())
    }

    /// Emits results the adapter has produced since the last call, up to the
    /// completion budget.
    pub fn poll_completions(&mut self) -> usize {
        let mut cx = Context::from_waker(noop_waker_ref());
        let mut emitted = 0;
        while emitted < self.config.completion_budget {
            match self.in_flight.poll_next_unpin(&mut cx) {
                Poll::Ready(Some(rep)) => {
                    emitted += 1;
                    if let Err(err) = self.publish(&rep) {
                        tracing::error!(id = %rep.id, "failed to emit result: {err}");
                    }
                }
                Poll::Ready(None) | Poll::Pending => break,
            }
        }
        emitted
    }

    fn publish(&mut self, rep: &ResultEnvelope) -> BridgeResult<()> {
        let message = self.codec.encode_rep(rep)?;
        match self.port.post(message) {
            Ok(()) => {
                self.metrics.results_emitted += 1;
                Ok(())
            }
            Err(err) => {
                self.metrics.send_failures += 1;
                Err(err.into())
            }
        }
    }

    /// Number of requests and subscriptions that may still emit.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    pub fn metrics(&self) -> BridgeMetrics {
        self.metrics
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }
}

impl<A: MathAdapter + 'static> ServiceEngine for Bridge<A> {
    fn poll(&mut self) -> usize {
        let inbound = self.port.try_drain(self.config.command_budget);
        let mut work = inbound.len();
        for raw in inbound.iter() {
            if let Err(err) = self.dispatch(raw) {
                tracing::error!("command handler fault: {err}");
            }
        }
        work += self.poll_completions();
        work
    }

    fn name(&self) -> &'static str {
        "math-bridge"
    }
}
