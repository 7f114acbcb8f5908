use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use bridge_protocol::{
    Codec, Command, CommandEnvelope, ConvertArgs, CorrelationId, JsonCodec, ProtocolError,
    ResultEnvelope, SignalArgs,
};
use futures::channel::{mpsc, oneshot};
use transport::{BusListener, Port, ServiceEngine, TransportError};

use crate::error::{ClientError, ClientResult};

const DEFAULT_REPLY_BUDGET: usize = 64;

/// Resolves with the single result of a request.
#[must_use = "a reply does nothing unless awaited"]
pub struct Reply {
    rx: oneshot::Receiver<ResultEnvelope>,
}

impl Future for Reply {
    type Output = ClientResult<ResultEnvelope>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|result| result.map_err(|_| ClientError::Closed))
    }
}

/// Every result delivered under one correlation id, for as long as it is held.
pub type Subscription = mpsc::UnboundedReceiver<ResultEnvelope>;

enum Route {
    Once(oneshot::Sender<ResultEnvelope>),
    Many(mpsc::UnboundedSender<ResultEnvelope>),
}

impl Route {
    /// Whether the receiving half is still held.
    fn is_live(&self) -> bool {
        match self {
            Route::Once(tx) => !tx.is_canceled(),
            Route::Many(tx) => !tx.is_closed(),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ClientMetrics {
    pub sent: u64,
    pub delivered: u64,
    /// Results whose correlation id had no pending route.
    pub unmatched: u64,
    pub malformed: u64,
}

/// Issues commands over the claimed port and resolves their results by id.
///
/// Results only move when [`ExtensionClient::pump`] runs, either directly or
/// through the client's [`ServiceEngine`] impl.
pub struct ExtensionClient {
    port: Port,
    codec: JsonCodec,
    pending: HashMap<CorrelationId, Route>,
    next_id: u64,
    reply_budget: usize,
    metrics: ClientMetrics,
}

impl ExtensionClient {
    /// Claims the first unclaimed handoff on `listener` tagged with `sentinel`.
    /// Handoffs carrying other sentinels, or already claimed by another listener,
    /// are skipped. Fails with `PortClaimed` when every matching handoff was taken.
    pub fn connect(listener: &BusListener, sentinel: &str) -> ClientResult<Self> {
        let mut taken = 0;
        while let Some(handoff) = listener.try_next() {
            if handoff.sentinel() != sentinel {
                tracing::debug!(seen = handoff.sentinel(), sentinel, "ignoring handoff");
                continue;
            }
            match handoff.claim() {
                Ok(port) => {
                    tracing::info!(source = %handoff.source(), sentinel, "claimed bridge port");
                    return Ok(Self::attach(port));
                }
                Err(TransportError::PortClaimed) => {
                    taken += 1;
                    tracing::debug!(source = %handoff.source(), "handoff already claimed");
                }
                Err(err) => return Err(err.into()),
            }
        }
        if taken > 0 {
            return Err(TransportError::PortClaimed.into());
        }
        Err(ClientError::NoHandoff {
            sentinel: sentinel.to_owned(),
        })
    }

    pub fn attach(port: Port) -> Self {
        Self {
            port,
            codec: JsonCodec,
            pending: HashMap::new(),
            next_id: 0,
            reply_budget: DEFAULT_REPLY_BUDGET,
            metrics: ClientMetrics::default(),
        }
    }

    /// Caps how many results one [`pump`](Self::pump) handles.
    pub fn with_reply_budget(mut self, budget: usize) -> Self {
        self.reply_budget = budget.max(1);
        self
    }

    pub fn next_correlation_id(&mut self) -> CorrelationId {
        self.next_id += 1;
        CorrelationId::new(format!("req-{}", self.next_id))
    }

    pub fn active(&mut self) -> ClientResult<Reply> {
        let id = self.next_correlation_id();
        self.request(CommandEnvelope::bare(Command::Active, id))
    }

    /// One `NodeMml` result per math node on the page.
    pub fn all_jax(&mut self) -> ClientResult<Subscription> {
        let id = self.next_correlation_id();
        self.subscribe(CommandEnvelope::bare(Command::AllJax, id))
    }

    pub fn tex_to_mml(&mut self, expression: &str, element_id: &str) -> ClientResult<Reply> {
        self.convert(Command::TexToMml, expression, element_id)
    }

    pub fn ascii_math_to_mml(&mut self, expression: &str, element_id: &str) -> ClientResult<Reply> {
        self.convert(Command::AsciiMathToMml, expression, element_id)
    }

    /// Fire and forget; the page never answers this command.
    pub fn inject_scripts(&mut self) -> ClientResult<()> {
        let id = self.next_correlation_id();
        self.submit(&CommandEnvelope::bare(Command::InjectScripts, id))
    }

    pub fn register_signal(&mut self, signal: &str) -> ClientResult<Subscription> {
        let id = self.next_correlation_id();
        let args = SignalArgs {
            sig: signal.to_owned(),
        };
        let envelope = CommandEnvelope::with_args(Command::RegSig, id, &args)
            .map_err(ProtocolError::from)?;
        self.subscribe(envelope)
    }

    fn convert(
        &mut self,
        command: Command,
        expression: &str,
        element_id: &str,
    ) -> ClientResult<Reply> {
        let id = self.next_correlation_id();
        let args = ConvertArgs {
            alt: expression.to_owned(),
            id: element_id.to_owned(),
        };
        let envelope =
            CommandEnvelope::with_args(command, id, &args).map_err(ProtocolError::from)?;
        self.request(envelope)
    }

    /// Sends `envelope` and waits for exactly one result under its id. Reusing
    /// the id of a pending request replaces that request's route.
    pub fn request(&mut self, envelope: CommandEnvelope) -> ClientResult<Reply> {
        self.submit(&envelope)?;
        let (tx, rx) = oneshot::channel();
        self.pending.insert(envelope.id, Route::Once(tx));
        Ok(Reply { rx })
    }

    /// Sends `envelope` and streams every result under its id.
    pub fn subscribe(&mut self, envelope: CommandEnvelope) -> ClientResult<Subscription> {
        self.submit(&envelope)?;
        let (tx, rx) = mpsc::unbounded();
        self.pending.insert(envelope.id, Route::Many(tx));
        Ok(rx)
    }

    /// Sends `envelope` without registering a route for its results.
    pub fn submit(&mut self, envelope: &CommandEnvelope) -> ClientResult<()> {
        let message = self.codec.encode_cmd(envelope)?;
        self.port.post(message)?;
        self.metrics.sent += 1;
        Ok(())
    }

    /// Routes results that have arrived since the last call. Returns how many
    /// messages were taken off the port.
    ///
    /// Routes whose [`Reply`] or [`Subscription`] was dropped are forgotten
    /// first, so finished `AllJax` streams do not pile up.
    pub fn pump(&mut self) -> usize {
        self.prune_abandoned();
        let inbound = self.port.try_drain(self.reply_budget);
        for raw in inbound.iter() {
            match self.codec.decode_rep(raw) {
                Ok(rep) => self.deliver(rep),
                Err(err) => {
                    self.metrics.malformed += 1;
                    tracing::warn!("dropping malformed result: {err}");
                }
            }
        }
        inbound.len()
    }

    fn prune_abandoned(&mut self) {
        let before = self.pending.len();
        self.pending.retain(|_, route| route.is_live());
        let pruned = before - self.pending.len();
        if pruned > 0 {
            tracing::debug!(pruned, "forgot abandoned routes");
        }
    }

    fn deliver(&mut self, rep: ResultEnvelope) {
        let Some(route) = self.pending.remove(&rep.id) else {
            self.metrics.unmatched += 1;
            tracing::debug!(id = %rep.id, tag = %rep.tag(), "result for unknown id");
            return;
        };
        match route {
            Route::Once(tx) => {
                if tx.send(rep).is_ok() {
                    self.metrics.delivered += 1;
                }
            }
            Route::Many(tx) => {
                let id = rep.id.clone();
                if tx.unbounded_send(rep).is_ok() {
                    self.metrics.delivered += 1;
                    self.pending.insert(id, Route::Many(tx));
                } else {
                    tracing::debug!(%id, "subscription dropped");
                }
            }
        }
    }

    /// Requests and subscriptions still waiting on results.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn metrics(&self) -> ClientMetrics {
        self.metrics
    }
}

impl ServiceEngine for ExtensionClient {
    fn poll(&mut self) -> usize {
        self.pump()
    }

    fn name(&self) -> &'static str {
        "extension-client"
    }
}
