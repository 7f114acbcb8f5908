//! Scriptable math adapter for tests and demos.
//!
//! Every capability call is recorded. Conversions either resolve immediately or
//! park until the test completes them, and signal subscriptions fire only when
//! the test calls [`MockMathAdapter::fire`].

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use futures::channel::{mpsc, oneshot};
use futures::{FutureExt, StreamExt};
use math_adapter::{MarkupFuture, MathAdapter, NodeMarkup, NodeStream, Notation};
use parking_lot::Mutex;

/// Capability invocation observed by the mock.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AdapterCall {
    IsPresent,
    EnumerateMathNodes,
    Convert {
        notation: Notation,
        expression: String,
        display: bool,
    },
    Subscribe {
        signal: String,
    },
    InjectConfig,
    InjectLoader,
}

/// How conversions complete.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConversionMode {
    /// Resolve with [`render`] as soon as polled.
    Immediate,
    /// Park until [`MockMathAdapter::complete`] or [`MockMathAdapter::complete_next`].
    Deferred,
}

struct PendingConversion {
    notation: Notation,
    expression: String,
    tx: oneshot::Sender<String>,
}

struct MockState {
    present: bool,
    nodes: Vec<NodeMarkup>,
    mode: ConversionMode,
    deferred: VecDeque<PendingConversion>,
    subscribers: HashMap<String, Vec<mpsc::UnboundedSender<NodeMarkup>>>,
    calls: Vec<AdapterCall>,
}

/// Shared-state mock; clones observe and drive the same adapter.
#[derive(Clone)]
pub struct MockMathAdapter {
    state: Arc<Mutex<MockState>>,
}

impl Default for MockMathAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockMathAdapter {
    /// A present library with no nodes and immediate conversions.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                present: true,
                nodes: Vec::new(),
                mode: ConversionMode::Immediate,
                deferred: VecDeque::new(),
                subscribers: HashMap::new(),
                calls: Vec::new(),
            })),
        }
    }

    /// A library that never loaded: reports absent and never converts.
    pub fn absent() -> Self {
        let mock = Self::new();
        mock.set_present(false);
        mock.state.lock().mode = ConversionMode::Deferred;
        mock
    }

    pub fn with_nodes(self, nodes: impl IntoIterator<Item = NodeMarkup>) -> Self {
        self.state.lock().nodes = nodes.into_iter().collect();
        self
    }

    pub fn with_mode(self, mode: ConversionMode) -> Self {
        self.state.lock().mode = mode;
        self
    }

    pub fn set_present(&self, present: bool) {
        self.state.lock().present = present;
    }

    pub fn calls(&self) -> Vec<AdapterCall> {
        self.state.lock().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    pub fn pending_conversions(&self) -> usize {
        self.state.lock().deferred.len()
    }

    /// Resolves the oldest parked conversion. Returns its notation and expression.
    pub fn complete_next(&self, markup: impl Into<String>) -> Option<(Notation, String)> {
        let pending = self.state.lock().deferred.pop_front()?;
        let _ = pending.tx.send(markup.into());
        Some((pending.notation, pending.expression))
    }

    /// Resolves the parked conversion at `index`, counting from the oldest.
    pub fn complete(&self, index: usize, markup: impl Into<String>) -> bool {
        let Some(pending) = self.state.lock().deferred.remove(index) else {
            return false;
        };
        let _ = pending.tx.send(markup.into());
        true
    }

    /// Fires `signal` once, delivering `node` to every live subscription.
    pub fn fire(&self, signal: &str, node: NodeMarkup) -> usize {
        let mut state = self.state.lock();
        let Some(subscribers) = state.subscribers.get_mut(signal) else {
            return 0;
        };
        subscribers.retain(|tx| tx.unbounded_send(node.clone()).is_ok());
        subscribers.len()
    }

    pub fn subscriber_count(&self, signal: &str) -> usize {
        self.state
            .lock()
            .subscribers
            .get(signal)
            .map_or(0, Vec::len)
    }

    fn record(&self, call: AdapterCall) {
        self.state.lock().calls.push(call);
    }
}

impl MathAdapter for MockMathAdapter {
    fn is_present(&self) -> bool {
        self.record(AdapterCall::IsPresent);
        self.state.lock().present
    }

    fn enumerate_math_nodes(&self) -> NodeStream {
        self.record(AdapterCall::EnumerateMathNodes);
        let nodes = self.state.lock().nodes.clone();
        futures::stream::iter(nodes).boxed()
    }

    fn convert(&self, notation: Notation, expression: &str, display: bool) -> MarkupFuture {
        self.record(AdapterCall::Convert {
            notation,
            expression: expression.to_owned(),
            display,
        });

        let mut state = self.state.lock();
        match state.mode {
            ConversionMode::Immediate => {
                futures::future::ready(render(notation, expression)).boxed()
            }
            ConversionMode::Deferred => {
                let (tx, rx) = oneshot::channel();
                state.deferred.push_back(PendingConversion {
                    notation,
                    expression: expression.to_owned(),
                    tx,
                });
                async move {
                    match rx.await {
                        Ok(markup) => markup,
                        Err(_) => futures::future::pending().await,
                    }
                }
                .boxed()
            }
        }
    }

    fn subscribe(&self, signal: &str) -> NodeStream {
        self.record(AdapterCall::Subscribe {
            signal: signal.to_owned(),
        });
        let (tx, rx) = mpsc::unbounded();
        self.state
            .lock()
            .subscribers
            .entry(signal.to_owned())
            .or_default()
            .push(tx);
        rx.boxed()
    }

    fn inject_config(&self) {
        self.record(AdapterCall::InjectConfig);
    }

    fn inject_loader(&self) {
        self.record(AdapterCall::InjectLoader);
    }
}

/// Markup produced by immediate conversions.
pub fn render(notation: Notation, expression: &str) -> String {
    format!("<math data-notation=\"{notation}\"><mtext>{expression}</mtext></math>")
}
