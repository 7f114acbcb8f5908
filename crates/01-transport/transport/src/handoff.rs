//! Page-global broadcast used to hand a channel endpoint across contexts.
//!
//! The page side posts one [`HandoffMessage`] carrying the remote [`Port`] on the
//! [`PageBus`]. Every listener admitted by the [`TargetOrigin`] observes the message,
//! but the port inside can be claimed exactly once. With [`TargetOrigin::Any`] any
//! script listening on the page can race the extension for the port; restricting the
//! target to an exact origin narrows who observes the handoff at all.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::channel::Port;
use crate::error::{TransportError, TransportResult};

/// Security origin of a script context, e.g. `https://example.org`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Origin(String);

impl Origin {
    pub fn new(origin: impl Into<String>) -> Self {
        Self(origin.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Origin {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Origin {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Which listeners a broadcast is addressed to. Serialized as `"*"` or the origin.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TargetOrigin {
    /// Any listener on the page, whatever its origin.
    #[default]
    Any,
    /// Only listeners running with exactly this origin.
    Exact(Origin),
}

impl TargetOrigin {
    pub fn admits(&self, origin: &Origin) -> bool {
        match self {
            TargetOrigin::Any => true,
            TargetOrigin::Exact(expected) => expected == origin,
        }
    }
}

impl From<String> for TargetOrigin {
    fn from(value: String) -> Self {
        if value == "*" {
            TargetOrigin::Any
        } else {
            TargetOrigin::Exact(Origin(value))
        }
    }
}

impl From<&str> for TargetOrigin {
    fn from(value: &str) -> Self {
        TargetOrigin::from(value.to_owned())
    }
}

impl From<TargetOrigin> for String {
    fn from(value: TargetOrigin) -> Self {
        match value {
            TargetOrigin::Any => "*".to_owned(),
            TargetOrigin::Exact(origin) => origin.0,
        }
    }
}

/// Sentinel-tagged broadcast carrying a transferable [`Port`].
///
/// Clones share the same port slot, so the port is handed to at most one claimer.
#[derive(Clone)]
pub struct HandoffMessage {
    sentinel: Arc<str>,
    source: Origin,
    port: Arc<Mutex<Option<Port>>>,
}

impl HandoffMessage {
    pub fn new(sentinel: impl Into<String>, source: Origin, port: Port) -> Self {
        Self {
            sentinel: Arc::from(sentinel.into()),
            source,
            port: Arc::new(Mutex::new(Some(port))),
        }
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    /// Origin of the page that posted the handoff.
    pub fn source(&self) -> &Origin {
        &self.source
    }

    /// Takes the transferred port. Only the first claim succeeds.
    pub fn claim(&self) -> TransportResult<Port> {
        self.port.lock().take().ok_or(TransportError::PortClaimed)
    }

    pub fn is_claimed(&self) -> bool {
        self.port.lock().is_none()
    }
}

impl fmt::Debug for HandoffMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandoffMessage")
            .field("sentinel", &self.sentinel)
            .field("source", &self.source)
            .field("claimed", &self.is_claimed())
            .finish()
    }
}

struct Listener {
    origin: Origin,
    tx: Sender<HandoffMessage>,
}

/// Page-global broadcast bus. Anything running in the page may listen.
#[derive(Default)]
pub struct PageBus {
    listeners: Mutex<Vec<Listener>>,
}

impl PageBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a listener running with `origin`.
    pub fn listen(&self, origin: impl Into<Origin>) -> BusListener {
        let origin = origin.into();
        let (tx, rx) = unbounded();
        self.listeners.lock().push(Listener {
            origin: origin.clone(),
            tx,
        });
        BusListener { origin, rx }
    }

    /// Delivers `message` to every listener admitted by `target`, in registration
    /// order. Listeners that were dropped are pruned. Returns the delivery count.
    pub fn broadcast(&self, message: HandoffMessage, target: &TargetOrigin) -> usize {
        let mut delivered = 0;
        self.listeners.lock().retain(|listener| {
            if !target.admits(&listener.origin) {
                return true;
            }
            match listener.tx.send(message.clone()) {
                Ok(()) => {
                    delivered += 1;
                    true
                }
                Err(_) => false,
            }
        });
        tracing::debug!(
            sentinel = message.sentinel(),
            target = ?target,
            delivered,
            "handoff broadcast"
        );
        delivered
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

/// Receiving side of a [`PageBus`] registration.
pub struct BusListener {
    origin: Origin,
    rx: Receiver<HandoffMessage>,
}

impl BusListener {
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn try_next(&self) -> Option<HandoffMessage> {
        self.rx.try_recv().ok()
    }
}

/// A single page load: its origin, its bus, and its one-shot init capability.
pub struct PageContext {
    origin: Origin,
    bus: Arc<PageBus>,
    initialized: AtomicBool,
}

impl PageContext {
    pub fn new(origin: impl Into<Origin>) -> Self {
        Self {
            origin: origin.into(),
            bus: Arc::new(PageBus::new()),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn bus(&self) -> &Arc<PageBus> {
        &self.bus
    }

    /// Mints the page's init token. Every call after the first fails.
    pub fn init_token(&self) -> TransportResult<InitToken> {
        if self.initialized.swap(true, Ordering::AcqRel) {
            return Err(TransportError::AlreadyInitialized {
                origin: self.origin.to_string(),
            });
        }
        Ok(InitToken {
            origin: self.origin.clone(),
            bus: Arc::clone(&self.bus),
        })
    }
}

/// One-shot capability to establish the page's bridge channel. Consumed by setup.
#[derive(Debug)]
pub struct InitToken {
    origin: Origin,
    bus: Arc<PageBus>,
}

impl InitToken {
    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn bus(&self) -> &PageBus {
        &self.bus
    }
}

impl fmt::Debug for PageBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PageBus")
            .field("listeners", &self.listener_count())
            .finish()
    }
}
