//! Transport primitives shared by the page and extension contexts.
//!
//! * [`Channel`] / [`Port`] – ordered, bidirectional, two-endpoint message channel.
//! * [`PageBus`] / [`HandoffMessage`] – page-global broadcast used to hand one port to
//!   the other context exactly once.
//! * [`PageContext`] – one page load: its origin, its bus, and its one-shot [`InitToken`].
//! * [`EventLoop`] / [`ServiceEngine`] – cooperative single-threaded host loop.
//! * [`TransportError`] – small error surface for disconnects and handoff misuse.

mod channel;
mod error;
mod handoff;
mod runtime;

pub use channel::{Channel, Port, PortMetricsSnapshot};
pub use error::{TransportError, TransportResult};
pub use handoff::{
    BusListener, HandoffMessage, InitToken, Origin, PageBus, PageContext, TargetOrigin,
};
pub use runtime::{EventLoop, ServiceEngine};

/// Structured-clone stand-in: every message crossing a [`Port`] is a JSON value.
pub type Message = serde_json::Value;
