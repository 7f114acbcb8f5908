//! Capability boundary between the bridge and the page's math library.
//!
//! The bridge never looks inside the library. It only calls the capabilities on
//! [`MathAdapter`] and forwards whatever they yield, whenever they yield it.
//! Single completions are futures; repeated completions are streams. Neither
//! carries a timeout and neither can be cancelled through the protocol.

use std::fmt;

use futures::future::BoxFuture;
use futures::stream::BoxStream;
use futures::{FutureExt, StreamExt};

/// Markup resolved by a single conversion.
pub type MarkupFuture = BoxFuture<'static, String>;
/// Markup for zero or more nodes, yielded over time.
pub type NodeStream = BoxStream<'static, NodeMarkup>;

/// Markup paired with the element id of the node it was produced for.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeMarkup {
    pub mathml: String,
    pub element_id: String,
}

impl NodeMarkup {
    pub fn new(mathml: impl Into<String>, element_id: impl Into<String>) -> Self {
        Self {
            mathml: mathml.into(),
            element_id: element_id.into(),
        }
    }
}

/// Input notations the library can convert from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Notation {
    Tex,
    AsciiMath,
}

impl fmt::Display for Notation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notation::Tex => f.write_str("TeX"),
            Notation::AsciiMath => f.write_str("AsciiMath"),
        }
    }
}

/// Asynchronous capability set offered by the page's math library.
pub trait MathAdapter: Send {
    /// Whether the library is loaded in the page. Answers synchronously.
    fn is_present(&self) -> bool;

    /// Markup for each math node the library knows about.
    fn enumerate_math_nodes(&self) -> NodeStream;

    /// Converts `expression` to markup. Resolves exactly once, or never if the
    /// library is unavailable.
    fn convert(&self, notation: Notation, expression: &str, display: bool) -> MarkupFuture;

    /// Markup for every future firing of `signal`, for the life of the page.
    fn subscribe(&self, signal: &str) -> NodeStream;

    /// Injects the library configuration into the page.
    fn inject_config(&self);

    /// Injects the library loader into the page.
    fn inject_loader(&self);
}

/// Adapter for a page where the library never loaded.
#[derive(Clone, Copy, Debug, Default)]
pub struct AbsentAdapter;

impl MathAdapter for AbsentAdapter {
    fn is_present(&self) -> bool {
        false
    }

    fn enumerate_math_nodes(&self) -> NodeStream {
        futures::stream::pending().boxed()
    }

    fn convert(&self, _notation: Notation, _expression: &str, _display: bool) -> MarkupFuture {
        futures::future::pending().boxed()
    }

    fn subscribe(&self, _signal: &str) -> NodeStream {
        futures::stream::pending().boxed()
    }

    fn inject_config(&self) {}

    fn inject_loader(&self) {}
}
