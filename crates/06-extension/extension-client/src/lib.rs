//! Extension-side end of the math bridge.
//!
//! [`ExtensionClient::connect`] claims the port the page handed off, then issues
//! commands and routes every result back to its request by correlation id.

mod client;
mod error;

pub use client::{ClientMetrics, ExtensionClient, Reply, Subscription};
pub use error::{ClientError, ClientResult};
