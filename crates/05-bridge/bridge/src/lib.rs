//! Page-side bridge: owns one end of the channel, dispatches commands to the math
//! adapter, and shapes every adapter result into a result envelope carrying the
//! request's correlation id.

mod config;
mod dispatch;
mod engine;
mod error;
mod handlers;

pub use config::{BridgeConfig, BridgeConfigBuilder};
pub use engine::{Bridge, BridgeMetrics};
pub use error::{BridgeError, BridgeResult};
