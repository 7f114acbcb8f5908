//! End-to-end suite: a page hosting the bridge, an extension client, one bus.

pub mod harness;

#[cfg(test)]
mod session;

#[cfg(test)]
mod signals;

#[cfg(test)]
mod threaded;
