use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use crossbeam_channel::{unbounded, Receiver, Sender};
use smallvec::SmallVec;

use crate::error::{TransportError, TransportResult};
use crate::Message;

/// Ordered, bidirectional, two-endpoint channel.
///
/// Each side owns exactly one [`Port`]. A port is not `Clone`: whoever holds it is
/// the single consumer of everything the peer posts.
pub struct Channel;

impl Channel {
    /// Creates a connected port pair. Messages posted on one port are received on
    /// the other in send order.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (Port, Port) {
        let (a_tx, b_rx) = unbounded();
        let (b_tx, a_rx) = unbounded();
        (Port::new(a_tx, a_rx), Port::new(b_tx, b_rx))
    }
}

/// One endpoint of a [`Channel`].
pub struct Port {
    tx: Sender<Message>,
    rx: Receiver<Message>,
    metrics: Arc<PortMetrics>,
}

impl Port {
    fn new(tx: Sender<Message>, rx: Receiver<Message>) -> Self {
        Self {
            tx,
            rx,
            metrics: Arc::new(PortMetrics::default()),
        }
    }

    /// Posts a message to the peer without blocking.
    pub fn post(&self, message: Message) -> TransportResult<()> {
        match self.tx.send(message) {
            Ok(()) => {
                self.metrics.posted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(_) => {
                self.metrics.send_failures.fetch_add(1, Ordering::Relaxed);
                Err(TransportError::Disconnected)
            }
        }
    }

    /// Delivers up to `max` pending messages to `f` in arrival order.
    pub fn drain<F>(&self, max: usize, mut f: F) -> usize
    where
        F: FnMut(Message),
    {
        let mut drained = 0;
        while drained < max {
            match self.rx.try_recv() {
                Ok(message) => {
                    drained += 1;
                    f(message);
                }
                Err(_) => break,
            }
        }
        if drained > 0 {
            self.metrics
                .delivered
                .fetch_add(drained as u32, Ordering::Relaxed);
        }
        drained
    }

    /// Collects up to `max` pending messages.
    pub fn try_drain(&self, max: usize) -> SmallVec<[Message; 8]> {
        let mut out = SmallVec::new();
        self.drain(max, |message| out.push(message));
        out
    }

    /// Number of messages waiting to be drained.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn metrics(&self) -> PortMetricsSnapshot {
        self.metrics.snapshot()
    }
}

impl std::fmt::Debug for Port {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Port")
            .field("pending", &self.rx.len())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

#[derive(Default)]
struct PortMetrics {
    posted: AtomicU32,
    delivered: AtomicU32,
    send_failures: AtomicU32,
}

impl PortMetrics {
    fn snapshot(&self) -> PortMetricsSnapshot {
        PortMetricsSnapshot {
            posted: self.posted.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PortMetricsSnapshot {
    pub posted: u32,
    pub delivered: u32,
    pub send_failures: u32,
}
