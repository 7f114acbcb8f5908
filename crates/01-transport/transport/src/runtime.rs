/// Unit of cooperative work driven by an [`EventLoop`].
///
/// `poll` must not block; it returns how much work it performed so the loop can
/// tell when the context has gone idle.
pub trait ServiceEngine: Send {
    fn poll(&mut self) -> usize;
    fn name(&self) -> &'static str;
}

/// Single-threaded host loop for one context. Each engine poll runs to completion
/// before the next one starts.
pub struct EventLoop {
    engines: Vec<Box<dyn ServiceEngine>>,
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLoop {
    pub fn new() -> Self {
        Self {
            engines: Vec::new(),
        }
    }

    pub fn register<E>(&mut self, engine: E)
    where
        E: ServiceEngine + 'static,
    {
        tracing::debug!(engine = engine.name(), "engine registered");
        self.engines.push(Box::new(engine));
    }

    pub fn run_tick(&mut self) -> usize {
        let mut work = 0;
        for engine in self.engines.iter_mut() {
            work += engine.poll();
        }
        work
    }

    /// Ticks until a tick performs no work or `max_ticks` is reached. Returns the
    /// total work performed.
    pub fn run_until_idle(&mut self, max_ticks: usize) -> usize {
        let mut total = 0;
        for _ in 0..max_ticks {
            let work = self.run_tick();
            if work == 0 {
                break;
            }
            total += work;
        }
        total
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
