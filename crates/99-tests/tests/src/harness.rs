use adapter_mock::MockMathAdapter;
use anyhow::{Context, Result};
use bridge::{Bridge, BridgeConfig};
use extension_client::ExtensionClient;
use transport::{EventLoop, PageContext};
use tracing_subscriber::{fmt, EnvFilter};

pub const PAGE_ORIGIN: &str = "https://page.test";
pub const EXTENSION_ORIGIN: &str = "chrome-extension://mathbridge";

const MAX_SETTLE_ROUNDS: usize = 64;

/// Installs a test subscriber once; `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,bridge=debug"));
    let _ = fmt().with_env_filter(env_filter).with_test_writer().try_init();
}

/// One page load with the bridge installed and an extension connected to it.
pub struct PageSession {
    pub page: PageContext,
    pub mock: MockMathAdapter,
    pub client: ExtensionClient,
    page_loop: EventLoop,
}

impl PageSession {
    pub fn open(mock: MockMathAdapter, config: BridgeConfig) -> Result<Self> {
        init_tracing();
        let page = PageContext::new(PAGE_ORIGIN);
        let listener = page.bus().listen(EXTENSION_ORIGIN);
        let sentinel = config.sentinel.clone();

        let bridge = Bridge::install(&page, mock.clone(), config).context("install bridge")?;
        let client = ExtensionClient::connect(&listener, &sentinel).context("connect client")?;

        let mut page_loop = EventLoop::new();
        page_loop.register(bridge);
        Ok(Self {
            page,
            mock,
            client,
            page_loop,
        })
    }

    /// Runs the page loop and the client alternately until neither has work.
    pub fn settle(&mut self) -> usize {
        let mut total = 0;
        for _ in 0..MAX_SETTLE_ROUNDS {
            let work = self.page_loop.run_tick() + self.client.pump();
            if work == 0 {
                break;
            }
            total += work;
        }
        total
    }
}
