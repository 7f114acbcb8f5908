use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use adapter_mock::{ConversionMode, MockMathAdapter};
use bridge::{Bridge, BridgeConfig};
use extension_client::ExtensionClient;
use futures::FutureExt;
use transport::{EventLoop, PageContext};

use crate::harness::{init_tracing, EXTENSION_ORIGIN, PAGE_ORIGIN};

const DEADLINE: Duration = Duration::from_secs(10);

fn spawn_page_loop(mut page_loop: EventLoop, stop: Arc<AtomicBool>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        while !stop.load(Ordering::Acquire) {
            if page_loop.run_tick() == 0 {
                thread::yield_now();
            }
        }
    })
}

#[test]
fn bridge_serves_requests_from_another_thread() {
    init_tracing();
    let page = PageContext::new(PAGE_ORIGIN);
    let listener = page.bus().listen(EXTENSION_ORIGIN);
    let mock = MockMathAdapter::new().with_mode(ConversionMode::Deferred);
    let bridge = Bridge::install(&page, mock.clone(), BridgeConfig::default()).expect("install");
    let mut client = ExtensionClient::connect(&listener, "math-bridge:port").expect("connect");

    let mut page_loop = EventLoop::new();
    page_loop.register(bridge);
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_page_loop(page_loop, Arc::clone(&stop));

    const REQUESTS: usize = 50;
    let mut replies: Vec<_> = (0..REQUESTS)
        .map(|n| {
            client
                .tex_to_mml(&format!("x_{n}"), &format!("e{n}"))
                .expect("send")
        })
        .collect();

    let started = Instant::now();
    let mut completed = 0;
    let mut resolved = vec![None; REQUESTS];
    while resolved.iter().any(Option::is_none) {
        assert!(started.elapsed() < DEADLINE, "timed out waiting for results");
        if completed < REQUESTS && mock.pending_conversions() > 0 {
            // Finish the newest parked conversion first.
            let last = mock.pending_conversions() - 1;
            if mock.complete(last, format!("<math>{completed}</math>")) {
                completed += 1;
            }
        }
        client.pump();
        for (slot, reply) in resolved.iter_mut().zip(replies.iter_mut()) {
            if slot.is_none() {
                if let Some(rep) = reply.now_or_never() {
                    *slot = Some(rep.expect("reply").into_node().expect("node").element_id);
                }
            }
        }
        thread::yield_now();
    }

    stop.store(true, Ordering::Release);
    handle.join().expect("page loop");

    let expected: Vec<_> = (0..REQUESTS).map(|n| Some(format!("e{n}"))).collect();
    assert_eq!(resolved, expected);
}
