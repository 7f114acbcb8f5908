use adapter_mock::{render, AdapterCall, ConversionMode, MockMathAdapter};
use bridge::{Bridge, BridgeConfig, BridgeError};
use extension_client::{ClientError, ExtensionClient};
use futures::{FutureExt, StreamExt};
use math_adapter::{NodeMarkup, Notation};
use transport::{TargetOrigin, TransportError};

use crate::harness::{PageSession, EXTENSION_ORIGIN, PAGE_ORIGIN};

fn open(mock: MockMathAdapter) -> PageSession {
    PageSession::open(mock, BridgeConfig::default()).expect("session")
}

#[test]
fn active_reports_library_presence() {
    let mut session = open(MockMathAdapter::new());
    let reply = session.client.active().expect("send");
    session.settle();
    let rep = reply.now_or_never().expect("ready").expect("reply");
    assert_eq!(rep.status(), Some(true));

    let mut session = open(MockMathAdapter::absent());
    let reply = session.client.active().expect("send");
    session.settle();
    let rep = reply.now_or_never().expect("ready").expect("reply");
    assert_eq!(rep.status(), Some(false));
}

#[test]
fn tex_conversion_round_trip() {
    let mut session = open(MockMathAdapter::new());
    let reply = session.client.tex_to_mml("x^2", "elemA").expect("send");
    session.settle();

    let node = reply
        .now_or_never()
        .expect("ready")
        .expect("reply")
        .into_node()
        .expect("node result");
    assert_eq!(node.element_id, "elemA");
    assert_eq!(node.mathml, render(Notation::Tex, "x^2"));
    assert_eq!(session.client.pending(), 0);
}

#[test]
fn slow_conversions_resolve_in_completion_order() {
    let mut session = open(MockMathAdapter::new().with_mode(ConversionMode::Deferred));
    let mut tex = session.client.tex_to_mml("a", "e1").expect("send");
    let mut ascii = session.client.ascii_math_to_mml("b", "e2").expect("send");
    session.settle();
    assert!((&mut tex).now_or_never().is_none());
    assert!((&mut ascii).now_or_never().is_none());

    assert!(session.mock.complete(1, "<math>b</math>"));
    session.settle();
    assert!((&mut tex).now_or_never().is_none());
    let rep = ascii.now_or_never().expect("ready").expect("reply");
    assert_eq!(rep.node().expect("node").element_id, "e2");

    session.mock.complete_next("<math>a</math>");
    session.settle();
    let rep = tex.now_or_never().expect("ready").expect("reply");
    assert_eq!(rep.node().expect("node").mathml, "<math>a</math>");
}

#[test]
fn absent_library_never_answers_conversions() {
    let mut session = open(MockMathAdapter::absent());
    let mut reply = session.client.tex_to_mml("x", "e").expect("send");
    for _ in 0..8 {
        session.settle();
    }
    assert!((&mut reply).now_or_never().is_none());
    assert_eq!(session.client.pending(), 1);
}

#[test]
fn all_jax_streams_every_node() {
    let mock = MockMathAdapter::new().with_nodes([
        NodeMarkup::new("<math>1</math>", "MathJax-Element-1"),
        NodeMarkup::new("<math>2</math>", "MathJax-Element-2"),
    ]);
    let mut session = open(mock);
    let mut nodes = session.client.all_jax().expect("send");
    session.settle();

    let mut element_ids = Vec::new();
    while let Some(Some(rep)) = nodes.next().now_or_never() {
        element_ids.push(rep.into_node().expect("node").element_id);
    }
    element_ids.sort();
    assert_eq!(element_ids, vec!["MathJax-Element-1", "MathJax-Element-2"]);
}

#[test]
fn inject_scripts_is_fire_and_forget() {
    let mut session = open(MockMathAdapter::new());
    session.client.inject_scripts().expect("send");
    session.settle();

    assert_eq!(
        session.mock.calls(),
        vec![AdapterCall::InjectConfig, AdapterCall::InjectLoader]
    );
    assert_eq!(session.client.pending(), 0);
    assert_eq!(session.client.metrics().delivered, 0);
}

#[test]
fn page_initializes_at_most_once() {
    let session = open(MockMathAdapter::new());
    let err = Bridge::install(&session.page, MockMathAdapter::new(), BridgeConfig::default())
        .err()
        .expect("second install rejected");
    assert!(matches!(
        err,
        BridgeError::Transport(TransportError::AlreadyInitialized { .. })
    ));
}

#[test]
fn page_script_can_steal_an_unrestricted_handoff() {
    let page = transport::PageContext::new(PAGE_ORIGIN);
    let page_script = page.bus().listen(PAGE_ORIGIN);
    let extension = page.bus().listen(EXTENSION_ORIGIN);
    let config = BridgeConfig::default();
    assert_eq!(config.target_origin, TargetOrigin::Any);
    let _bridge = Bridge::install(&page, MockMathAdapter::new(), config).expect("install");

    let stolen = ExtensionClient::connect(&page_script, "math-bridge:port").expect("steal");
    drop(stolen);
    assert!(matches!(
        ExtensionClient::connect(&extension, "math-bridge:port"),
        Err(ClientError::Transport(TransportError::PortClaimed))
    ));
}

#[test]
fn restricted_handoff_reaches_only_the_extension() {
    let config = BridgeConfig::builder()
        .target_origin(EXTENSION_ORIGIN)
        .build()
        .expect("config");
    let page = transport::PageContext::new(PAGE_ORIGIN);
    let page_script = page.bus().listen(PAGE_ORIGIN);
    let extension = page.bus().listen(EXTENSION_ORIGIN);
    let _bridge = Bridge::install(&page, MockMathAdapter::new(), config).expect("install");

    assert!(matches!(
        ExtensionClient::connect(&page_script, "math-bridge:port"),
        Err(ClientError::NoHandoff { .. })
    ));
    assert!(ExtensionClient::connect(&extension, "math-bridge:port").is_ok());
}

#[test]
fn custom_sentinel_from_json_config() {
    let config = BridgeConfig::from_json_str(r#"{"sentinel": "page:math", "display_math": false}"#)
        .expect("config");
    let mut session = PageSession::open(MockMathAdapter::new(), config).expect("session");
    let reply = session.client.tex_to_mml("y", "e").expect("send");
    session.settle();

    assert!(reply.now_or_never().expect("ready").is_ok());
    assert_eq!(
        session.mock.calls(),
        vec![AdapterCall::Convert {
            notation: Notation::Tex,
            expression: "y".into(),
            display: false,
        }]
    );
}

#[test]
fn reused_correlation_ids_resolve_last_writer_wins() {
    use bridge_protocol::{Command, CommandEnvelope};

    let mut session = open(MockMathAdapter::new());
    let first = session
        .client
        .request(CommandEnvelope::bare(Command::Active, "dup"))
        .expect("send");
    let second = session
        .client
        .request(CommandEnvelope::bare(Command::Active, "dup"))
        .expect("send");
    session.settle();

    assert!(matches!(first.now_or_never(), Some(Err(ClientError::Closed))));
    assert!(second.now_or_never().expect("ready").is_ok());
    assert_eq!(session.client.metrics().unmatched, 1);
}

#[test]
fn dropped_all_jax_streams_release_their_routes() {
    let mock = MockMathAdapter::new().with_nodes([NodeMarkup::new("<math/>", "MathJax-1")]);
    let mut session = open(mock);
    for _ in 0..20 {
        let mut nodes = session.client.all_jax().expect("send");
        session.settle();
        assert!(matches!(nodes.next().now_or_never(), Some(Some(_))));
        drop(nodes);
    }
    session.settle();
    assert_eq!(session.client.pending(), 0);
}
