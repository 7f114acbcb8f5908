use adapter_mock::MockMathAdapter;
use bridge::BridgeConfig;
use futures::{FutureExt, StreamExt};
use math_adapter::NodeMarkup;

use crate::harness::PageSession;

const NEW_MATH: &str = "New Math";

fn drain(subscription: &mut extension_client::Subscription) -> Vec<String> {
    let mut element_ids = Vec::new();
    while let Some(Some(rep)) = subscription.next().now_or_never() {
        element_ids.push(rep.into_node().expect("node").element_id);
    }
    element_ids
}

#[test]
fn every_firing_reaches_the_subscriber() {
    let mut session = PageSession::open(MockMathAdapter::new(), BridgeConfig::default())
        .expect("session");
    let mut typeset = session.client.register_signal(NEW_MATH).expect("send");
    session.settle();
    assert_eq!(session.mock.subscriber_count(NEW_MATH), 1);

    for n in 0..4 {
        session
            .mock
            .fire(NEW_MATH, NodeMarkup::new("<math/>", format!("node-{n}")));
    }
    session.settle();
    assert_eq!(drain(&mut typeset), vec!["node-0", "node-1", "node-2", "node-3"]);

    for _ in 0..16 {
        session.settle();
    }
    session.mock.fire(NEW_MATH, NodeMarkup::new("<math/>", "much-later"));
    session.settle();
    assert_eq!(drain(&mut typeset), vec!["much-later"]);
    assert_eq!(session.client.pending(), 1);
}

#[test]
fn duplicate_registrations_each_get_a_copy() {
    let mut session = PageSession::open(MockMathAdapter::new(), BridgeConfig::default())
        .expect("session");
    let mut first = session.client.register_signal(NEW_MATH).expect("send");
    let mut second = session.client.register_signal(NEW_MATH).expect("send");
    session.settle();

    session.mock.fire(NEW_MATH, NodeMarkup::new("<math/>", "n1"));
    session.settle();
    assert_eq!(drain(&mut first), vec!["n1"]);
    assert_eq!(drain(&mut second), vec!["n1"]);
}

#[test]
fn other_signals_do_not_leak_into_a_subscription() {
    let mut session = PageSession::open(MockMathAdapter::new(), BridgeConfig::default())
        .expect("session");
    let mut typeset = session.client.register_signal(NEW_MATH).expect("send");
    session.settle();

    session.mock.fire("End Process", NodeMarkup::new("<math/>", "elsewhere"));
    session.settle();
    assert!(drain(&mut typeset).is_empty());
}
