//! tests/integration/join.rs
//!
//! End-to-end join bootstrapping: the two-node handshake and the
//! introducer's admit-before-reply behavior.

use crate::common::harness::Cluster;
use membership_net::{
    codec::{self, Frame},
    domain::Address,
    engine::Timers,
};
use test_log::test;

#[test]
fn test_two_node_join_handshake() {
    let mut cluster = Cluster::new(2, Timers::default());

    // The introducer boots the group on its own.
    cluster.start(1);
    assert!(cluster.node(1).is_in_group());
    assert_eq!(cluster.table_ids(1), vec![1]);

    // Node 2 starts and fires a JOINREQ at the introducer; it is not in
    // the group until the reply arrives.
    cluster.start(2);
    assert!(!cluster.node(2).is_in_group());

    // The introducer receives the request and admits node 2.
    cluster.step();
    assert_eq!(cluster.table_ids(1), vec![1, 2]);

    // The newcomer receives the JOINREP and joins with the full table.
    cluster.step();
    assert!(cluster.node(2).is_in_group());
    assert_eq!(cluster.table_ids(2), vec![1, 2]);
}

#[test]
fn test_join_rep_digest_includes_the_newcomer() {
    let mut cluster = Cluster::new(2, Timers::default());
    cluster.start(1);
    cluster.start(2);
    cluster.step();

    // Peek at the reply sitting on the wire for node 2.
    let frames = cluster.net.drain(Address::new(2, 0));
    assert_eq!(frames.len(), 1);
    match codec::decode(&frames[0]).expect("the reply should decode") {
        Frame::JoinRep { digest } => {
            assert!(
                digest.iter().any(|r| r.id == 2),
                "the introducer must admit the newcomer before replying"
            );
            assert!(digest.iter().any(|r| r.id == 1));
        }
        other => panic!("expected a JOINREP, got {other:?}"),
    }
}

#[test]
fn test_join_reply_carries_the_legacy_digest_form() {
    let mut cluster = Cluster::new(2, Timers::default());
    cluster.start(1);
    cluster.start(2);
    cluster.step(); // introducer admits node 2 at tick 0

    let frames = cluster.net.drain(Address::new(2, 0));
    // tag byte, then "<id>.<port>.<heartbeat>.<timestamp>>" records.
    assert_eq!(&frames[0][1..], b"1.0.0.0>2.0.0.0>");
}

#[test]
fn test_every_join_is_logged_by_the_observer() {
    let mut cluster = Cluster::new(2, Timers::default());
    cluster.start(1);
    cluster.start(2);
    cluster.step_n(2);

    // Each node logs itself at start, and the peer when it learns of it.
    let by_introducer = cluster.additions_seen_by(1);
    assert!(by_introducer.contains(&Address::new(1, 0)));
    assert!(by_introducer.contains(&Address::new(2, 0)));

    let by_newcomer = cluster.additions_seen_by(2);
    assert!(by_newcomer.contains(&Address::new(2, 0)));
    assert!(by_newcomer.contains(&Address::new(1, 0)));
}
