//! tests/integration/failure.rs
//!
//! Failure detection: crashed peers are pruned from every live table within
//! the detection window, and a pruned peer can come back as a fresh join.

use crate::common::harness::Cluster;
use membership_net::{domain::Address, engine::Timers};
use test_log::test;

#[test]
fn test_crashed_node_is_pruned_within_the_detection_window() {
    let mut cluster = Cluster::new(3, Timers::default());
    cluster.start_all();
    cluster.step_until(30, |c| (1..=3).all(|id| c.table_ids(id).len() == 3));

    while cluster.now < 100 {
        cluster.step();
    }
    cluster.node_mut(3).fail();

    // T_REMOVE = 20, plus up to one gossip period of jitter.
    cluster.step_until(35, |c| {
        c.table_ids(1) == vec![1, 2] && c.table_ids(2) == vec![1, 2]
    });
    assert!(
        cluster.now <= 130,
        "removal took until tick {}, past the detection bound",
        cluster.now
    );

    // Both survivors logged the removal.
    assert!(cluster.removals_seen_by(1).contains(&Address::new(3, 0)));
    assert!(cluster.removals_seen_by(2).contains(&Address::new(3, 0)));
}

#[test]
fn test_failed_node_goes_silent_immediately() {
    let mut cluster = Cluster::new(2, Timers::default());
    cluster.start_all();
    cluster.step_until(20, |c| c.table_ids(2).len() == 2);

    cluster.node_mut(2).fail();
    let frozen = cluster.node(2).heartbeat();
    cluster.step_n(10);

    assert_eq!(cluster.node(2).heartbeat(), frozen);
    assert!(cluster.node(2).table().len() >= 1);
}

#[test]
fn test_pruned_node_rejoins_as_a_fresh_insertion() {
    let mut cluster = Cluster::new(3, Timers::default());
    cluster.start_all();
    cluster.step_until(30, |c| (1..=3).all(|id| c.table_ids(id).len() == 3));

    cluster.node_mut(3).fail();
    cluster.step_until(40, |c| {
        c.table_ids(1) == vec![1, 2] && c.table_ids(2) == vec![1, 2]
    });

    // The crashed node comes back and re-enters through the normal join
    // path; its id reappears everywhere.
    cluster.start(3);
    cluster.step_until(40, |c| (1..=3).all(|id| c.table_ids(id).len() == 3));
    assert!(cluster.node(3).is_in_group());
}
