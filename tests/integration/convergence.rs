//! tests/integration/convergence.rs
//!
//! Gossip convergence: every node's table reaching the full cluster view,
//! and staying there under message loss.

use crate::common::harness::Cluster;
use membership_net::{emulnet::EmulNet, engine::Timers};
use test_log::test;

fn all_tables_full(cluster: &Cluster, count: u32) -> bool {
    (1..=count).all(|id| cluster.table_ids(id).len() == count as usize)
}

#[test]
fn test_five_nodes_converge_within_three_gossip_periods() {
    let mut cluster = Cluster::new(5, Timers::default());
    cluster.start_all();

    // With T_GOSSIP = 5, fifteen ticks after the last join is enough for
    // every table to hold the whole cluster.
    cluster.step_n(15);
    for id in 1..=5 {
        assert_eq!(
            cluster.table_ids(id),
            vec![1, 2, 3, 4, 5],
            "node {id} has not converged"
        );
    }
}

#[test]
fn test_staggered_joins_still_converge() {
    let mut cluster = Cluster::new(4, Timers::default());
    for id in 1..=4 {
        cluster.start(id);
        cluster.step_n(3);
    }
    cluster.step_until(40, |c| all_tables_full(c, 4));
}

#[test]
fn test_converged_tables_stay_converged_under_loss() {
    // Converge over a healthy fabric first, then degrade it. Refreshes
    // arrive along many redundant paths, so a 20% loss rate must cause no
    // spurious removals.
    let mut cluster = Cluster::with_network(5, Timers::default(), EmulNet::new(7, 0.0));
    cluster.start_all();
    cluster.step_until(30, |c| all_tables_full(c, 5));

    cluster.net.set_drop_rate(0.2);
    cluster.step_n(60);

    for id in 1..=5 {
        assert_eq!(
            cluster.table_ids(id),
            vec![1, 2, 3, 4, 5],
            "node {id} spuriously removed a live peer"
        );
    }
    assert!(cluster.net.dropped() > 0, "the lossy fabric saw no loss");
}

#[test]
fn test_heartbeats_keep_advancing_across_the_cluster() {
    let mut cluster = Cluster::new(3, Timers::default());
    cluster.start_all();
    cluster.step_until(30, |c| all_tables_full(c, 3));

    let snapshot: Vec<i64> = (1..=3)
        .map(|id| cluster.node(id).table().find(1).unwrap().heartbeat)
        .collect();
    cluster.step_n(15);
    for (i, id) in (1..=3).enumerate() {
        let later = cluster.node(id).table().find(1).unwrap().heartbeat;
        assert!(
            later > snapshot[i],
            "node {id} stopped observing fresh heartbeats for node 1"
        );
    }
}
