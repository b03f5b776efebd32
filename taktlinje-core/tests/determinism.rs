//! Tests for deterministic simulation.
//!
//! Identical configuration, seed, and action sequence must reproduce the
//! same trajectory bit for bit, on either queue backend. This is the
//! property that makes logged episodes replayable.

use taktlinje_config::{DistKind, DistSpec, LineConfig, QueueBackend};
use taktlinje_core::kernel::{build_kernel, Kernel};
use taktlinje_core::snapshot::Snapshot;

fn failing_line() -> LineConfig {
    LineConfig {
        n_stations: 3,
        buffer_caps: vec![2, 2],
        proc_means: vec![4.0, 5.0, 4.5],
        proc_dists: DistSpec::PerStation(vec![DistKind::Uniform, DistKind::Exp, DistKind::Uniform]),
        util_alpha: 0.1,
        fail_rate: 0.2,
        repair_time: 10.0,
        workers: 1,
    }
}

/// Drive a kernel through a fixed action schedule, collecting snapshots and
/// state digests at every decision boundary.
fn run_schedule(backend: QueueBackend, seed: u64) -> (Vec<Snapshot>, Vec<String>) {
    let mut kernel = build_kernel(&failing_line(), backend).unwrap();
    let mut snapshots = vec![kernel.reset(Some(seed), 30)];
    let mut digests = vec![kernel.state_digest()];

    let actions = [None, Some(1.5), None, Some(0.5), None, None, Some(2.0), None];
    for action in actions.iter().cycle().take(40) {
        kernel.apply_action(*action);
        snapshots.push(kernel.run_until_next_decision());
        digests.push(kernel.state_digest());
    }
    (snapshots, digests)
}

#[test]
fn same_seed_same_trajectory() {
    let (snaps_a, digests_a) = run_schedule(QueueBackend::Heap, 12345);
    let (snaps_b, digests_b) = run_schedule(QueueBackend::Heap, 12345);
    assert_eq!(snaps_a, snaps_b);
    assert_eq!(digests_a, digests_b);
}

#[test]
fn different_seed_diverges() {
    let (_, digests_a) = run_schedule(QueueBackend::Heap, 1);
    let (_, digests_b) = run_schedule(QueueBackend::Heap, 2);
    assert_ne!(digests_a, digests_b);
}

#[test]
fn queue_backends_agree() {
    let (snaps_heap, digests_heap) = run_schedule(QueueBackend::Heap, 777);
    let (snaps_ordered, digests_ordered) = run_schedule(QueueBackend::Ordered, 777);
    assert_eq!(snaps_heap, snaps_ordered);
    assert_eq!(digests_heap, digests_ordered);
}

#[test]
fn reset_replays_from_scratch() {
    let mut kernel = build_kernel(&failing_line(), QueueBackend::Heap).unwrap();
    kernel.reset(Some(9), 30);
    let first: Vec<String> = (0..20)
        .map(|_| {
            kernel.run_until_next_decision();
            kernel.state_digest()
        })
        .collect();

    kernel.reset(Some(9), 30);
    let second: Vec<String> = (0..20)
        .map(|_| {
            kernel.run_until_next_decision();
            kernel.state_digest()
        })
        .collect();

    assert_eq!(first, second);
}

#[test]
fn run_to_finish_is_reproducible() {
    let mut a = build_kernel(&failing_line(), QueueBackend::Heap).unwrap();
    let mut b = build_kernel(&failing_line(), QueueBackend::Ordered).unwrap();
    a.reset(Some(4242), 25);
    b.reset(Some(4242), 25);
    assert_eq!(a.run_to_finish(), b.run_to_finish());
    assert_eq!(a.state_digest(), b.state_digest());
}
