//! LowNodeUtilization end-to-end tests.
//!
//! Runs whole passes against an in-memory cluster loaded from a JSON
//! inventory: classification, budget, tiered eviction and the guards.

use rebalance_core::{ClusterSnapshot, LowNodeUtilizationConfig, ResourceName, RuntimeConfig};
use rebalance_strategy::*;
use serde_json::{Value, json};

fn node(name: &str) -> Value {
    json!({
        "name": name,
        "allocatable": { "cpu": "2000m", "memory": "4Gi", "pods": 10 }
    })
}

fn owned(name: &str, node: &str, resources: Value) -> Value {
    json!({
        "name": name,
        "node_name": node,
        "owner_references": [{ "kind": "ReplicaSet", "name": "app", "controller": true }],
        "containers": [{ "name": "main", "resources": resources }]
    })
}

fn best_effort(name: &str, node: &str) -> Value {
    owned(name, node, json!({}))
}

fn burstable(name: &str, node: &str, cpu: &str, memory: &str) -> Value {
    owned(name, node, json!({ "requests": { "cpu": cpu, "memory": memory } }))
}

fn guaranteed(name: &str, node: &str, cpu: &str, memory: &str) -> Value {
    let r = json!({ "cpu": cpu, "memory": memory });
    owned(name, node, json!({ "requests": r, "limits": r }))
}

/// Node A: 10% cpu, ~15% memory, 20% pods.
/// Node B: 90% cpu, ~85% memory, every pod slot used
/// (5 best-effort, 3 burstable, 2 guaranteed).
fn scenario() -> ClusterSnapshot {
    let mut pods = vec![
        burstable("a-0", "a", "100m", "307Mi"),
        burstable("a-1", "a", "100m", "307Mi"),
    ];
    for i in 0..5 {
        pods.push(best_effort(&format!("be-{i}"), "b"));
    }
    for i in 0..3 {
        pods.push(burstable(&format!("bu-{i}"), "b", "400m", "700Mi"));
    }
    for i in 0..2 {
        pods.push(guaranteed(&format!("gu-{i}"), "b", "300m", "690Mi"));
    }

    serde_json::from_value(json!({ "nodes": [node("a"), node("b")], "pods": pods })).unwrap()
}

fn config() -> LowNodeUtilizationConfig {
    LowNodeUtilizationConfig {
        enabled: true,
        number_of_nodes: 0,
        thresholds: [
            (ResourceName::Cpu, 20.0),
            (ResourceName::Memory, 20.0),
            (ResourceName::Pods, 30.0),
        ]
        .into_iter()
        .collect(),
        target_thresholds: [
            (ResourceName::Cpu, 50.0),
            (ResourceName::Memory, 50.0),
            (ResourceName::Pods, 50.0),
        ]
        .into_iter()
        .collect(),
    }
}

fn runtime(dry_run: bool) -> RuntimeConfig {
    RuntimeConfig {
        dry_run,
        ..Default::default()
    }
}

fn pass(cluster: &InMemoryCluster, dry_run: bool) -> PassOutcome {
    let strategy = LowNodeUtilization::new(config(), &runtime(dry_run));
    strategy.run(&cluster.ready_nodes(), cluster, cluster)
}

#[test]
fn scenario_classifies_and_budgets() {
    let cluster = InMemoryCluster::new(scenario());
    let strategy = LowNodeUtilization::new(config(), &runtime(false));
    let cfg = strategy.config();

    let usages = strategy.measure(&cluster.ready_nodes(), &cluster);
    let classified = classify_nodes(usages, &cfg.thresholds, &cfg.target_thresholds);
    let low: Vec<_> = classified.low.iter().map(|n| n.name()).collect();
    let target: Vec<_> = classified.target.iter().map(|n| n.name()).collect();
    assert_eq!(low, vec!["a"]);
    assert_eq!(target, vec!["b"]);

    let budget = EvictionBudget::from_low_nodes(&classified.low, &cfg.target_thresholds);
    assert_eq!(budget.pods, 3.0);
    assert_eq!(budget.cpu_millis, 800.0);
    let gib = 1024.0 * 1024.0 * 1024.0;
    assert!((budget.memory_bytes / gib - 1.4).abs() < 0.01);
}

#[test]
fn scenario_drains_best_effort_first() {
    let cluster = InMemoryCluster::new(scenario());

    let outcome = pass(&cluster, false);

    // Best-effort pods free no cpu or memory, so the cpu and memory budgets
    // carry the pass into the burstable tier. The third burstable eviction
    // spends every budget and brings B under target.
    assert_eq!(
        outcome,
        PassOutcome::Completed(PassReport {
            low_nodes: 1,
            target_nodes: 1,
            other_nodes: 0,
            evicted: 8,
        })
    );
    let evicted = cluster.evicted();
    assert!(evicted[..5].iter().all(|k| k.starts_with("default/be-")));
    assert!(evicted[5..].iter().all(|k| k.starts_with("default/bu-")));
    assert!(!evicted.iter().any(|k| k.contains("gu-")));
    assert!(!evicted.iter().any(|k| k.starts_with("default/a-")));
}

#[test]
fn dry_run_reports_same_evictions_without_removing() {
    let real = InMemoryCluster::new(scenario());
    let dry = InMemoryCluster::new(scenario());

    let real_outcome = pass(&real, false);
    let dry_outcome = pass(&dry, true);

    assert_eq!(real_outcome, dry_outcome);
    assert!(dry.evicted().is_empty());
    assert_eq!(dry.snapshot(), scenario());
    assert_eq!(real.snapshot().pods.len(), scenario().pods.len() - 8);
}

#[test]
fn protected_pods_are_skipped_not_retried() {
    let cluster = InMemoryCluster::new(scenario())
        .with_protected_pod("default/be-0", "disruption budget")
        .with_protected_pod("default/be-1", "disruption budget");

    let outcome = pass(&cluster, false);

    let evicted = cluster.evicted();
    assert!(!evicted.contains(&"default/be-0".to_string()));
    assert!(!evicted.contains(&"default/be-1".to_string()));
    assert_eq!(outcome.evicted(), evicted.len());
    assert_eq!(&evicted[..3], &["default/be-2", "default/be-3", "default/be-4"]);
}

#[test]
fn non_removable_pods_stay() {
    let mut snapshot = scenario();
    let extra: Vec<Value> = vec![
        json!({
            "name": "agent",
            "node_name": "b",
            "owner_references": [{ "kind": "DaemonSet", "name": "agent", "controller": true }]
        }),
        json!({ "name": "static", "node_name": "b", "annotations": {
            "kubernetes.io/config.mirror": "x"
        }}),
        json!({
            "name": "cache",
            "node_name": "b",
            "owner_references": [{ "kind": "ReplicaSet", "name": "c", "controller": true }],
            "volumes": [{ "name": "scratch", "source": { "type": "empty_dir" } }]
        }),
        json!({ "name": "orphan", "node_name": "b" }),
    ];
    for pod in extra {
        snapshot.pods.push(serde_json::from_value(pod).unwrap());
    }
    let cluster = InMemoryCluster::new(snapshot);

    pass(&cluster, false);

    let evicted = cluster.evicted();
    for name in ["agent", "static", "cache", "orphan"] {
        assert!(!evicted.contains(&format!("default/{name}")));
    }
}

#[test]
fn not_ready_nodes_take_no_part() {
    let mut snapshot = scenario();
    snapshot.nodes[0].ready = false;
    let cluster = InMemoryCluster::new(snapshot);

    // With A gone, B is the only node and nothing is underutilized.
    assert_eq!(
        pass(&cluster, false),
        PassOutcome::Aborted(GuardAbort::NoLowNodes)
    );
    assert!(cluster.evicted().is_empty());
}

#[test]
fn inventory_roundtrips_through_json() {
    let snapshot = scenario();
    let text = snapshot.to_json_string().unwrap();
    let parsed: ClusterSnapshot = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed, snapshot);
}
