//! End-to-end scenarios for the belts checker.

use prodplan::belts;
use prodplan::models::{BeltsInput, BeltsOutcome, FlowNeeded};
use serde_json::json;

fn parse(value: serde_json::Value) -> BeltsInput {
    serde_json::from_value(value).expect("valid instance")
}

fn flow_between<'a>(
    flows: &'a [prodplan::models::FlowEntry],
    from: &str,
    to: &str,
) -> Option<&'a prodplan::models::FlowEntry> {
    flows.iter().find(|entry| entry.from == from && entry.to == to)
}

#[test]
fn linear_chain_routes_all_supply() {
    let input = parse(json!({
        "sources": { "A": 10.0 },
        "sink": "C",
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 0.0, "upper_bound": 10.0 },
            { "from": "B", "to": "C", "lower_bound": 0.0, "upper_bound": 10.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Ok {
            max_flow_per_min,
            flows,
        } => {
            assert!((max_flow_per_min - 10.0).abs() < 1e-9);
            assert!((flow_between(&flows, "A", "B").unwrap().flow - 10.0).abs() < 1e-9);
            assert!((flow_between(&flows, "B", "C").unwrap().flow - 10.0).abs() < 1e-9);
        }
        other => panic!("expected a flow, got {other:?}"),
    }
}

#[test]
fn node_cap_produces_cut_and_tight_node() {
    let input = parse(json!({
        "sources": { "A": 10.0 },
        "sink": "C",
        "node_caps": { "B": 4.0 },
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 0.0, "upper_bound": 10.0 },
            { "from": "B", "to": "C", "lower_bound": 0.0, "upper_bound": 10.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Infeasible {
            cut_reachable,
            deficit,
        } => {
            assert!(cut_reachable.contains("A"));
            assert!(cut_reachable.contains("B"));
            assert!(deficit.tight_nodes.contains("B"));
            assert!((deficit.demand_balance - 6.0).abs() < 1e-9);
        }
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn lower_bound_forces_flow_onto_an_edge() {
    let input = parse(json!({
        "sources": { "A": 5.0 },
        "sink": "D",
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 3.0, "upper_bound": 5.0 },
            { "from": "A", "to": "C", "lower_bound": 0.0, "upper_bound": 5.0 },
            { "from": "B", "to": "D", "lower_bound": 0.0, "upper_bound": 5.0 },
            { "from": "C", "to": "D", "lower_bound": 0.0, "upper_bound": 5.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Ok {
            max_flow_per_min,
            flows,
        } => {
            assert!((max_flow_per_min - 5.0).abs() < 1e-9);
            assert!(flow_between(&flows, "A", "B").unwrap().flow >= 3.0 - 1e-9);
            let into_sink: f64 = flows
                .iter()
                .filter(|entry| entry.to == "D")
                .map(|entry| entry.flow)
                .sum();
            assert!((into_sink - 5.0).abs() < 1e-9);
        }
        other => panic!("expected a flow, got {other:?}"),
    }
}

#[test]
fn impossible_bound_short_circuits() {
    let input = parse(json!({
        "sources": { "A": 10.0 },
        "sink": "B",
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 5.0, "upper_bound": 2.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Infeasible {
            cut_reachable,
            deficit,
        } => {
            assert!(cut_reachable.is_empty());
            assert!((deficit.demand_balance - 10.0).abs() < 1e-9);
            assert_eq!(deficit.tight_edges.len(), 1);
            let tight = &deficit.tight_edges[0];
            assert_eq!(tight.from, "A");
            assert_eq!(tight.to, "B");
            match tight.flow_needed {
                FlowNeeded::Amount(value) => assert!((value + 3.0).abs() < 1e-9),
                FlowNeeded::AtCapacity => panic!("expected a concrete shortfall"),
            }
        }
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn saturated_edge_appears_in_the_certificate() {
    let input = parse(json!({
        "sources": { "A": 10.0 },
        "sink": "B",
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 0.0, "upper_bound": 4.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Infeasible {
            cut_reachable,
            deficit,
        } => {
            assert!(cut_reachable.contains("A"));
            assert!(!cut_reachable.contains("B"));
            assert!((deficit.demand_balance - 6.0).abs() < 1e-9);
            assert_eq!(deficit.tight_edges.len(), 1);
            assert!(matches!(deficit.tight_edges[0].flow_needed, FlowNeeded::AtCapacity));

            // The wire form of "at capacity" is the literal string.
            let rendered = serde_json::to_value(belts::solve(&input)).unwrap();
            assert_eq!(
                rendered["deficit"]["tight_edges"][0]["flow_needed"],
                json!("at capacity")
            );
        }
        other => panic!("expected infeasible, got {other:?}"),
    }
}

#[test]
fn parallel_edges_are_distinct() {
    let input = parse(json!({
        "sources": { "A": 7.0 },
        "sink": "B",
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 0.0, "upper_bound": 3.0 },
            { "from": "A", "to": "B", "lower_bound": 0.0, "upper_bound": 4.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Ok {
            max_flow_per_min,
            flows,
        } => {
            assert!((max_flow_per_min - 7.0).abs() < 1e-9);
            let total: f64 = flows.iter().map(|entry| entry.flow).sum();
            assert!((total - 7.0).abs() < 1e-9);
            for entry in &flows {
                assert!(entry.flow <= 4.0 + 1e-9);
            }
        }
        other => panic!("expected a flow, got {other:?}"),
    }
}

#[test]
fn caps_on_sources_are_ignored() {
    let input = parse(json!({
        "sources": { "A": 10.0 },
        "sink": "C",
        "node_caps": { "A": 1.0 },
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 0.0, "upper_bound": 10.0 },
            { "from": "B", "to": "C", "lower_bound": 0.0, "upper_bound": 10.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Ok {
            max_flow_per_min, ..
        } => {
            assert!((max_flow_per_min - 10.0).abs() < 1e-9);
        }
        other => panic!("expected a flow, got {other:?}"),
    }
}

#[test]
fn unused_edges_are_omitted_from_flows() {
    let input = parse(json!({
        "sources": { "A": 5.0 },
        "sink": "B",
        "edges": [
            { "from": "A", "to": "B", "lower_bound": 0.0, "upper_bound": 10.0 },
            { "from": "X", "to": "B", "lower_bound": 0.0, "upper_bound": 10.0 }
        ]
    }));
    match belts::solve(&input) {
        BeltsOutcome::Ok { flows, .. } => {
            assert!(flow_between(&flows, "A", "B").is_some());
            assert!(flow_between(&flows, "X", "B").is_none());
        }
        other => panic!("expected a flow, got {other:?}"),
    }
}
