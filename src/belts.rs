//! Belt-network feasibility with bounds.
//!
//! Node caps are encoded by splitting each capped intermediate into an
//! in/out pair joined by a capacity arc; edge lower bounds are shifted out
//! of the capacities and turned into per-node imbalances absorbed by a
//! super-source and super-sink. The instance is feasible exactly when the
//! max flow saturates every super-source arc; otherwise the residual cut
//! becomes the certificate.

use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::maxflow::{ArcId, FlowNetwork};
use crate::models::{BeltsInput, BeltsOutcome, Deficit, FlowEntry, FlowNeeded, TightEdge};
use crate::EPSILON;

/// Solve a belts instance end to end.
pub fn solve(input: &BeltsInput) -> BeltsOutcome {
    // Every name mentioned anywhere participates in the graph.
    let mut names: BTreeSet<&str> = input.sources.keys().map(String::as_str).collect();
    names.insert(input.sink.as_str());
    for edge in &input.edges {
        names.insert(edge.from.as_str());
        names.insert(edge.to.as_str());
    }
    names.extend(input.node_caps.keys().map(String::as_str));

    let mut graph = FlowNetwork::new();
    let s_star = graph.add_node();
    let t_star = graph.add_node();

    // v_in receives, v_out emits. The indices differ only for capped
    // intermediates, whose internal arc carries the node cap; caps on
    // sources or the sink are ignored.
    let mut in_index: BTreeMap<&str, usize> = BTreeMap::new();
    let mut out_index: BTreeMap<&str, usize> = BTreeMap::new();
    let mut index_name: Vec<&str> = vec![""; 2];
    let mut split_arcs: Vec<(&str, usize, usize)> = Vec::new();
    for &name in &names {
        let v_in = graph.add_node();
        index_name.push(name);
        let splittable = !input.sources.contains_key(name) && name != input.sink;
        let v_out = match input.node_caps.get(name) {
            Some(&cap) if splittable => {
                let v_out = graph.add_node();
                index_name.push(name);
                graph.add_arc(v_in, v_out, cap);
                split_arcs.push((name, v_in, v_out));
                v_out
            }
            _ => v_in,
        };
        in_index.insert(name, v_in);
        out_index.insert(name, v_out);
    }

    // Per-index imbalance: positive means the index must emit net flow and
    // is fed from s*; negative means it must absorb and drains to t*.
    let mut balance: BTreeMap<usize, f64> = BTreeMap::new();
    let mut total_supply = 0.0;
    for (name, supply) in &input.sources {
        *balance.entry(out_index[name.as_str()]).or_insert(0.0) += supply;
        total_supply += supply;
    }
    *balance.entry(in_index[input.sink.as_str()]).or_insert(0.0) -= total_supply;

    let mut edge_arcs: Vec<ArcId> = Vec::with_capacity(input.edges.len());
    for edge in &input.edges {
        if edge.upper_bound - edge.lower_bound < -EPSILON {
            // An impossible bound needs no oracle; cite the edge directly.
            return BeltsOutcome::Infeasible {
                cut_reachable: BTreeSet::new(),
                deficit: Deficit {
                    demand_balance: total_supply,
                    tight_nodes: BTreeSet::new(),
                    tight_edges: vec![TightEdge {
                        from: edge.from.clone(),
                        to: edge.to.clone(),
                        flow_needed: FlowNeeded::Amount(edge.upper_bound - edge.lower_bound),
                    }],
                },
            };
        }
        let u = out_index[edge.from.as_str()];
        let v = in_index[edge.to.as_str()];
        edge_arcs.push(graph.add_arc(u, v, edge.upper_bound - edge.lower_bound));
        *balance.entry(u).or_insert(0.0) -= edge.lower_bound;
        *balance.entry(v).or_insert(0.0) += edge.lower_bound;
    }

    let mut super_arcs: Vec<(usize, usize)> = Vec::new();
    let mut demand_from_s_star = 0.0;
    for (&index, &imbalance) in &balance {
        if imbalance > EPSILON {
            graph.add_arc(s_star, index, imbalance);
            super_arcs.push((s_star, index));
            demand_from_s_star += imbalance;
        } else if imbalance < -EPSILON {
            graph.add_arc(index, t_star, -imbalance);
            super_arcs.push((index, t_star));
        }
    }

    let max_flow = graph.solve(s_star, t_star);
    debug!("belts: {} nodes, max flow {max_flow}, demand {demand_from_s_star}", graph.node_count());

    if max_flow < demand_from_s_star - EPSILON {
        return cut_certificate(CutContext {
            input,
            graph: &graph,
            s_star,
            index_name: &index_name,
            in_index: &in_index,
            out_index: &out_index,
            split_arcs: &split_arcs,
            super_arcs: &super_arcs,
            deficit: demand_from_s_star - max_flow,
        });
    }

    // Undo the shift: each original edge carries its lower bound on top of
    // the residual flow. Edges at zero are omitted.
    let flows = input
        .edges
        .iter()
        .zip(&edge_arcs)
        .filter_map(|(edge, &arc)| {
            let flow = graph.flow(arc) + edge.lower_bound;
            (flow > EPSILON).then(|| FlowEntry {
                from: edge.from.clone(),
                to: edge.to.clone(),
                flow,
            })
        })
        .collect();

    BeltsOutcome::Ok {
        max_flow_per_min: total_supply,
        flows,
    }
}

struct CutContext<'a> {
    input: &'a BeltsInput,
    graph: &'a FlowNetwork,
    s_star: usize,
    index_name: &'a [&'a str],
    in_index: &'a BTreeMap<&'a str, usize>,
    out_index: &'a BTreeMap<&'a str, usize>,
    split_arcs: &'a [(&'a str, usize, usize)],
    super_arcs: &'a [(usize, usize)],
    deficit: f64,
}

/// Build the infeasibility certificate from the residual min cut.
fn cut_certificate(ctx: CutContext<'_>) -> BeltsOutcome {
    let reachable = ctx.graph.residual_reachable(ctx.s_star);

    // Split halves collapse to one name; s* and t* stay anonymous.
    let mut cut_reachable = BTreeSet::new();
    for (index, name) in ctx.index_name.iter().enumerate().skip(2) {
        if reachable[index] {
            cut_reachable.insert((*name).to_string());
        }
    }

    // Any arc crossing from the reachable side is saturated. Crossing
    // original edges are reported as tight; a crossing internal arc marks
    // its capped node as tight.
    let mut tight_edges = Vec::new();
    for edge in &ctx.input.edges {
        if crosses(&reachable, ctx.out_index[edge.from.as_str()], ctx.in_index[edge.to.as_str()]) {
            tight_edges.push(TightEdge {
                from: edge.from.clone(),
                to: edge.to.clone(),
                flow_needed: FlowNeeded::AtCapacity,
            });
        }
    }

    let mut tight_nodes = BTreeSet::new();
    let mut split_half: Vec<bool> = vec![false; ctx.graph.node_count()];
    for &(_, v_in, v_out) in ctx.split_arcs {
        split_half[v_in] = true;
        split_half[v_out] = true;
    }
    for &(name, v_in, v_out) in ctx.split_arcs {
        if crosses(&reachable, v_in, v_out) {
            tight_nodes.insert(name.to_string());
        }
    }
    for &(from, to) in ctx.super_arcs {
        if crosses(&reachable, from, to) && split_half[from] {
            tight_nodes.insert(ctx.index_name[from].to_string());
        }
    }

    BeltsOutcome::Infeasible {
        cut_reachable,
        deficit: Deficit {
            demand_balance: ctx.deficit,
            tight_nodes,
            tight_edges,
        },
    }
}

fn crosses(reachable: &[bool], from: usize, to: usize) -> bool {
    reachable[from] && !reachable[to]
}
