//! Max-flow oracle: Dinic's algorithm with residual min-cut read-back.
//!
//! Arcs are stored in a flat vector with each forward arc immediately
//! followed by its residual twin, so `arc ^ 1` flips direction. Node
//! indices are handed out by [`FlowNetwork::add_node`] and the caller keeps
//! its own mapping from domain names to indices.

use std::collections::VecDeque;

use crate::EPSILON;

/// Identifier of an arc, returned by [`FlowNetwork::add_arc`] and used to
/// read the arc's flow after solving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArcId(usize);

#[derive(Debug, Clone, Copy)]
struct Arc {
    to: usize,
    cap: f64,
}

/// A directed flow network over integer node indices.
#[derive(Debug, Default)]
pub struct FlowNetwork {
    adjacency: Vec<Vec<usize>>,
    arcs: Vec<Arc>,
}

impl FlowNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_node(&mut self) -> usize {
        self.adjacency.push(Vec::new());
        self.adjacency.len() - 1
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Add a directed arc with the given capacity.
    pub fn add_arc(&mut self, from: usize, to: usize, cap: f64) -> ArcId {
        let id = ArcId(self.arcs.len() / 2);
        self.adjacency[from].push(self.arcs.len());
        self.arcs.push(Arc { to, cap });
        self.adjacency[to].push(self.arcs.len());
        self.arcs.push(Arc { to: from, cap: 0.0 });
        id
    }

    /// Flow pushed through the arc by the last [`FlowNetwork::solve`] call.
    pub fn flow(&self, arc: ArcId) -> f64 {
        self.arcs[2 * arc.0 + 1].cap
    }

    /// Compute the maximum flow from `source` to `sink` and return its
    /// value. Capacities are consumed in place; call once per network.
    pub fn solve(&mut self, source: usize, sink: usize) -> f64 {
        let mut total = 0.0;
        loop {
            let levels = self.levels(source);
            if levels[sink] == usize::MAX {
                return total;
            }
            let mut next_arc = vec![0usize; self.adjacency.len()];
            loop {
                let pushed = self.augment(source, sink, f64::INFINITY, &levels, &mut next_arc);
                if pushed <= EPSILON {
                    break;
                }
                total += pushed;
            }
        }
    }

    /// Nodes reachable from `source` through positive residual capacity:
    /// the source side of a minimum cut once `solve` has run.
    pub fn residual_reachable(&self, source: usize) -> Vec<bool> {
        let mut reachable = vec![false; self.adjacency.len()];
        let mut queue = VecDeque::new();
        reachable[source] = true;
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            for &arc in &self.adjacency[node] {
                let Arc { to, cap } = self.arcs[arc];
                if cap > EPSILON && !reachable[to] {
                    reachable[to] = true;
                    queue.push_back(to);
                }
            }
        }
        reachable
    }

    /// Breadth-first distances from `source` over positive residual arcs;
    /// `usize::MAX` marks unreachable nodes.
    fn levels(&self, source: usize) -> Vec<usize> {
        let mut levels = vec![usize::MAX; self.adjacency.len()];
        let mut queue = VecDeque::new();
        levels[source] = 0;
        queue.push_back(source);
        while let Some(node) = queue.pop_front() {
            for &arc in &self.adjacency[node] {
                let Arc { to, cap } = self.arcs[arc];
                if cap > EPSILON && levels[to] == usize::MAX {
                    levels[to] = levels[node] + 1;
                    queue.push_back(to);
                }
            }
        }
        levels
    }

    /// Push one augmenting path through the level graph, advancing each
    /// node's arc cursor past exhausted arcs.
    fn augment(
        &mut self,
        node: usize,
        sink: usize,
        limit: f64,
        levels: &[usize],
        next_arc: &mut [usize],
    ) -> f64 {
        if node == sink {
            return limit;
        }
        while next_arc[node] < self.adjacency[node].len() {
            let arc = self.adjacency[node][next_arc[node]];
            let Arc { to, cap } = self.arcs[arc];
            if cap > EPSILON && levels[to] == levels[node] + 1 {
                let pushed = self.augment(to, sink, limit.min(cap), levels, next_arc);
                if pushed > EPSILON {
                    self.arcs[arc].cap -= pushed;
                    self.arcs[arc ^ 1].cap += pushed;
                    return pushed;
                }
            }
            next_arc[node] += 1;
        }
        0.0
    }
}
