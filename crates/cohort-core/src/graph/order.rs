//! Implementation ordering for group members.
//!
//! # Edge Direction
//!
//! The member graph uses edge direction `blocker → blocked`. An edge is
//! present when either end declares it (`A.blocking ∋ B` or
//! `B.blocked_by ∋ A`) and both ends are members. Edges leaving the group are
//! ignored; those tickets are not part of the work being sequenced.
//!
//! # Algorithm
//!
//! Kahn's algorithm with a ready set ordered by ticket number: the smallest
//! ready ticket is always emitted next, so input order never leaks into the
//! result.
//!
//! If some members are never emitted they sit on or behind a cycle. The
//! error names all of them, and separately lists the strongly connected
//! components (via [`petgraph::algo::tarjan_scc`]) that form the actual
//! loops.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::{BTreeSet, HashMap};

use petgraph::Direction;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use crate::error::GroupError;
use crate::store::RelationshipStore;

/// Blocking graph restricted to one membership set.
#[derive(Debug)]
pub struct MemberGraph {
    /// Directed graph: nodes = ticket numbers, edges = blocker → blocked.
    pub graph: DiGraph<u64, ()>,
    /// Mapping from ticket number to petgraph `NodeIndex`.
    pub node_map: HashMap<u64, NodeIndex>,
}

impl MemberGraph {
    /// Build the in-group blocking graph for `members`.
    pub fn build(store: &RelationshipStore, members: &BTreeSet<u64>) -> Self {
        let mut graph = DiGraph::<u64, ()>::with_capacity(members.len(), members.len());
        let mut node_map: HashMap<u64, NodeIndex> = HashMap::with_capacity(members.len());

        for &number in members {
            node_map.insert(number, graph.add_node(number));
        }

        for &number in members {
            let Some(node) = store.get(number) else {
                continue;
            };
            let outgoing = node
                .blocking_numbers
                .iter()
                .map(|&blocked| (number, blocked));
            let incoming = node
                .blocked_by_numbers
                .iter()
                .map(|&blocker| (blocker, number));

            for (blocker, blocked) in outgoing.chain(incoming) {
                let (Some(&from), Some(&to)) = (node_map.get(&blocker), node_map.get(&blocked))
                else {
                    continue;
                };
                // Both ends usually declare the same edge.
                if !graph.contains_edge(from, to) {
                    graph.add_edge(from, to, ());
                }
            }
        }

        Self { graph, node_map }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if `blocker` blocks `blocked` within the group.
    #[cfg(test)]
    pub(crate) fn blocks(&self, blocker: u64, blocked: u64) -> bool {
        match (self.node_map.get(&blocker), self.node_map.get(&blocked)) {
            (Some(&from), Some(&to)) => self.graph.contains_edge(from, to),
            _ => false,
        }
    }

    /// Number of in-group blockers of `number`.
    #[cfg(test)]
    pub(crate) fn in_degree(&self, number: u64) -> usize {
        self.node_map.get(&number).map_or(0, |&idx| {
            self.graph
                .neighbors_directed(idx, Direction::Incoming)
                .count()
        })
    }

    /// Order members so every ticket follows all of its in-group blockers.
    ///
    /// # Errors
    ///
    /// Returns [`GroupError::Cycle`] naming every member that could not be
    /// placed.
    pub fn topological_order(&self) -> Result<Vec<u64>, GroupError> {
        let mut in_degree: HashMap<NodeIndex, usize> = self
            .graph
            .node_indices()
            .map(|idx| {
                let blockers = self
                    .graph
                    .neighbors_directed(idx, Direction::Incoming)
                    .count();
                (idx, blockers)
            })
            .collect();

        let mut ready: BTreeSet<u64> = in_degree
            .iter()
            .filter(|&(_, &degree)| degree == 0)
            .map(|(&idx, _)| self.graph[idx])
            .collect();

        let mut sorted: Vec<u64> = Vec::with_capacity(self.graph.node_count());

        while let Some(number) = ready.pop_first() {
            sorted.push(number);
            let idx = self.node_map[&number];

            for blocked in self.graph.neighbors_directed(idx, Direction::Outgoing) {
                if let Some(degree) = in_degree.get_mut(&blocked) {
                    *degree -= 1;
                    if *degree == 0 {
                        ready.insert(self.graph[blocked]);
                    }
                }
            }
        }

        if sorted.len() < self.graph.node_count() {
            let placed: BTreeSet<u64> = sorted.iter().copied().collect();
            // Nodes were added in ascending order.
            let unordered: Vec<u64> = self
                .graph
                .node_weights()
                .copied()
                .filter(|number| !placed.contains(number))
                .collect();
            let cycles = self.find_cycles();
            debug!(?unordered, ?cycles, "members could not be ordered");
            return Err(GroupError::Cycle { unordered, cycles });
        }

        Ok(sorted)
    }

    /// Strongly connected components that form loops, sorted by ticket number.
    ///
    /// Self-loops are reported as one-element cycles.
    pub fn find_cycles(&self) -> Vec<Vec<u64>> {
        let mut cycles: Vec<Vec<u64>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || component
                        .first()
                        .is_some_and(|&idx| self.graph.contains_edge(idx, idx))
            })
            .map(|component| {
                let mut numbers: Vec<u64> =
                    component.into_iter().map(|idx| self.graph[idx]).collect();
                numbers.sort_unstable();
                numbers
            })
            .collect();

        cycles.sort_unstable();
        cycles
    }
}
