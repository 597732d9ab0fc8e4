//! Per-detection relationship store.
//!
//! [`RelationshipStore`] owns every [`TicketNode`] discovered during one
//! detection call, keyed by ticket number. It is created fresh per call and
//! dropped when the call returns; nothing is shared between runs.
//!
//! Insertion goes through [`RelationshipStore::upsert`], which merges repeat
//! observations with [`TicketNode::merge`] instead of overwriting them.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{BTreeMap, BTreeSet};

use crate::model::TicketNode;

/// Outcome of a single [`RelationshipStore::upsert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    /// The number was not in the store before.
    Inserted,
    /// An existing node absorbed the observation.
    Merged,
}

/// Owned table of ticket nodes keyed by number.
#[derive(Debug, Clone, Default)]
pub struct RelationshipStore {
    nodes: BTreeMap<u64, TicketNode>,
}

impl RelationshipStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `node`, or merge it into the existing node with the same number.
    pub fn upsert(&mut self, node: TicketNode) -> Upsert {
        match self.nodes.get_mut(&node.number) {
            Some(existing) => {
                existing.merge(node);
                Upsert::Merged
            }
            None => {
                self.nodes.insert(node.number, node);
                Upsert::Inserted
            }
        }
    }

    /// Upsert a batch of observations, returning the numbers that were new.
    pub fn upsert_all(&mut self, nodes: impl IntoIterator<Item = TicketNode>) -> Vec<u64> {
        nodes
            .into_iter()
            .filter_map(|node| {
                let number = node.number;
                (self.upsert(node) == Upsert::Inserted).then_some(number)
            })
            .collect()
    }

    pub fn get(&self, number: u64) -> Option<&TicketNode> {
        self.nodes.get(&number)
    }

    pub fn contains(&self, number: u64) -> bool {
        self.nodes.contains_key(&number)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All known ticket numbers, ascending.
    pub fn numbers(&self) -> impl Iterator<Item = u64> + '_ {
        self.nodes.keys().copied()
    }

    /// The recorded hierarchical parent of `number`, if both are known.
    pub fn parent_of(&self, number: u64) -> Option<u64> {
        self.nodes.get(&number).and_then(|node| node.parent_number)
    }

    /// Returns `true` if `candidate` is the recorded parent of any ticket in
    /// `members`.
    ///
    /// Scans every member on each call.
    pub fn is_parent_of_any(&self, candidate: u64, members: &BTreeSet<u64>) -> bool {
        members
            .iter()
            .any(|&member| self.parent_of(member) == Some(candidate))
    }
}
