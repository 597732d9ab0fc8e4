//! Group membership classification.
//!
//! The closed store contains every ticket reachable from the seed, including
//! hierarchical containers that exist only as context. This module decides
//! which of those tickets are actual implementation targets.
//!
//! # Rules
//!
//! 1. **Seed has a parent**: start from the parent's declared children that
//!    are in the store. The seed is always included.
//! 2. **Seed has children**: start from those children that are in the
//!    store; the seed is the container and stays out. If none resolved, the
//!    seed is the sole member.
//! 3. **Otherwise**: start from the seed alone.
//! 4. **Dependency closure**: repeatedly add any in-store blocker or blocked
//!    ticket of a member, unless the candidate is the hierarchical parent of
//!    a current member. Stop when a full pass adds nothing.
//!
//! Each pass iterates a snapshot of the membership taken at the start of
//! the pass, so additions never disturb the iteration.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::store::RelationshipStore;

/// How the initial membership was seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    /// Seed is a sub-ticket; its siblings form the base group.
    Siblings { parent: u64 },
    /// Seed is a container; its children form the base group.
    Children,
    /// Seed is a container with no resolvable children.
    EmptyContainer,
    /// Seed has no hierarchy.
    Standalone,
}

/// Final membership set and how it was anchored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub anchor: Anchor,
    /// Member ticket numbers, ascending.
    pub members: BTreeSet<u64>,
}

/// Classify the members of the group seeded by `seed`.
///
/// A seed missing from the store yields an empty membership.
pub fn resolve_members(store: &RelationshipStore, seed: u64) -> Membership {
    let Some(seed_node) = store.get(seed) else {
        return Membership {
            anchor: Anchor::Standalone,
            members: BTreeSet::new(),
        };
    };

    let (anchor, mut members) = if let Some(parent) = seed_node.parent_number {
        let mut siblings: BTreeSet<u64> = store
            .get(parent)
            .map(|node| {
                node.sub_issue_numbers
                    .iter()
                    .copied()
                    .filter(|&child| store.contains(child))
                    .collect()
            })
            .unwrap_or_default();
        siblings.insert(seed);
        (Anchor::Siblings { parent }, siblings)
    } else if seed_node.has_sub_issues() {
        let children: BTreeSet<u64> = seed_node
            .sub_issue_numbers
            .iter()
            .copied()
            .filter(|&child| store.contains(child))
            .collect();
        if children.is_empty() {
            (Anchor::EmptyContainer, BTreeSet::from([seed]))
        } else {
            (Anchor::Children, children)
        }
    } else {
        (Anchor::Standalone, BTreeSet::from([seed]))
    };

    debug!(?anchor, initial = members.len(), "membership anchored");

    close_over_dependencies(store, &mut members);

    Membership { anchor, members }
}

/// Fixed-point expansion of `members` along in-store dependency edges.
fn close_over_dependencies(store: &RelationshipStore, members: &mut BTreeSet<u64>) {
    // Every productive pass adds at least one store ticket.
    let max_passes = store.len() + 1;

    for pass in 0..max_passes {
        let snapshot: Vec<u64> = members.iter().copied().collect();
        let mut added = false;

        for member in snapshot {
            let Some(node) = store.get(member) else {
                continue;
            };

            for candidate in node.dependency_numbers() {
                if !store.contains(candidate) || members.contains(&candidate) {
                    continue;
                }
                if store.is_parent_of_any(candidate, members) {
                    trace!(
                        ticket = candidate,
                        via = member,
                        "container excluded from group despite dependency edge"
                    );
                    continue;
                }
                trace!(ticket = candidate, via = member, pass, "added through dependency");
                members.insert(candidate);
                added = true;
            }
        }

        if !added {
            break;
        }
    }
}
