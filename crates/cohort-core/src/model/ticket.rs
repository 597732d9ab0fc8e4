//! Ticket relationship node and its completeness-favoring merge rule.
//!
//! A [`TicketNode`] is everything known about one ticket's relationships at
//! a point in a detection run. The same ticket is routinely observed more
//! than once: first as a bare entry in someone else's snapshot (a sibling,
//! a child, a parent with only a partial child list), later directly with
//! full data. [`TicketNode::merge`] reconciles those observations.
//!
//! # Merge Rule
//!
//! Applied field by field:
//!
//! - **Relationship sets** (`sub_issue_numbers`, `blocking_numbers`,
//!   `blocked_by_numbers`): the incoming set replaces the stored one only
//!   when it has strictly more elements.
//! - **Parent**: adopted only while the stored parent is unknown.
//! - **Scalars** (`id`, `title`, `state`): filled the first time they are
//!   non-empty, never cleared.
//!
//! Nothing is last-write-wins, so the final node does not depend on the order
//! in which observations arrive.

#![allow(
    clippy::must_use_candidate,
    clippy::module_name_repetitions,
    clippy::missing_const_for_fn
)]

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// One discovered ticket and all of its known relationships.
///
/// Nodes never point at each other directly; every relationship is a ticket
/// number resolved through the [`RelationshipStore`].
///
/// [`RelationshipStore`]: crate::store::RelationshipStore
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketNode {
    /// Opaque stable identifier (distinct from the human-facing number).
    #[serde(default)]
    pub id: String,
    /// Human-facing number, unique within one tracker scope.
    pub number: u64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub state: String,
    /// Hierarchical parent, if known.
    #[serde(default, rename = "parent")]
    pub parent_number: Option<u64>,
    /// Hierarchical children.
    #[serde(default, rename = "sub_issues")]
    pub sub_issue_numbers: BTreeSet<u64>,
    /// Tickets this ticket blocks.
    #[serde(default, rename = "blocking")]
    pub blocking_numbers: BTreeSet<u64>,
    /// Tickets that block this ticket.
    #[serde(default, rename = "blocked_by")]
    pub blocked_by_numbers: BTreeSet<u64>,
}

impl TicketNode {
    /// Create a bare node that knows only its number.
    pub fn new(number: u64) -> Self {
        Self {
            number,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = state.into();
        self
    }

    #[must_use]
    pub fn with_parent(mut self, parent: u64) -> Self {
        self.parent_number = Some(parent);
        self
    }

    #[must_use]
    pub fn with_sub_issues(mut self, children: impl IntoIterator<Item = u64>) -> Self {
        self.sub_issue_numbers.extend(children);
        self
    }

    #[must_use]
    pub fn with_blocking(mut self, blocked: impl IntoIterator<Item = u64>) -> Self {
        self.blocking_numbers.extend(blocked);
        self
    }

    #[must_use]
    pub fn with_blocked_by(mut self, blockers: impl IntoIterator<Item = u64>) -> Self {
        self.blocked_by_numbers.extend(blockers);
        self
    }

    /// Every ticket number this node references through a dependency edge,
    /// in either direction, ascending.
    pub fn dependency_numbers(&self) -> BTreeSet<u64> {
        self.blocking_numbers
            .union(&self.blocked_by_numbers)
            .copied()
            .collect()
    }

    /// Returns `true` if the node declares at least one hierarchical child.
    pub fn has_sub_issues(&self) -> bool {
        !self.sub_issue_numbers.is_empty()
    }

    /// Merge another observation of the same ticket into `self`.
    ///
    /// The caller guarantees `incoming.number == self.number`; the number is
    /// the store key and is never rewritten here.
    pub fn merge(&mut self, incoming: Self) {
        debug_assert_eq!(self.number, incoming.number);

        fill_if_empty(&mut self.id, incoming.id);
        fill_if_empty(&mut self.title, incoming.title);
        fill_if_empty(&mut self.state, incoming.state);

        if self.parent_number.is_none() {
            self.parent_number = incoming.parent_number;
        }

        replace_if_larger(&mut self.sub_issue_numbers, incoming.sub_issue_numbers);
        replace_if_larger(&mut self.blocking_numbers, incoming.blocking_numbers);
        replace_if_larger(&mut self.blocked_by_numbers, incoming.blocked_by_numbers);
    }
}

fn fill_if_empty(stored: &mut String, incoming: String) {
    if stored.is_empty() && !incoming.is_empty() {
        *stored = incoming;
    }
}

fn replace_if_larger(stored: &mut BTreeSet<u64>, incoming: BTreeSet<u64>) {
    if incoming.len() > stored.len() {
        *stored = incoming;
    }
}
