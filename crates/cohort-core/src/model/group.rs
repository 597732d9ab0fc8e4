//! Detection result types.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use serde::{Deserialize, Serialize};

use super::ticket::TicketNode;

/// One ticket in the implementation group, with its 1-based position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    pub id: String,
    pub number: u64,
    pub title: String,
    pub state: String,
    /// 1-based implementation position.
    pub order: usize,
}

impl GroupMember {
    fn from_node(node: &TicketNode, order: usize) -> Self {
        Self {
            id: node.id.clone(),
            number: node.number,
            title: node.title.clone(),
            state: node.state.clone(),
            order,
        }
    }
}

/// The representative ticket of a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryTicket {
    pub id: String,
    pub number: u64,
    pub title: String,
}

impl PrimaryTicket {
    fn from_node(node: &TicketNode) -> Self {
        Self {
            id: node.id.clone(),
            number: node.number,
            title: node.title.clone(),
        }
    }
}

/// Ordered implementation group discovered from one seed ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupResult {
    pub members: Vec<GroupMember>,
    pub primary: PrimaryTicket,
    pub is_group: bool,
    pub total_tickets: usize,
    /// Tickets referenced during expansion that could not be fetched.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<u64>,
}

impl GroupResult {
    /// Assemble the result from topologically sorted member nodes.
    ///
    /// `seed` is the fallback primary when `sorted` is empty.
    pub(crate) fn assemble(sorted: &[&TicketNode], seed: &TicketNode, unresolved: Vec<u64>) -> Self {
        let members: Vec<GroupMember> = sorted
            .iter()
            .enumerate()
            .map(|(idx, node)| GroupMember::from_node(node, idx + 1))
            .collect();

        let primary = sorted
            .first()
            .map_or_else(|| PrimaryTicket::from_node(seed), |node| PrimaryTicket::from_node(node));

        Self {
            is_group: members.len() > 1,
            total_tickets: members.len(),
            members,
            primary,
            unresolved,
        }
    }

    /// Member numbers in implementation order.
    pub fn ordered_numbers(&self) -> Vec<u64> {
        self.members.iter().map(|m| m.number).collect()
    }

    /// Position of `number` in the group, if it is a member.
    pub fn order_of(&self, number: u64) -> Option<usize> {
        self.members
            .iter()
            .find(|m| m.number == number)
            .map(|m| m.order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assemble_numbers_members_from_one() {
        let a = TicketNode::new(3).with_id("I_3").with_title("First");
        let b = TicketNode::new(8).with_id("I_8").with_title("Second");
        let result = GroupResult::assemble(&[&a, &b], &a, Vec::new());

        assert_eq!(result.ordered_numbers(), vec![3, 8]);
        assert_eq!(result.order_of(8), Some(2));
        assert_eq!(result.primary.number, 3);
        assert!(result.is_group);
        assert_eq!(result.total_tickets, 2);
    }

    #[test]
    fn empty_membership_falls_back_to_seed() {
        let seed = TicketNode::new(42).with_id("I_42").with_title("Seed");
        let result = GroupResult::assemble(&[], &seed, Vec::new());

        assert!(result.members.is_empty());
        assert_eq!(result.primary.number, 42);
        assert_eq!(result.primary.id, "I_42");
        assert!(!result.is_group);
        assert_eq!(result.total_tickets, 0);
    }

    #[test]
    fn serializes_with_camel_case_summary_fields() {
        let seed = TicketNode::new(1).with_id("I_1").with_title("Only").with_state("open");
        let result = GroupResult::assemble(&[&seed], &seed, Vec::new());
        let json = serde_json::to_value(&result).expect("serialize");

        assert_eq!(json["isGroup"], false);
        assert_eq!(json["totalTickets"], 1);
        assert_eq!(json["members"][0]["order"], 1);
        assert_eq!(json["primary"]["title"], "Only");
        assert!(json.get("unresolved").is_none());
    }
}
