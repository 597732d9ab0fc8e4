//! The relationship data source consumed by closure expansion.
//!
//! # Contract
//!
//! A [`RelationshipSource`] answers one question: "what are the relationships
//! of ticket N?" The answer is a [`RelationshipSnapshot`] holding the ticket,
//! its parent (whose `sub_issue_numbers` list the siblings), the siblings,
//! and the ticket's own children. Each sibling and child carries its own
//! blocking/blocked-by lists.
//!
//! Detection issues two request shapes. [`FetchShape::Wide`] is used once,
//! for the seed, and front-loads the one-hop neighborhood.
//! [`FetchShape::Narrow`] is used for every frontier item. Both return the
//! same structure; a source may use the shape to trim its queries.
//!
//! Paging, authentication, retry and rate limiting belong to the source.
//! Detection awaits one fetch at a time and never fans out.
//!
//! # Implementations
//!
//! - [`snapshot::SnapshotSource`] — a JSON tracker snapshot loaded from disk.

pub mod snapshot;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::TicketNode;

pub use snapshot::{SnapshotError, SnapshotSource};

/// Which request shape detection is issuing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FetchShape {
    /// Seed request: parent, siblings, children, and direct dependencies.
    Wide,
    /// Frontier request for a ticket discovered through a dependency edge.
    Narrow,
}

/// Relationships of one ticket as reported by a source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelationshipSnapshot {
    /// The requested ticket with its direct dependency lists.
    pub ticket: TicketNode,
    /// Hierarchical parent; its `sub_issue_numbers` are the declared siblings.
    pub parent: Option<TicketNode>,
    /// The parent's other children, each with dependency lists.
    pub siblings: Vec<TicketNode>,
    /// The ticket's own children, each with dependency lists.
    pub children: Vec<TicketNode>,
}

impl RelationshipSnapshot {
    pub fn new(ticket: TicketNode) -> Self {
        Self {
            ticket,
            ..Self::default()
        }
    }

    /// Flatten into store observations, filling in the hierarchy links the
    /// snapshot structure implies but individual nodes may omit.
    ///
    /// The ticket comes first, then the parent, siblings, and children.
    #[must_use]
    pub fn into_nodes(self) -> Vec<TicketNode> {
        let Self {
            mut ticket,
            parent,
            siblings,
            children,
        } = self;

        let mut nodes = Vec::with_capacity(2 + siblings.len() + children.len());

        ticket
            .sub_issue_numbers
            .extend(children.iter().map(|child| child.number));

        let parent = parent.map(|mut parent| {
            if ticket.parent_number.is_none() {
                ticket.parent_number = Some(parent.number);
            }
            parent.sub_issue_numbers.insert(ticket.number);
            parent
                .sub_issue_numbers
                .extend(siblings.iter().map(|sibling| sibling.number));
            parent
        });

        let parent_number = parent.as_ref().map(|p| p.number);
        let ticket_number = ticket.number;

        nodes.push(ticket);
        nodes.extend(parent);
        nodes.extend(siblings.into_iter().map(|mut sibling| {
            if sibling.parent_number.is_none() {
                sibling.parent_number = parent_number;
            }
            sibling
        }));
        nodes.extend(children.into_iter().map(|mut child| {
            if child.parent_number.is_none() {
                child.parent_number = Some(ticket_number);
            }
            child
        }));

        nodes
    }
}

/// Why a source could not produce a snapshot.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The ticket does not exist in this tracker scope (or was deleted).
    #[error("ticket #{number} not found")]
    NotFound { number: u64 },

    /// The number refers to a ticket in a different tracker instance.
    #[error("ticket #{number} belongs to a different tracker scope")]
    CrossScope { number: u64 },

    /// The caller may not read the ticket.
    #[error("access to ticket #{number} denied")]
    AccessDenied { number: u64 },

    /// Transport or decoding failure inside the source.
    #[error("failed to fetch ticket #{number}: {source}")]
    Other {
        number: u64,
        #[source]
        source: anyhow::Error,
    },
}

impl SourceError {
    /// The ticket number the failed request was for.
    #[must_use]
    pub const fn number(&self) -> u64 {
        match self {
            Self::NotFound { number }
            | Self::CrossScope { number }
            | Self::AccessDenied { number }
            | Self::Other { number, .. } => *number,
        }
    }

    /// Short machine-friendly reason label used in logs.
    #[must_use]
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::CrossScope { .. } => "cross_scope",
            Self::AccessDenied { .. } => "access_denied",
            Self::Other { .. } => "fetch_failed",
        }
    }
}

/// Capability to fetch a ticket's relationship snapshot.
#[async_trait]
pub trait RelationshipSource: Send + Sync {
    /// Tracker scope label (for example `owner/repo`) used in error messages.
    fn scope(&self) -> &str;

    /// Fetch the relationships of ticket `number`.
    async fn fetch_relationships(
        &self,
        number: u64,
        shape: FetchShape,
    ) -> Result<RelationshipSnapshot, SourceError>;
}
