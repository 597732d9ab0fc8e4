//! A [`RelationshipSource`] backed by a JSON tracker snapshot.
//!
//! # File Format
//!
//! ```json
//! {
//!   "scope": "acme/widgets",
//!   "tickets": [
//!     { "id": "I_1", "number": 1, "title": "Epic", "state": "open",
//!       "sub_issues": [2, 3] },
//!     { "id": "I_2", "number": 2, "title": "Schema", "parent": 1,
//!       "blocking": [3] },
//!     { "id": "I_3", "number": 3, "title": "API", "parent": 1,
//!       "blocked_by": [2] }
//!   ],
//!   "foreign": [ { "number": 90, "reason": "cross_scope" } ]
//! }
//! ```
//!
//! Relationship lists may be omitted. `foreign` entries make fetches for
//! those numbers fail with [`SourceError::CrossScope`] or
//! [`SourceError::AccessDenied`]; any other unknown number is
//! [`SourceError::NotFound`].
//!
//! # Normalization
//!
//! Trackers report hierarchy from both ends, and exports are not always
//! consistent. On load, a child's `parent` and the parent's `sub_issues` are
//! reconciled so either side alone is enough. Dependency lists are reported
//! exactly as stored; detection treats an edge declared on either end as
//! present.

#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument};

use super::{FetchShape, RelationshipSnapshot, RelationshipSource, SourceError};
use crate::model::TicketNode;

/// Why a snapshot file could not be loaded.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to read snapshot {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("ticket #{0} appears more than once in the snapshot")]
    DuplicateTicket(u64),
}

/// How a number outside the tracker fails when fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForeignReason {
    CrossScope,
    AccessDenied,
}

/// A number referenced by the snapshot that lives outside its scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignTicket {
    pub number: u64,
    pub reason: ForeignReason,
}

/// On-disk snapshot document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotFile {
    #[serde(default)]
    pub scope: String,
    #[serde(default)]
    pub tickets: Vec<TicketNode>,
    #[serde(default)]
    pub foreign: Vec<ForeignTicket>,
}

/// In-memory tracker answering relationship fetches from a snapshot.
#[derive(Debug, Default)]
pub struct SnapshotSource {
    scope: String,
    tickets: BTreeMap<u64, TicketNode>,
    foreign: HashMap<u64, ForeignReason>,
    wide_fetches: AtomicUsize,
    narrow_fetches: AtomicUsize,
}

impl SnapshotSource {
    /// Build a source from tickets already in memory.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateTicket`] if two tickets share a number.
    pub fn from_tickets(
        scope: impl Into<String>,
        tickets: impl IntoIterator<Item = TicketNode>,
    ) -> Result<Self, SnapshotError> {
        Self::from_file(SnapshotFile {
            scope: scope.into(),
            tickets: tickets.into_iter().collect(),
            foreign: Vec::new(),
        })
    }

    /// Build a source from a parsed snapshot document.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateTicket`] if two tickets share a number.
    pub fn from_file(file: SnapshotFile) -> Result<Self, SnapshotError> {
        let mut tickets: BTreeMap<u64, TicketNode> = BTreeMap::new();
        for ticket in file.tickets {
            let number = ticket.number;
            if tickets.insert(number, ticket).is_some() {
                return Err(SnapshotError::DuplicateTicket(number));
            }
        }

        normalize_hierarchy(&mut tickets);

        let foreign = file
            .foreign
            .into_iter()
            .map(|entry| (entry.number, entry.reason))
            .collect();

        Ok(Self {
            scope: file.scope,
            tickets,
            foreign,
            ..Self::default()
        })
    }

    /// Parse a snapshot document from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Parse`] for malformed JSON and
    /// [`SnapshotError::DuplicateTicket`] for repeated numbers.
    pub fn from_json(json: &str) -> Result<Self, SnapshotError> {
        let file: SnapshotFile = serde_json::from_str(json)?;
        Self::from_file(file)
    }

    /// Load a snapshot document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::Io`] if the file cannot be read, otherwise
    /// the errors of [`SnapshotSource::from_json`].
    #[instrument]
    pub fn load(path: &Path) -> Result<Self, SnapshotError> {
        let content = std::fs::read_to_string(path).map_err(|source| SnapshotError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let source = Self::from_json(&content)?;
        debug!(tickets = source.tickets.len(), scope = %source.scope, "snapshot loaded");
        Ok(source)
    }

    /// Override the scope label reported in errors.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Mark `number` as belonging outside this tracker.
    #[must_use]
    pub fn with_foreign(mut self, number: u64, reason: ForeignReason) -> Self {
        self.foreign.insert(number, reason);
        self
    }

    pub fn ticket(&self, number: u64) -> Option<&TicketNode> {
        self.tickets.get(&number)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Number of fetches served so far with the given shape.
    pub fn fetch_count(&self, shape: FetchShape) -> usize {
        match shape {
            FetchShape::Wide => self.wide_fetches.load(Ordering::Relaxed),
            FetchShape::Narrow => self.narrow_fetches.load(Ordering::Relaxed),
        }
    }

    fn lookup(&self, number: u64) -> Result<&TicketNode, SourceError> {
        if let Some(reason) = self.foreign.get(&number) {
            return Err(match reason {
                ForeignReason::CrossScope => SourceError::CrossScope { number },
                ForeignReason::AccessDenied => SourceError::AccessDenied { number },
            });
        }
        self.tickets
            .get(&number)
            .ok_or(SourceError::NotFound { number })
    }

    fn assemble(&self, ticket: &TicketNode) -> RelationshipSnapshot {
        let parent = ticket
            .parent_number
            .and_then(|parent| self.tickets.get(&parent))
            .cloned();

        let siblings = parent
            .as_ref()
            .map(|parent| self.known_children(parent, Some(ticket.number)))
            .unwrap_or_default();

        RelationshipSnapshot {
            ticket: ticket.clone(),
            parent,
            siblings,
            children: self.known_children(ticket, None),
        }
    }

    fn known_children(&self, node: &TicketNode, skip: Option<u64>) -> Vec<TicketNode> {
        node.sub_issue_numbers
            .iter()
            .filter(|&&child| Some(child) != skip)
            .filter_map(|child| self.tickets.get(child))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl RelationshipSource for SnapshotSource {
    fn scope(&self) -> &str {
        &self.scope
    }

    async fn fetch_relationships(
        &self,
        number: u64,
        shape: FetchShape,
    ) -> Result<RelationshipSnapshot, SourceError> {
        match shape {
            FetchShape::Wide => self.wide_fetches.fetch_add(1, Ordering::Relaxed),
            FetchShape::Narrow => self.narrow_fetches.fetch_add(1, Ordering::Relaxed),
        };

        let ticket = self.lookup(number)?;
        Ok(self.assemble(ticket))
    }
}

/// Make `parent` and `sub_issues` agree for every ticket in the table.
fn normalize_hierarchy(tickets: &mut BTreeMap<u64, TicketNode>) {
    let declared_children: Vec<(u64, u64)> = tickets
        .values()
        .flat_map(|node| {
            node.sub_issue_numbers
                .iter()
                .map(move |&child| (node.number, child))
        })
        .collect();

    for (parent, child) in declared_children {
        if let Some(node) = tickets.get_mut(&child) {
            if node.parent_number.is_none() {
                node.parent_number = Some(parent);
            }
        }
    }

    let declared_parents: Vec<(u64, u64)> = tickets
        .values()
        .filter_map(|node| node.parent_number.map(|parent| (parent, node.number)))
        .collect();

    for (parent, child) in declared_parents {
        if let Some(node) = tickets.get_mut(&parent) {
            node.sub_issue_numbers.insert(child);
        }
    }
}
