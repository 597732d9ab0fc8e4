//! Transitive closure over hierarchy and dependency edges.
//!
//! # Algorithm
//!
//! 1. Fetch the seed with [`FetchShape::Wide`] and upsert the whole snapshot
//!    (ticket, parent, siblings, children) as one batch.
//! 2. Push every dependency number referenced by the batch that is neither
//!    in the store nor already seen onto a FIFO frontier.
//! 3. Pop numbers until the frontier is empty. Each popped number is fetched
//!    with [`FetchShape::Narrow`], upserted, and its newly referenced
//!    dependency numbers are pushed.
//!
//! Every push is guarded by the seen set, so a number is popped at most once,
//! the frontier is finite, and the loop terminates for any finite graph,
//! cycles included.
//!
//! # Failures
//!
//! Only the seed fetch can fail the expansion. A frontier fetch that fails
//! for any reason is logged, recorded in [`Closure::unresolved`], and never
//! retried within the run.
//!
//! Fetches are awaited strictly one at a time so the source's own
//! rate-limiting policy is never contended.

#![allow(clippy::module_name_repetitions, clippy::must_use_candidate)]

use std::collections::{HashSet, VecDeque};

use tracing::{debug, instrument, warn};

use crate::error::GroupError;
use crate::model::TicketNode;
use crate::source::{FetchShape, RelationshipSource, SourceError};
use crate::store::RelationshipStore;

/// Result of closure expansion from one seed.
#[derive(Debug, Clone, Default)]
pub struct Closure {
    /// Every ticket discovered, merged.
    pub store: RelationshipStore,
    /// Tickets whose own snapshot was fetched (the seed included).
    pub expanded: HashSet<u64>,
    /// Frontier tickets that could not be fetched, in attempt order.
    pub unresolved: Vec<u64>,
    /// Number of fetches issued, failed ones included.
    pub fetches: usize,
}

impl Closure {
    #[cfg(test)]
    pub(crate) fn is_expanded(&self, number: u64) -> bool {
        self.expanded.contains(&number)
    }
}

/// Worklist state for one expansion run.
struct Expander {
    closure: Closure,
    frontier: VecDeque<u64>,
    seen: HashSet<u64>,
}

impl Expander {
    fn new() -> Self {
        Self {
            closure: Closure::default(),
            frontier: VecDeque::new(),
            seen: HashSet::new(),
        }
    }

    /// Upsert a fetched batch and enqueue the dependency numbers it reveals.
    fn absorb(&mut self, nodes: Vec<TicketNode>) {
        let referenced: Vec<u64> = nodes
            .iter()
            .flat_map(TicketNode::dependency_numbers)
            .collect();

        self.closure.store.upsert_all(nodes);

        for number in referenced {
            if self.closure.store.contains(number) || !self.seen.insert(number) {
                continue;
            }
            debug!(ticket = number, "queued dependency for expansion");
            self.frontier.push_back(number);
        }
    }
}

/// Grow a [`RelationshipStore`] to the full closure reachable from `seed`.
///
/// # Errors
///
/// Returns [`GroupError::SeedNotFound`] if the seed does not resolve, or
/// [`GroupError::Source`] if the seed fetch fails for another reason.
#[instrument(skip(source), fields(scope = source.scope()))]
pub async fn expand<S>(source: &S, seed: u64) -> Result<Closure, GroupError>
where
    S: RelationshipSource + ?Sized,
{
    let mut expander = Expander::new();

    expander.closure.fetches += 1;
    let snapshot = source
        .fetch_relationships(seed, FetchShape::Wide)
        .await
        .map_err(|err| seed_error(source, seed, err))?;

    expander.seen.insert(seed);
    expander.closure.expanded.insert(seed);
    expander.absorb(snapshot.into_nodes());

    while let Some(number) = expander.frontier.pop_front() {
        expander.closure.fetches += 1;
        match source.fetch_relationships(number, FetchShape::Narrow).await {
            Ok(snapshot) => {
                expander.closure.expanded.insert(number);
                expander.absorb(snapshot.into_nodes());
            }
            Err(err) => {
                warn!(
                    ticket = number,
                    reason = err.reason(),
                    error = %err,
                    "skipping ticket that could not be fetched"
                );
                expander.closure.unresolved.push(number);
            }
        }
    }

    let closure = expander.closure;
    debug!(
        tickets = closure.store.len(),
        expanded = closure.expanded.len(),
        fetches = closure.fetches,
        unresolved = closure.unresolved.len(),
        "closure complete"
    );
    Ok(closure)
}

fn seed_error<S>(source: &S, seed: u64, err: SourceError) -> GroupError
where
    S: RelationshipSource + ?Sized,
{
    let scope = source.scope().to_string();
    match err {
        SourceError::NotFound { .. } => GroupError::SeedNotFound {
            number: seed,
            scope,
        },
        other => GroupError::Source {
            number: seed,
            scope,
            source: other,
        },
    }
}
