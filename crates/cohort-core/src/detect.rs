//! Group detection entry points.
//!
//! [`detect_group`] runs the whole pipeline against a
//! [`RelationshipSource`]. [`resolve_group`] is the synchronous second half,
//! usable on any already-closed [`RelationshipStore`].

use tracing::{debug, info, instrument};

use crate::error::GroupError;
use crate::graph::{MemberGraph, closure, resolve_members};
use crate::model::{GroupResult, TicketNode};
use crate::source::RelationshipSource;
use crate::store::RelationshipStore;

/// Discover and order the implementation group containing `seed`.
///
/// # Errors
///
/// - [`GroupError::SeedNotFound`] if the seed does not resolve.
/// - [`GroupError::Source`] if the seed fetch fails for another reason.
/// - [`GroupError::Cycle`] if blocking links among members form a cycle.
#[instrument(skip(source), fields(scope = source.scope()))]
pub async fn detect_group<S>(source: &S, seed: u64) -> Result<GroupResult, GroupError>
where
    S: RelationshipSource + ?Sized,
{
    let closure = closure::expand(source, seed).await?;
    let result = resolve_group(&closure.store, seed, closure.unresolved)?;

    info!(
        primary = result.primary.number,
        members = result.total_tickets,
        discovered = closure.store.len(),
        fetches = closure.fetches,
        "ticket group detected"
    );
    Ok(result)
}

/// Classify members of `seed`'s group in `store` and order them.
///
/// `unresolved` is carried into the result unchanged.
///
/// # Errors
///
/// Returns [`GroupError::Cycle`] if blocking links among members form a
/// cycle.
pub fn resolve_group(
    store: &RelationshipStore,
    seed: u64,
    unresolved: Vec<u64>,
) -> Result<GroupResult, GroupError> {
    let membership = resolve_members(store, seed);
    let graph = MemberGraph::build(store, &membership.members);
    debug!(
        seed,
        anchor = ?membership.anchor,
        members = graph.node_count(),
        edges = graph.edge_count(),
        "member graph built"
    );
    let order = graph.topological_order()?;

    let sorted: Vec<&TicketNode> = order.iter().filter_map(|&number| store.get(number)).collect();
    let fallback = store
        .get(seed)
        .cloned()
        .unwrap_or_else(|| TicketNode::new(seed));

    Ok(GroupResult::assemble(&sorted, &fallback, unresolved))
}
