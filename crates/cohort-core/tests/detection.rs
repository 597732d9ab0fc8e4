//! End-to-end group detection scenarios against an in-memory tracker.
//!
//! Each scenario builds a snapshot tracker, runs [`detect_group`] from a
//! seed, and checks membership, order, and the summary fields.

use async_trait::async_trait;
use cohort_core::source::snapshot::ForeignReason;
use cohort_core::source::{FetchShape, RelationshipSnapshot, SnapshotSource};
use cohort_core::{
    ErrorCode, GroupError, GroupResult, RelationshipSource, SourceError, TicketNode, detect_group,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn ticket(number: u64, title: &str) -> TicketNode {
    TicketNode::new(number)
        .with_id(format!("I_{number}"))
        .with_title(title)
        .with_state("open")
}

fn tracker(tickets: Vec<TicketNode>) -> SnapshotSource {
    SnapshotSource::from_tickets("acme/widgets", tickets).expect("valid tracker")
}

async fn detect(source: &SnapshotSource, seed: u64) -> GroupResult {
    detect_group(source, seed).await.expect("detection should succeed")
}

fn assert_blockers_first(result: &GroupResult, tickets: &[TicketNode]) {
    for node in tickets {
        let Some(blocked_order) = result.order_of(node.number) else {
            continue;
        };
        for &blocker in &node.blocked_by_numbers {
            if let Some(blocker_order) = result.order_of(blocker) {
                assert!(
                    blocker_order < blocked_order,
                    "#{blocker} must come before #{}",
                    node.number
                );
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Membership shapes
// ---------------------------------------------------------------------------

#[tokio::test]
async fn container_seed_groups_its_children() {
    let source = tracker(vec![
        ticket(10, "Epic").with_sub_issues([12, 11]),
        ticket(11, "X").with_parent(10),
        ticket(12, "Y").with_parent(10),
    ]);

    let result = detect(&source, 10).await;

    assert_eq!(result.ordered_numbers(), vec![11, 12]);
    assert!(result.is_group);
    assert_eq!(result.total_tickets, 2);
    assert_eq!(result.primary.number, 11);
    assert_eq!(result.primary.title, "X");
}

#[tokio::test]
async fn sibling_seed_orders_before_the_ticket_it_blocks() {
    let source = tracker(vec![
        ticket(1, "Parent").with_sub_issues([5, 6]),
        ticket(5, "S").with_parent(1).with_blocking([6]),
        ticket(6, "T").with_parent(1).with_blocked_by([5]),
    ]);

    let result = detect(&source, 5).await;

    assert_eq!(result.ordered_numbers(), vec![5, 6]);
    assert_eq!(result.order_of(5), Some(1));
    assert_eq!(result.order_of(6), Some(2));
    assert_eq!(result.order_of(1), None, "parent is a container");
}

#[tokio::test]
async fn blocked_sibling_seed_still_orders_after_its_blocker() {
    let source = tracker(vec![
        ticket(1, "Parent").with_sub_issues([2, 3]),
        ticket(2, "Blocked").with_parent(1).with_blocked_by([3]),
        ticket(3, "Blocker").with_parent(1).with_blocking([2]),
    ]);

    let result = detect(&source, 2).await;
    assert_eq!(result.ordered_numbers(), vec![3, 2]);
    assert_eq!(result.primary.number, 3);
}

#[tokio::test]
async fn standalone_ticket_is_a_group_of_one() {
    let source = tracker(vec![ticket(42, "Solo"), ticket(43, "Unrelated")]);

    let result = detect(&source, 42).await;

    assert_eq!(result.ordered_numbers(), vec![42]);
    assert!(!result.is_group);
    assert_eq!(result.total_tickets, 1);
    assert_eq!(result.primary.id, "I_42");
}

#[tokio::test]
async fn empty_container_degenerates_to_the_seed() {
    // Children are declared but live in another tracker.
    let source = tracker(vec![ticket(1, "Epic").with_sub_issues([70, 71])]);

    let result = detect(&source, 1).await;
    assert_eq!(result.ordered_numbers(), vec![1]);
    assert!(!result.is_group);
}

#[tokio::test]
async fn dependency_chain_pulls_in_standalone_tickets() {
    let tickets = vec![
        ticket(30, "Migrate").with_blocked_by([20]),
        ticket(20, "Schema").with_blocking([30]).with_blocked_by([10]),
        ticket(10, "Design").with_blocking([20]),
    ];
    let source = tracker(tickets.clone());

    let result = detect(&source, 30).await;

    assert_eq!(result.ordered_numbers(), vec![10, 20, 30]);
    assert_blockers_first(&result, &tickets);
    assert_eq!(source.fetch_count(FetchShape::Wide), 1);
    assert_eq!(source.fetch_count(FetchShape::Narrow), 2);
}

#[tokio::test]
async fn cross_hierarchy_dependency_joins_target_but_not_its_epic() {
    let tickets = vec![
        ticket(1, "Epic A").with_sub_issues([2, 3]),
        ticket(2, "A1").with_parent(1),
        ticket(3, "A2").with_parent(1).with_blocked_by([21]),
        ticket(20, "Epic B").with_sub_issues([21, 22]),
        ticket(21, "B1").with_parent(20).with_blocking([3]),
        ticket(22, "B2").with_parent(20),
    ];
    let source = tracker(tickets.clone());

    let result = detect(&source, 2).await;

    assert_eq!(result.ordered_numbers(), vec![2, 21, 3]);
    assert_blockers_first(&result, &tickets);
    assert_eq!(result.order_of(20), None);
    assert_eq!(result.order_of(22), None);
}

#[tokio::test]
async fn child_depending_on_its_parent_does_not_pull_parent_in() {
    let source = tracker(vec![
        ticket(1, "Epic").with_sub_issues([2, 3]).with_blocking([3]),
        ticket(2, "First").with_parent(1),
        ticket(3, "Second").with_parent(1).with_blocked_by([1]),
    ]);

    let result = detect(&source, 1).await;
    assert_eq!(result.ordered_numbers(), vec![2, 3]);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn three_ticket_cycle_is_fatal_and_named() {
    let source = tracker(vec![
        ticket(1, "A").with_blocked_by([2]),
        ticket(2, "B").with_blocked_by([3]),
        ticket(3, "C").with_blocked_by([1]),
    ]);

    let err = detect_group(&source, 1).await.expect_err("cycle");
    match err {
        GroupError::Cycle { unordered, cycles } => {
            assert_eq!(unordered, vec![1, 2, 3]);
            assert_eq!(cycles, vec![vec![1, 2, 3]]);
        }
        other => panic!("expected cycle error, got {other}"),
    }
}

#[tokio::test]
async fn missing_seed_is_fatal() {
    let source = tracker(vec![ticket(1, "Only")]);
    let err = detect_group(&source, 404).await.expect_err("missing seed");
    assert!(matches!(err, GroupError::SeedNotFound { number: 404, .. }));
    assert!(err.to_string().contains("acme/widgets"));
}

#[tokio::test]
async fn unreachable_dependencies_do_not_abort_detection() {
    let source = tracker(vec![
        ticket(1, "Local").with_blocked_by([900, 901]).with_blocking([2]),
        ticket(2, "Next").with_blocked_by([1]),
    ])
    .with_foreign(900, ForeignReason::CrossScope);

    let result = detect(&source, 1).await;

    assert_eq!(result.ordered_numbers(), vec![1, 2]);
    assert_eq!(result.unresolved, vec![900, 901]);
}

/// Tracker that only knows ticket 1 and fails every other request, either
/// with a transport error (even numbers) or a permission error (odd numbers).
struct FlakyTracker {
    seed: TicketNode,
}

#[async_trait]
impl RelationshipSource for FlakyTracker {
    fn scope(&self) -> &str {
        "acme/flaky"
    }

    async fn fetch_relationships(
        &self,
        number: u64,
        _shape: FetchShape,
    ) -> Result<RelationshipSnapshot, SourceError> {
        if number == self.seed.number {
            return Ok(RelationshipSnapshot::new(self.seed.clone()));
        }
        if number % 2 == 0 {
            Err(SourceError::Other {
                number,
                source: anyhow::anyhow!("connection reset"),
            })
        } else {
            Err(SourceError::AccessDenied { number })
        }
    }
}

#[tokio::test]
async fn transport_and_permission_failures_leave_dependencies_unresolved() {
    let source = FlakyTracker {
        seed: ticket(1, "Seed").with_blocked_by([2]).with_blocking([3]),
    };

    let result = detect_group(&source, 1).await.expect("detection should succeed");

    assert_eq!(result.ordered_numbers(), vec![1]);
    assert_eq!(result.unresolved, vec![2, 3]);
    assert!(!result.is_group);
}

#[tokio::test]
async fn seed_transport_failure_reports_seed_fetch_code() {
    let source = FlakyTracker {
        seed: ticket(1, "Seed"),
    };

    let err = detect_group(&source, 2).await.expect_err("seed fetch fails");

    assert!(matches!(err, GroupError::Source { number: 2, .. }));
    assert_eq!(err.error_code(), ErrorCode::SeedFetchFailed);
    assert_eq!(err.error_code().code(), "E5003");
}

// ---------------------------------------------------------------------------
// Determinism
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_runs_produce_identical_json() {
    let source = tracker(vec![
        ticket(1, "Epic").with_sub_issues([2, 3, 4, 5]),
        ticket(2, "a").with_parent(1).with_blocked_by([4]),
        ticket(3, "b").with_parent(1),
        ticket(4, "c").with_parent(1).with_blocking([2]),
        ticket(5, "d").with_parent(1).with_blocked_by([3]),
    ]);

    let first = serde_json::to_string(&detect(&source, 3).await).expect("serialize");
    let second = serde_json::to_string(&detect(&source, 3).await).expect("serialize");

    assert_eq!(first, second);
    let parsed: serde_json::Value = serde_json::from_str(&first).expect("valid json");
    let order: Vec<u64> = parsed["members"]
        .as_array()
        .expect("members array")
        .iter()
        .filter_map(|m| m["number"].as_u64())
        .collect();
    assert_eq!(order, vec![3, 4, 2, 5]);
}
