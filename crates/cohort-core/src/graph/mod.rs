//! Graph algorithms over ticket relationships.
//!
//! ## Pipeline
//!
//! ```text
//! seed number
//!        ↓  closure::expand()            (async, one fetch at a time)
//! Closure { store, expanded, unresolved }
//!        ↓  membership::resolve_members()
//! Membership { anchor, members }
//!        ↓  order::MemberGraph::build().topological_order()
//! ordered ticket numbers
//! ```
//!
//! ## Submodules
//!
//! - [`closure`] — FIFO frontier expansion with memoization on ticket number.
//! - [`membership`] — container exclusion and dependency fixed point.
//! - [`order`] — Kahn's algorithm with number tie-breaks and cycle reporting.

pub mod closure;
pub mod membership;
pub mod order;

pub use closure::{Closure, expand};
pub use membership::{Anchor, Membership, resolve_members};
pub use order::MemberGraph;
