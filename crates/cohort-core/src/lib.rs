#![forbid(unsafe_code)]
//! cohort-core library.
//!
//! Discovers every ticket transitively connected to a seed through
//! parent/sub-ticket and blocking/blocked-by links, decides which of them
//! form the implementation group, and orders the group so no ticket comes
//! before one that blocks it.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums for detection; `anyhow::Result` for
//!   configuration loading.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `debug!`, `trace!`).

pub mod config;
pub mod detect;
pub mod error;
pub mod graph;
pub mod model;
pub mod source;
pub mod store;

pub use detect::{detect_group, resolve_group};
pub use error::{ErrorCode, GroupError};
pub use model::{GroupMember, GroupResult, PrimaryTicket, TicketNode};
pub use source::{FetchShape, RelationshipSnapshot, RelationshipSource, SourceError};
pub use store::RelationshipStore;
