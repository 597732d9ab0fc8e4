//! Ticket and group data types.
//!
//! - [`ticket`] — [`TicketNode`] and the completeness-favoring merge rule.
//! - [`group`] — the ordered [`GroupResult`] returned by detection.

pub mod group;
pub mod ticket;

pub use group::{GroupMember, GroupResult, PrimaryTicket};
pub use ticket::TicketNode;
