//! Append-only activity log of committed order changes.
//!
//! Decoupled from the order record: the service appends one entry per
//! committed order event, carrying the tracked field changes.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryActivityLog;
pub use r#trait::{ActivityEntry, ActivityLog, ActivityLogError, NewActivity, ORDER_AGGREGATE_TYPE};
