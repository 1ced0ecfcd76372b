use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;
use uuid::Uuid;

use printshop_core::TenantId;
use printshop_events::{Event, EventEnvelope};
use printshop_orders::{CustomOrderId, FieldChange};

/// Aggregate type recorded on every order activity entry.
pub const ORDER_AGGREGATE_TYPE: &str = "printing.custom_order";

/// An entry ready to be appended (not yet assigned a sequence number).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewActivity {
    pub entry_id: Uuid,
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    /// Tracked field changes, old -> new, as displayed to users.
    pub changes: Vec<FieldChange>,
    /// The serialized order event.
    pub payload: JsonValue,
}

/// An appended entry of an order's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub entry_id: Uuid,
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,

    /// Position in the order's history, starting at 1. Equals the order
    /// version the entry's event produced.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub changes: Vec<FieldChange>,
    pub payload: JsonValue,
}

impl ActivityEntry {
    /// Convert an entry into a tenant-scoped envelope for publication.
    pub fn to_envelope(&self) -> EventEnvelope<JsonValue> {
        EventEnvelope::new(
            self.entry_id,
            self.tenant_id,
            self.order_id.0,
            ORDER_AGGREGATE_TYPE,
            self.sequence_number,
            self.event_type.clone(),
            self.occurred_at,
            self.payload.clone(),
        )
    }

    pub fn change_of(&self, field: &str) -> Option<&FieldChange> {
        self.changes.iter().find(|c| c.field == field)
    }
}

impl NewActivity {
    /// Build an entry from a typed order event and the changes it caused.
    pub fn from_typed<E>(
        tenant_id: TenantId,
        order_id: CustomOrderId,
        event: &E,
        changes: Vec<FieldChange>,
    ) -> Result<Self, ActivityLogError>
    where
        E: Event + Serialize,
    {
        let payload = serde_json::to_value(event)
            .map_err(|e| ActivityLogError::InvalidAppend(format!("payload serialization failed: {e}")))?;

        Ok(Self {
            entry_id: Uuid::now_v7(),
            tenant_id,
            order_id,
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            changes,
            payload,
        })
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ActivityLogError {
    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("activity log storage unavailable: {0}")]
    Storage(String),
}

/// Append-only, tenant-scoped history of order changes.
///
/// Entries are grouped per order and numbered 1, 2, 3, ... in commit order.
/// Nothing is ever rewritten or removed.
pub trait ActivityLog: Send + Sync {
    /// Append a batch for a single order. All or nothing.
    fn append(&self, entries: Vec<NewActivity>) -> Result<Vec<ActivityEntry>, ActivityLogError>;

    /// Full history of one order, oldest first.
    fn history(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<Vec<ActivityEntry>, ActivityLogError>;
}

impl<L> ActivityLog for Arc<L>
where
    L: ActivityLog + ?Sized,
{
    fn append(&self, entries: Vec<NewActivity>) -> Result<Vec<ActivityEntry>, ActivityLogError> {
        (**self).append(entries)
    }

    fn history(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<Vec<ActivityEntry>, ActivityLogError> {
        (**self).history(tenant_id, order_id)
    }
}
