use std::collections::HashMap;
use std::sync::RwLock;

use printshop_core::TenantId;
use printshop_orders::CustomOrderId;

use super::r#trait::{ActivityEntry, ActivityLog, ActivityLogError, NewActivity};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct HistoryKey {
    tenant_id: TenantId,
    order_id: CustomOrderId,
}

/// In-memory append-only activity log.
///
/// Intended for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryActivityLog {
    histories: RwLock<HashMap<HistoryKey, Vec<ActivityEntry>>>,
}

impl InMemoryActivityLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivityLog for InMemoryActivityLog {
    fn append(&self, entries: Vec<NewActivity>) -> Result<Vec<ActivityEntry>, ActivityLogError> {
        if entries.is_empty() {
            return Ok(vec![]);
        }

        let tenant_id = entries[0].tenant_id;
        let order_id = entries[0].order_id;

        for (idx, e) in entries.iter().enumerate() {
            if e.tenant_id != tenant_id {
                return Err(ActivityLogError::TenantIsolation(format!(
                    "batch contains multiple tenant_ids (index {idx})"
                )));
            }
            if e.order_id != order_id {
                return Err(ActivityLogError::InvalidAppend(format!(
                    "batch contains multiple order_ids (index {idx})"
                )));
            }
        }

        let mut histories = self
            .histories
            .write()
            .map_err(|_| ActivityLogError::Storage("lock poisoned".to_string()))?;

        let history = histories.entry(HistoryKey { tenant_id, order_id }).or_default();
        let mut next = history.last().map(|e| e.sequence_number).unwrap_or(0);

        let mut appended = Vec::with_capacity(entries.len());
        for e in entries {
            next += 1;
            appended.push(ActivityEntry {
                entry_id: e.entry_id,
                tenant_id: e.tenant_id,
                order_id: e.order_id,
                sequence_number: next,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                changes: e.changes,
                payload: e.payload,
            });
        }

        history.extend(appended.iter().cloned());
        Ok(appended)
    }

    fn history(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<Vec<ActivityEntry>, ActivityLogError> {
        let histories = self
            .histories
            .read()
            .map_err(|_| ActivityLogError::Storage("lock poisoned".to_string()))?;

        Ok(histories
            .get(&HistoryKey { tenant_id, order_id })
            .cloned()
            .unwrap_or_default())
    }
}
