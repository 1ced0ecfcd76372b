//! Field-level change tracking for the activity log.

use serde::{Deserialize, Serialize};

use crate::order::CustomOrder;

/// One tracked field moving from `old` to `new` (display values).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Option<String>,
    pub new: Option<String>,
}

impl FieldChange {
    fn new(field: &str, old: Option<String>, new: Option<String>) -> Self {
        Self {
            field: field.to_string(),
            old,
            new,
        }
    }
}

impl core::fmt::Display for FieldChange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "{}: {} -> {}",
            self.field,
            self.old.as_deref().unwrap_or("-"),
            self.new.as_deref().unwrap_or("-")
        )
    }
}

/// Tracked fields that differ between two versions of the same order.
///
/// Tracked: customer, product, custom text, color, size, quantity, customization
/// fee, total price and state. Notes, design bytes and the custom colour code
/// are not tracked.
pub fn tracked_changes(before: &CustomOrder, after: &CustomOrder) -> Vec<FieldChange> {
    let mut changes = Vec::new();
    let mut track = |field: &str, old: Option<String>, new: Option<String>| {
        if old != new {
            changes.push(FieldChange::new(field, old, new));
        }
    };

    track(
        "customer_id",
        before.customer_id().map(|id| id.to_string()),
        after.customer_id().map(|id| id.to_string()),
    );
    track(
        "product_id",
        before.product_id().map(|id| id.to_string()),
        after.product_id().map(|id| id.to_string()),
    );
    track(
        "custom_text",
        before.custom_text().map(str::to_string),
        after.custom_text().map(str::to_string),
    );
    track(
        "color",
        Some(before.color().label().to_string()),
        Some(after.color().label().to_string()),
    );
    track(
        "size",
        Some(before.size().label().to_string()),
        Some(after.size().label().to_string()),
    );
    track(
        "quantity",
        Some(before.quantity().to_string()),
        Some(after.quantity().to_string()),
    );
    track(
        "customization_fee",
        Some(before.customization_fee().to_string()),
        Some(after.customization_fee().to_string()),
    );
    track(
        "total_price",
        Some(before.total_price().to_string()),
        Some(after.total_price().to_string()),
    );
    track(
        "state",
        Some(before.state().label().to_string()),
        Some(after.state().label().to_string()),
    );

    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::Size;
    use crate::order::{
        CreateCustomOrder, CustomOrderCommand, CustomOrderId, OrderChanges, OrderDetails,
        TransitionOrder, UpdateCustomOrder,
    };
    use crate::workflow::{Transition, WorkflowPolicy};
    use chrono::Utc;
    use printshop_core::{AggregateId, Money, TenantId};
    use printshop_events::execute;
    use printshop_parties::PartnerId;
    use printshop_products::ProductId;

    fn created(tenant_id: TenantId) -> CustomOrder {
        let order_id = CustomOrderId::new(AggregateId::new());
        let mut order = CustomOrder::empty(order_id);
        let cmd = CustomOrderCommand::CreateCustomOrder(CreateCustomOrder {
            tenant_id,
            order_id,
            reference: "PRINT/007".to_string(),
            customer_id: PartnerId::new(AggregateId::new()),
            product_id: ProductId::new(AggregateId::new()),
            details: OrderDetails::default(),
            list_price: Money::from_major(20),
            occurred_at: Utc::now(),
        });
        execute(&mut order, &cmd).unwrap();
        order
    }

    #[test]
    fn size_change_tracks_size_fee_and_total() {
        let tenant_id = TenantId::new();
        let before = created(tenant_id);
        let mut after = before.clone();
        let cmd = CustomOrderCommand::UpdateCustomOrder(UpdateCustomOrder {
            tenant_id,
            order_id: before.id_typed(),
            changes: OrderChanges::new().size(Size::Large),
            list_price: Money::from_major(20),
            occurred_at: Utc::now(),
        });
        execute(&mut after, &cmd).unwrap();

        let changes = tracked_changes(&before, &after);
        let fields: Vec<&str> = changes.iter().map(|c| c.field.as_str()).collect();
        assert_eq!(fields, vec!["size", "customization_fee", "total_price"]);
        assert_eq!(changes[0].to_string(), "size: Medium -> Large");
        assert_eq!(changes[2].old.as_deref(), Some("25.00"));
        assert_eq!(changes[2].new.as_deref(), Some("30.00"));
    }

    #[test]
    fn notes_are_not_tracked() {
        let tenant_id = TenantId::new();
        let before = created(tenant_id);
        let mut after = before.clone();
        let cmd = CustomOrderCommand::UpdateCustomOrder(UpdateCustomOrder {
            tenant_id,
            order_id: before.id_typed(),
            changes: OrderChanges::new().notes("rush"),
            list_price: Money::from_major(20),
            occurred_at: Utc::now(),
        });
        execute(&mut after, &cmd).unwrap();

        assert!(tracked_changes(&before, &after).is_empty());
    }

    #[test]
    fn state_change_uses_labels() {
        let tenant_id = TenantId::new();
        let before = created(tenant_id);
        let mut after = before.clone();
        let cmd = CustomOrderCommand::TransitionOrder(TransitionOrder {
            tenant_id,
            order_id: before.id_typed(),
            transition: Transition::Confirm,
            policy: WorkflowPolicy::Strict,
            occurred_at: Utc::now(),
        });
        execute(&mut after, &cmd).unwrap();

        assert_eq!(
            tracked_changes(&before, &after),
            vec![FieldChange::new("state", Some("Draft".into()), Some("Confirmed".into()))]
        );
    }
}
