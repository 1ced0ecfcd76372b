use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::RwLock;

use printshop_core::{AggregateRoot, ExpectedVersion, TenantId};
use printshop_orders::{CustomOrder, CustomOrderId};

use super::r#trait::{OrderRepository, RepositoryError};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct OrderKey {
    tenant_id: TenantId,
    order_id: CustomOrderId,
}

/// In-memory order repository.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryOrderRepository {
    orders: RwLock<HashMap<OrderKey, CustomOrder>>,
}

impl InMemoryOrderRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn key_of(order: &CustomOrder) -> Result<OrderKey, RepositoryError> {
        let tenant_id = order.tenant_id().ok_or_else(|| {
            RepositoryError::TenantIsolation(format!("order {} has no tenant", order.id_typed()))
        })?;
        Ok(OrderKey {
            tenant_id,
            order_id: order.id_typed(),
        })
    }
}

impl OrderRepository for InMemoryOrderRepository {
    fn insert(&self, order: CustomOrder) -> Result<(), RepositoryError> {
        let key = Self::key_of(&order)?;

        let mut orders = self
            .orders
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        if orders.contains_key(&key) {
            return Err(RepositoryError::AlreadyExists(key.order_id));
        }

        orders.insert(key, order);
        Ok(())
    }

    fn get(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<Option<CustomOrder>, RepositoryError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        Ok(orders.get(&OrderKey { tenant_id, order_id }).cloned())
    }

    fn update(&self, order: CustomOrder, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        let key = Self::key_of(&order)?;

        let mut orders = self
            .orders
            .write()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        let stored = orders
            .get_mut(&key)
            .ok_or(RepositoryError::NotFound(key.order_id))?;

        let current = stored.version();
        if !expected.matches(current) {
            return Err(RepositoryError::Concurrency(format!(
                "expected {expected:?}, found {current}"
            )));
        }

        if order.version() <= current {
            return Err(RepositoryError::Concurrency(format!(
                "update does not advance the version (stored {current}, given {})",
                order.version()
            )));
        }

        *stored = order;
        Ok(())
    }

    fn list(&self, tenant_id: TenantId) -> Result<Vec<CustomOrder>, RepositoryError> {
        let orders = self
            .orders
            .read()
            .map_err(|_| RepositoryError::Storage("lock poisoned".to_string()))?;

        let mut listed: Vec<CustomOrder> = orders
            .iter()
            .filter(|(k, _)| k.tenant_id == tenant_id)
            .map(|(_, o)| o.clone())
            .collect();

        // Ids are UUIDv7, so they break creation-time ties in creation order.
        listed.sort_by_key(|o| Reverse((o.created_at(), *o.id_typed().0.as_uuid())));
        Ok(listed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use printshop_core::{AggregateId, Money};
    use printshop_events::execute;
    use printshop_orders::{
        CreateCustomOrder, CustomOrderCommand, OrderChanges, OrderDetails, UpdateCustomOrder,
    };
    use printshop_parties::PartnerId;
    use printshop_products::ProductId;

    fn order_at(tenant_id: TenantId, reference: &str, at: chrono::DateTime<Utc>) -> CustomOrder {
        let order_id = CustomOrderId::new(AggregateId::new());
        let mut order = CustomOrder::empty(order_id);
        execute(
            &mut order,
            &CustomOrderCommand::CreateCustomOrder(CreateCustomOrder {
                tenant_id,
                order_id,
                reference: reference.to_string(),
                customer_id: PartnerId::new(AggregateId::new()),
                product_id: ProductId::new(AggregateId::new()),
                details: OrderDetails::default(),
                list_price: Money::from_major(10),
                occurred_at: at,
            }),
        )
        .unwrap();
        order
    }

    fn bump_quantity(order: &CustomOrder, quantity: i64) -> CustomOrder {
        let mut next = order.clone();
        let cmd = CustomOrderCommand::UpdateCustomOrder(UpdateCustomOrder {
            tenant_id: order.tenant_id().unwrap(),
            order_id: order.id_typed(),
            changes: OrderChanges::new().quantity(quantity),
            list_price: Money::from_major(10),
            occurred_at: Utc::now(),
        });
        execute(&mut next, &cmd).unwrap();
        next
    }

    #[test]
    fn insert_then_get() {
        let repo = InMemoryOrderRepository::new();
        let tenant_id = TenantId::new();
        let order = order_at(tenant_id, "PRINT/001", Utc::now());

        repo.insert(order.clone()).unwrap();

        assert_eq!(repo.get(tenant_id, order.id_typed()).unwrap(), Some(order.clone()));
        assert_eq!(repo.get(TenantId::new(), order.id_typed()).unwrap(), None);
    }

    #[test]
    fn double_insert_is_rejected() {
        let repo = InMemoryOrderRepository::new();
        let order = order_at(TenantId::new(), "PRINT/001", Utc::now());

        repo.insert(order.clone()).unwrap();
        assert_eq!(
            repo.insert(order.clone()).unwrap_err(),
            RepositoryError::AlreadyExists(order.id_typed())
        );
    }

    #[test]
    fn stale_update_is_rejected_and_leaves_store_untouched() {
        let repo = InMemoryOrderRepository::new();
        let tenant_id = TenantId::new();
        let order = order_at(tenant_id, "PRINT/001", Utc::now());
        repo.insert(order.clone()).unwrap();

        let first = bump_quantity(&order, 2);
        repo.update(first.clone(), ExpectedVersion::Exact(1)).unwrap();

        // Second writer started from version 1 as well.
        let second = bump_quantity(&order, 3);
        let err = repo.update(second, ExpectedVersion::Exact(1)).unwrap_err();

        assert!(matches!(err, RepositoryError::Concurrency(_)));
        assert_eq!(repo.get(tenant_id, order.id_typed()).unwrap(), Some(first));
    }

    #[test]
    fn update_of_unknown_order_is_not_found() {
        let repo = InMemoryOrderRepository::new();
        let order = order_at(TenantId::new(), "PRINT/001", Utc::now());
        let err = repo.update(order.clone(), ExpectedVersion::Any).unwrap_err();
        assert_eq!(err, RepositoryError::NotFound(order.id_typed()));
    }

    #[test]
    fn list_is_newest_first_and_tenant_scoped() {
        let repo = InMemoryOrderRepository::new();
        let tenant_id = TenantId::new();
        let now = Utc::now();

        repo.insert(order_at(tenant_id, "PRINT/001", now - Duration::minutes(2))).unwrap();
        repo.insert(order_at(tenant_id, "PRINT/003", now)).unwrap();
        repo.insert(order_at(tenant_id, "PRINT/002", now - Duration::minutes(1))).unwrap();
        repo.insert(order_at(TenantId::new(), "PRINT/001", now)).unwrap();

        let refs: Vec<String> = repo
            .list(tenant_id)
            .unwrap()
            .iter()
            .map(|o| o.reference().to_string())
            .collect();
        assert_eq!(refs, vec!["PRINT/003", "PRINT/002", "PRINT/001"]);
    }
}
