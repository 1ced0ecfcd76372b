//! Integration tests for the full order pipeline.
//!
//! Tests: OrderService -> Repository -> ActivityLog -> EventBus -> subscriber
//!
//! Verifies:
//! - Writes recompute derived fields and land in the log and on the bus
//! - Tenant isolation is preserved
//! - Optimistic concurrency conflicts are detected
//! - List price changes reach orders through repricing

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    use printshop_core::{Money, TenantId};
    use printshop_events::{EventBus, EventEnvelope, InMemoryEventBus};
    use printshop_orders::{
        Color, CustomOrderId, DesignFile, OrderChanges, OrderDetails, OrderState, Size,
    };
    use printshop_parties::PartnerId;
    use printshop_products::ProductId;

    use crate::activity_log::InMemoryActivityLog;
    use crate::catalog::InMemoryProductCatalog;
    use crate::config::PrintshopConfig;
    use crate::directory::InMemoryCustomerDirectory;
    use crate::order_service::{NewOrder, OrderPorts, OrderService, ServiceError};
    use crate::repository::InMemoryOrderRepository;

    type Bus = Arc<InMemoryEventBus<EventEnvelope<serde_json::Value>>>;

    struct Shop {
        service: Arc<OrderService<Bus>>,
        catalog: Arc<InMemoryProductCatalog>,
        directory: Arc<InMemoryCustomerDirectory>,
        /// Envelopes seen by a background subscriber, per order.
        seen: Arc<Mutex<HashMap<CustomOrderId, Vec<(u64, String)>>>>,
    }

    fn setup(config: PrintshopConfig) -> anyhow::Result<Shop> {
        printshop_observability::init();

        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let catalog = Arc::new(InMemoryProductCatalog::new());
        let directory = Arc::new(InMemoryCustomerDirectory::new());

        let ports = OrderPorts {
            repository: Arc::new(InMemoryOrderRepository::new()),
            activity: Arc::new(InMemoryActivityLog::new()),
            sequences: Arc::new(config.sequence_generator()?),
            directory: directory.clone(),
            catalog: catalog.clone(),
        };
        let service = Arc::new(OrderService::new(config, ports, bus.clone()));

        // Subscribe before anything is published.
        let seen: Arc<Mutex<HashMap<CustomOrderId, Vec<(u64, String)>>>> = Arc::default();
        let sub = bus.subscribe();
        let sink = seen.clone();
        std::thread::spawn(move || {
            while let Ok(env) = sub.recv() {
                if let Ok(mut map) = sink.lock() {
                    map.entry(CustomOrderId::new(env.aggregate_id()))
                        .or_default()
                        .push((env.sequence_number(), env.event_type().to_string()));
                }
            }
        });

        Ok(Shop {
            service,
            catalog,
            directory,
            seen,
        })
    }

    fn customer_and_product(shop: &Shop, tenant_id: TenantId, price: Money) -> anyhow::Result<(PartnerId, ProductId)> {
        let customer = shop.directory.register(tenant_id, "Ada Lovelace", None, 1)?;
        let product = shop.catalog.create(tenant_id, "MUG-11OZ", "Mug 11oz", price)?;
        Ok((customer.id_typed(), product.id_typed()))
    }

    /// The subscriber thread handles envelopes asynchronously.
    fn wait_for_processing() {
        std::thread::sleep(std::time::Duration::from_millis(50));
    }

    #[test]
    fn order_lifecycle_is_logged_and_published_in_order() -> anyhow::Result<()> {
        let shop = setup(PrintshopConfig::default())?;
        let tenant_id = TenantId::new();
        let (customer, product) = customer_and_product(&shop, tenant_id, Money::from_major(12))?;

        let details = OrderDetails {
            custom_text: Some("Happy birthday".to_string()),
            color: Color::Custom,
            custom_color_code: Some("#FF5733".to_string()),
            size: Size::Large,
            ..OrderDetails::default()
        };
        let order = shop.service.create(tenant_id, NewOrder::new(customer, product, details))?;
        let id = order.id_typed();

        // 5 (text) + 10 (large); (12 + 15) * 1
        assert_eq!(order.customization_fee(), Money::from_major(15));
        assert_eq!(order.total_price(), Money::from_major(27));

        let upload = DesignFile::new("cake.png", vec![0x89, 0x50, 0x4e, 0x47]);
        let order = shop
            .service
            .update(tenant_id, id, OrderChanges::new().design_file(upload).quantity(3))?;
        // (12 + 25) * 3
        assert_eq!(order.total_price(), Money::from_major(111));

        shop.service.confirm(tenant_id, id)?;
        shop.service.start_production(tenant_id, id)?;
        shop.service.mark_done(tenant_id, id)?;

        let view = shop.service.get(tenant_id, id)?;
        assert_eq!(view.state, OrderState::Done);
        assert_eq!(view.state_label, "Done");
        assert!(view.available_transitions.is_empty());

        let history = shop.service.history(tenant_id, id)?;
        let states: Vec<(Option<String>, Option<String>)> = history
            .iter()
            .filter_map(|e| e.change_of("state"))
            .map(|c| (c.old.clone(), c.new.clone()))
            .collect();
        assert_eq!(
            states,
            vec![
                (Some("Draft".into()), Some("Confirmed".into())),
                (Some("Confirmed".into()), Some("In Production".into())),
                (Some("In Production".into()), Some("Done".into())),
            ]
        );

        wait_for_processing();
        let seen = shop.seen.lock().map_err(|_| anyhow::anyhow!("poisoned"))?;
        let numbers: Vec<u64> = seen[&id].iter().map(|(n, _)| *n).collect();
        assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        assert_eq!(seen[&id][0].1, "printing.order.created");

        Ok(())
    }

    #[test]
    fn tenant_isolation_preserved() -> anyhow::Result<()> {
        let shop = setup(PrintshopConfig::default())?;
        let tenant_a = TenantId::new();
        let tenant_b = TenantId::new();
        let (cust_a, prod_a) = customer_and_product(&shop, tenant_a, Money::from_major(10))?;
        let (cust_b, prod_b) = customer_and_product(&shop, tenant_b, Money::from_major(10))?;

        let a = shop.service.create(tenant_a, NewOrder::new(cust_a, prod_a, OrderDetails::default()))?;
        let b = shop.service.create(tenant_b, NewOrder::new(cust_b, prod_b, OrderDetails::default()))?;

        // Counters are per tenant.
        assert_eq!(a.reference(), "PRINT/001");
        assert_eq!(b.reference(), "PRINT/001");

        assert!(matches!(
            shop.service.get(tenant_b, a.id_typed()),
            Err(ServiceError::OrderNotFound(_))
        ));
        assert!(matches!(
            shop.service.confirm(tenant_b, a.id_typed()),
            Err(ServiceError::OrderNotFound(_))
        ));

        // A tenant cannot pick another tenant's customer.
        let err = shop
            .service
            .create(tenant_b, NewOrder::new(cust_a, prod_b, OrderDetails::default()))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Lookup(_)));

        assert_eq!(shop.service.list(tenant_a)?.len(), 1);
        assert_eq!(shop.service.list(tenant_b)?.len(), 1);
        Ok(())
    }

    #[test]
    fn concurrent_writers_never_lose_updates() -> anyhow::Result<()> {
        let shop = setup(PrintshopConfig::default())?;
        let tenant_id = TenantId::new();
        let (customer, product) = customer_and_product(&shop, tenant_id, Money::from_major(10))?;
        let id = shop
            .service
            .create(tenant_id, NewOrder::new(customer, product, OrderDetails::default()))?
            .id_typed();

        let handles: Vec<_> = (2..10)
            .map(|q| {
                let service = shop.service.clone();
                std::thread::spawn(move || service.update(tenant_id, id, OrderChanges::new().quantity(q)))
            })
            .collect();

        let mut committed = 0u64;
        for h in handles {
            match h.join().map_err(|_| anyhow::anyhow!("writer panicked"))? {
                Ok(_) => committed += 1,
                Err(ServiceError::Concurrency(_)) => {}
                Err(other) => return Err(other.into()),
            }
        }

        assert!(committed >= 1);
        let view = shop.service.get(tenant_id, id)?;
        assert_eq!(view.version, 1 + committed);
        assert_eq!(shop.service.history(tenant_id, id)?.len() as u64, view.version);
        // Whoever won, the total matches its quantity.
        assert_eq!(view.total_price, Money::from_major(15 * view.details.quantity));
        Ok(())
    }

    #[test]
    fn repricing_follows_list_price_changes() -> anyhow::Result<()> {
        let shop = setup(PrintshopConfig::default())?;
        let tenant_id = TenantId::new();
        let (customer, mug) = customer_and_product(&shop, tenant_id, Money::from_major(10))?;
        let cap = shop.catalog.create(tenant_id, "CAP-01", "Cap", Money::from_major(8))?.id_typed();

        let on_mug = shop.service.create(
            tenant_id,
            NewOrder::new(customer, mug, OrderDetails { quantity: 2, ..OrderDetails::default() }),
        )?;
        let on_cap = shop.service.create(tenant_id, NewOrder::new(customer, cap, OrderDetails::default()))?;

        shop.catalog.set_list_price(tenant_id, mug, Money::from_major(11))?;
        assert_eq!(shop.service.reprice_product(tenant_id, mug)?, 1);

        // (11 + 5) * 2
        assert_eq!(shop.service.get(tenant_id, on_mug.id_typed())?.total_price, Money::from_major(32));
        assert_eq!(shop.service.get(tenant_id, on_cap.id_typed())?.version, 1);

        let last = shop.service.history(tenant_id, on_mug.id_typed())?;
        let change = last.last().and_then(|e| e.change_of("total_price")).cloned();
        assert_eq!(change.and_then(|c| c.new), Some("32.00".to_string()));

        // Nothing moved: no new entries.
        assert_eq!(shop.service.reprice_product(tenant_id, mug)?, 0);
        assert_eq!(shop.service.history(tenant_id, on_mug.id_typed())?.len(), 2);
        Ok(())
    }

    #[test]
    fn list_returns_newest_first() -> anyhow::Result<()> {
        let shop = setup(PrintshopConfig::default())?;
        let tenant_id = TenantId::new();
        let (customer, product) = customer_and_product(&shop, tenant_id, Money::from_major(10))?;

        for _ in 0..3 {
            shop.service.create(tenant_id, NewOrder::new(customer, product, OrderDetails::default()))?;
        }

        let refs: Vec<String> = shop.service.list(tenant_id)?.into_iter().map(|v| v.reference).collect();
        assert_eq!(refs, vec!["PRINT/003", "PRINT/002", "PRINT/001"]);
        Ok(())
    }

    #[test]
    fn environment_drives_references_and_policy() -> anyhow::Result<()> {
        let env: HashMap<&str, &str> = [
            ("PRINTSHOP_SEQUENCE_PREFIX", "CO/"),
            ("PRINTSHOP_SEQUENCE_PADDING", "5"),
            ("PRINTSHOP_WORKFLOW_POLICY", "permissive"),
        ]
        .into_iter()
        .collect();
        let config = PrintshopConfig::from_lookup(|k| env.get(k).map(|v| v.to_string()))?;

        let shop = setup(config)?;
        let tenant_id = TenantId::new();
        let (customer, product) = customer_and_product(&shop, tenant_id, Money::from_major(10))?;
        let order = shop
            .service
            .create(tenant_id, NewOrder::new(customer, product, OrderDetails::default()))?;

        assert_eq!(order.reference(), "CO/00001");

        // Legacy behaviour: done is not terminal.
        shop.service.mark_done(tenant_id, order.id_typed())?;
        shop.service.reset_to_draft(tenant_id, order.id_typed())?;
        assert_eq!(shop.service.get(tenant_id, order.id_typed())?.state, OrderState::Draft);
        Ok(())
    }

    #[test]
    fn archived_customer_cannot_receive_new_orders() -> anyhow::Result<()> {
        let shop = setup(PrintshopConfig::default())?;
        let tenant_id = TenantId::new();
        let (customer, product) = customer_and_product(&shop, tenant_id, Money::from_major(10))?;
        let order = shop
            .service
            .create(tenant_id, NewOrder::new(customer, product, OrderDetails::default()))?;

        shop.directory.archive(tenant_id, customer)?;

        let err = shop.service.duplicate(tenant_id, order.id_typed()).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(shop.service.list(tenant_id)?.len(), 1);
        Ok(())
    }
}
