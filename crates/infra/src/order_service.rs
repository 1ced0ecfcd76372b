//! Custom order write/read pipeline.
//!
//! Every write goes through the same commit path:
//!
//! ```text
//! request
//!   -> resolve collaborators (customer eligibility, live list price)
//!   -> decide events on the order aggregate (validation + recompute)
//!   -> apply events, tracking field changes
//!   -> repository commit (optimistic version check)
//!   -> activity log append
//!   -> publish envelopes on the bus
//! ```
//!
//! A write rejected before the repository commit leaves nothing behind. For
//! creation the order reference is drawn only once validation and lookups have
//! succeeded, so a rejected creation never consumes a sequence number.
//!
//! Once the repository accepts the commit the write stands: a failing activity
//! log append or bus publication is logged and the committed order is still
//! returned.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use printshop_core::{Aggregate, AggregateId, AggregateRoot, DomainError, ExpectedVersion, Money, TenantId};
use printshop_events::{EventBus, EventEnvelope};
use printshop_orders::{
    CreateCustomOrder, CustomOrder, CustomOrderCommand, CustomOrderEvent, CustomOrderId,
    NEW_REFERENCE, OrderChanges, OrderDetails, OrderState, RefreshTotalPrice, Transition,
    TransitionOrder, UpdateCustomOrder, WorkflowPolicy, tracked_changes, validation,
};
use printshop_parties::PartnerId;
use printshop_products::ProductId;

use crate::activity_log::{ActivityEntry, ActivityLog, ActivityLogError, NewActivity};
use crate::catalog::ProductCatalog;
use crate::config::PrintshopConfig;
use crate::directory::CustomerDirectory;
use crate::lookup::LookupError;
use crate::repository::{OrderRepository, RepositoryError};
use crate::sequence::{SequenceError, SequenceGenerator};

/// Message of the validation failure raised for ineligible customers.
pub const CUSTOMER_NOT_ELIGIBLE: &str = "Selected partner is not an eligible customer!";

#[derive(Debug, Error)]
pub enum ServiceError {
    /// A write was rejected by a validation rule. Displays the bare message.
    #[error("{0}")]
    Validation(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("order not found: {0}")]
    OrderNotFound(CustomOrderId),

    /// Stale write or duplicate creation.
    #[error("concurrency conflict: {0}")]
    Concurrency(String),

    /// Directory/catalog failures, propagated unchanged.
    #[error(transparent)]
    Lookup(#[from] LookupError),

    #[error(transparent)]
    Repository(RepositoryError),

    #[error(transparent)]
    ActivityLog(#[from] ActivityLogError),

    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvalidTransition(msg) => ServiceError::InvalidTransition(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::Conflict(msg) => ServiceError::Concurrency(msg),
            DomainError::NotFound => ServiceError::InvariantViolation("order is not created".to_string()),
        }
    }
}

impl From<RepositoryError> for ServiceError {
    fn from(value: RepositoryError) -> Self {
        match value {
            RepositoryError::Concurrency(msg) => ServiceError::Concurrency(msg),
            RepositoryError::AlreadyExists(id) => ServiceError::Concurrency(format!("order already exists: {id}")),
            RepositoryError::NotFound(id) => ServiceError::OrderNotFound(id),
            other => ServiceError::Repository(other),
        }
    }
}

/// Input of [`OrderService::create`].
///
/// A missing reference, or the `"New"` placeholder, asks the sequence
/// generator for the next one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    #[serde(default)]
    pub reference: Option<String>,
    pub customer_id: PartnerId,
    pub product_id: ProductId,
    #[serde(default)]
    pub details: OrderDetails,
}

impl NewOrder {
    pub fn new(customer_id: PartnerId, product_id: ProductId, details: OrderDetails) -> Self {
        Self {
            reference: None,
            customer_id,
            product_id,
            details,
        }
    }

    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// Read view of an order: persisted fields plus the live base price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderView {
    pub id: CustomOrderId,
    pub reference: String,
    pub customer_id: Option<PartnerId>,
    pub product_id: Option<ProductId>,
    pub details: OrderDetails,
    /// Product list price at read time (not snapshotted).
    pub base_price: Money,
    pub customization_fee: Money,
    pub total_price: Money,
    pub state: OrderState,
    pub state_label: String,
    /// Workflow operations the current policy accepts from `state`.
    pub available_transitions: Vec<Transition>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    pub version: u64,
}

/// Collaborators of the order service.
#[derive(Clone)]
pub struct OrderPorts {
    pub repository: Arc<dyn OrderRepository>,
    pub activity: Arc<dyn ActivityLog>,
    pub sequences: Arc<dyn SequenceGenerator>,
    pub directory: Arc<dyn CustomerDirectory>,
    pub catalog: Arc<dyn ProductCatalog>,
}

/// Application service for custom orders.
///
/// Tenant-aware: every operation is scoped to the given tenant.
pub struct OrderService<B> {
    ports: OrderPorts,
    bus: B,
    config: PrintshopConfig,
}

impl<B> OrderService<B> {
    pub fn new(config: PrintshopConfig, ports: OrderPorts, bus: B) -> Self {
        Self { ports, bus, config }
    }

    pub fn config(&self) -> &PrintshopConfig {
        &self.config
    }

    pub fn policy(&self) -> WorkflowPolicy {
        self.config.workflow_policy
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B> OrderService<B>
where
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Create a draft order with its fee and total computed.
    pub fn create(&self, tenant_id: TenantId, request: NewOrder) -> Result<CustomOrder, ServiceError> {
        validation::check_fields(request.details.quantity, request.details.custom_text.as_deref())
            .inspect_err(|e| tracing::warn!("rejected custom order creation: {}", e))?;

        self.ensure_customer(tenant_id, request.customer_id)?;
        let list_price = self.ports.catalog.list_price(tenant_id, request.product_id)?;

        let reference = match request.reference {
            Some(r) if !r.trim().is_empty() && r != NEW_REFERENCE => r,
            _ => self.next_reference(tenant_id)?,
        };

        let order_id = CustomOrderId::new(AggregateId::new());
        let mut order = CustomOrder::empty(order_id);
        let command = CustomOrderCommand::CreateCustomOrder(CreateCustomOrder {
            tenant_id,
            order_id,
            reference,
            customer_id: request.customer_id,
            product_id: request.product_id,
            details: request.details,
            list_price,
            occurred_at: Utc::now(),
        });

        let decided = order.handle(&command)?;
        let entries = track(tenant_id, &mut order, &decided)?;

        self.ports.repository.insert(order.clone())?;
        self.record(entries);

        tracing::info!(
            "created custom order {} ({}) for tenant {}: total {}",
            order.reference(),
            order_id,
            tenant_id,
            order.total_price()
        );

        Ok(order)
    }

    pub fn get(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<OrderView, ServiceError> {
        let order = self.load(tenant_id, order_id)?;
        self.view(tenant_id, &order)
    }

    /// All orders of a tenant, newest first.
    pub fn list(&self, tenant_id: TenantId) -> Result<Vec<OrderView>, ServiceError> {
        self.ports
            .repository
            .list(tenant_id)?
            .iter()
            .map(|order| self.view(tenant_id, order))
            .collect()
    }

    /// Write fields of an order. Derived fields are recomputed in the same
    /// commit; a rejected write changes nothing.
    pub fn update(
        &self,
        tenant_id: TenantId,
        order_id: CustomOrderId,
        changes: OrderChanges,
    ) -> Result<CustomOrder, ServiceError> {
        let order = self.load(tenant_id, order_id)?;

        if let Some(customer_id) = changes.customer_id.filter(|c| Some(*c) != order.customer_id()) {
            self.ensure_customer(tenant_id, customer_id)?;
        }

        let product_id = changes
            .product_id
            .or(order.product_id())
            .ok_or_else(|| ServiceError::InvariantViolation("order has no product".to_string()))?;
        let list_price = self.ports.catalog.list_price(tenant_id, product_id)?;

        let command = CustomOrderCommand::UpdateCustomOrder(UpdateCustomOrder {
            tenant_id,
            order_id,
            changes,
            list_price,
            occurred_at: Utc::now(),
        });

        self.commit(tenant_id, order, &command)
            .inspect_err(|e| tracing::warn!("rejected write on custom order {}: {}", order_id, e))
    }

    pub fn confirm(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<bool, ServiceError> {
        self.transition(tenant_id, order_id, Transition::Confirm)
    }

    pub fn start_production(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<bool, ServiceError> {
        self.transition(tenant_id, order_id, Transition::StartProduction)
    }

    pub fn mark_done(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<bool, ServiceError> {
        self.transition(tenant_id, order_id, Transition::MarkDone)
    }

    pub fn cancel(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<bool, ServiceError> {
        self.transition(tenant_id, order_id, Transition::Cancel)
    }

    pub fn reset_to_draft(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<bool, ServiceError> {
        self.transition(tenant_id, order_id, Transition::ResetToDraft)
    }

    /// Run a workflow operation under the configured policy.
    pub fn transition(
        &self,
        tenant_id: TenantId,
        order_id: CustomOrderId,
        transition: Transition,
    ) -> Result<bool, ServiceError> {
        let order = self.load(tenant_id, order_id)?;
        let from = order.state();

        let command = CustomOrderCommand::TransitionOrder(TransitionOrder {
            tenant_id,
            order_id,
            transition,
            policy: self.policy(),
            occurred_at: Utc::now(),
        });

        let order = self
            .commit(tenant_id, order, &command)
            .inspect_err(|e| tracing::warn!("rejected {} on custom order {}: {}", transition.name(), order_id, e))?;

        tracing::info!(
            "custom order {} moved {} -> {} ({})",
            order.reference(),
            from,
            order.state(),
            transition.name()
        );

        Ok(true)
    }

    /// Copy an order into a new draft. The reference is never copied; fee and
    /// total are recomputed with the live list price.
    pub fn duplicate(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<CustomOrder, ServiceError> {
        let source = self.load(tenant_id, order_id)?;

        let (customer_id, product_id) = match (source.customer_id(), source.product_id()) {
            (Some(c), Some(p)) => (c, p),
            _ => return Err(ServiceError::InvariantViolation("order is missing customer or product".to_string())),
        };

        let copy = self.create(tenant_id, NewOrder::new(customer_id, product_id, source.details().clone()))?;
        tracing::info!("duplicated custom order {} as {}", source.reference(), copy.reference());
        Ok(copy)
    }

    /// Recompute the total of every order on `product_id` against its current
    /// list price. Returns how many orders changed.
    ///
    /// An order written concurrently is skipped; its writer already priced it
    /// against a live list price.
    pub fn reprice_product(&self, tenant_id: TenantId, product_id: ProductId) -> Result<usize, ServiceError> {
        let list_price = self.ports.catalog.list_price(tenant_id, product_id)?;
        let mut repriced = 0;
        let mut skipped = 0;

        for order in self.ports.repository.list(tenant_id)? {
            if order.product_id() != Some(product_id) {
                continue;
            }

            let version = order.version();
            let order_id = order.id_typed();
            let command = CustomOrderCommand::RefreshTotalPrice(RefreshTotalPrice {
                tenant_id,
                order_id,
                list_price,
                occurred_at: Utc::now(),
            });

            match self.commit(tenant_id, order, &command) {
                Ok(order) if order.version() != version => repriced += 1,
                Ok(_) => {}
                Err(ServiceError::Concurrency(reason)) => {
                    tracing::warn!("skipped repricing custom order {}: {}", order_id, reason);
                    skipped += 1;
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!(
            "repriced {} custom order(s) on product {} at {} ({} skipped)",
            repriced,
            product_id,
            list_price,
            skipped
        );

        Ok(repriced)
    }

    /// Committed changes of an order, oldest first.
    pub fn history(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<Vec<ActivityEntry>, ServiceError> {
        self.load(tenant_id, order_id)?;
        Ok(self.ports.activity.history(tenant_id, order_id)?)
    }

    fn load(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<CustomOrder, ServiceError> {
        self.ports
            .repository
            .get(tenant_id, order_id)?
            .ok_or(ServiceError::OrderNotFound(order_id))
    }

    fn view(&self, tenant_id: TenantId, order: &CustomOrder) -> Result<OrderView, ServiceError> {
        let base_price = match order.product_id() {
            Some(product_id) => self.ports.catalog.list_price(tenant_id, product_id)?,
            None => Money::ZERO,
        };

        Ok(OrderView {
            id: order.id_typed(),
            reference: order.reference().to_string(),
            customer_id: order.customer_id(),
            product_id: order.product_id(),
            details: order.details().clone(),
            base_price,
            customization_fee: order.customization_fee(),
            total_price: order.total_price(),
            state: order.state(),
            state_label: order.state().label().to_string(),
            available_transitions: self.policy().available(order.state()),
            created_at: order.created_at(),
            updated_at: order.updated_at(),
            version: order.version(),
        })
    }

    fn ensure_customer(&self, tenant_id: TenantId, customer_id: PartnerId) -> Result<(), ServiceError> {
        let partner = self.ports.directory.lookup(tenant_id, customer_id)?;
        if !partner.is_customer() {
            tracing::warn!("partner {} is not an eligible customer", customer_id);
            return Err(ServiceError::Validation(CUSTOMER_NOT_ELIGIBLE.to_string()));
        }
        Ok(())
    }

    fn next_reference(&self, tenant_id: TenantId) -> Result<String, ServiceError> {
        let code = &self.config.sequence_code;
        match self.ports.sequences.next(tenant_id, code)? {
            Some(reference) => Ok(reference),
            None => {
                tracing::warn!("no sequence registered under '{}', using '{}'", code, NEW_REFERENCE);
                Ok(NEW_REFERENCE.to_string())
            }
        }
    }

    /// Decide, apply, commit against the loaded version, then log and publish.
    fn commit(
        &self,
        tenant_id: TenantId,
        mut order: CustomOrder,
        command: &CustomOrderCommand,
    ) -> Result<CustomOrder, ServiceError> {
        let expected = ExpectedVersion::Exact(order.version());

        let decided = order.handle(command)?;
        if decided.is_empty() {
            tracing::debug!("no effective change on custom order {}", order.id_typed());
            return Ok(order);
        }

        let entries = track(tenant_id, &mut order, &decided)?;

        self.ports.repository.update(order.clone(), expected)?;
        self.record(entries);

        Ok(order)
    }

    /// Post-commit bookkeeping. Failures are logged, never returned.
    fn record(&self, entries: Vec<NewActivity>) {
        let appended = match self.ports.activity.append(entries) {
            Ok(appended) => appended,
            Err(e) => {
                tracing::error!("activity log append failed after commit: {}", e);
                return;
            }
        };

        for entry in &appended {
            if let Err(e) = self.bus.publish(entry.to_envelope()) {
                tracing::error!(
                    "failed to publish {} for custom order {}: {:?}",
                    entry.event_type,
                    entry.order_id,
                    e
                );
            }
        }
    }
}

/// Apply events one by one, pairing each with the field changes it caused.
fn track(
    tenant_id: TenantId,
    order: &mut CustomOrder,
    events: &[CustomOrderEvent],
) -> Result<Vec<NewActivity>, ServiceError> {
    let mut entries = Vec::with_capacity(events.len());

    for ev in events {
        let before = order.clone();
        order.apply(ev);

        let changes = tracked_changes(&before, order);
        if let CustomOrderEvent::CustomOrderUpdated(_) | CustomOrderEvent::TotalPriceRefreshed(_) = ev {
            tracing::debug!(
                "recomputed custom order {}: fee {}, total {}",
                order.id_typed(),
                order.customization_fee(),
                order.total_price()
            );
        }

        entries.push(NewActivity::from_typed(tenant_id, order.id_typed(), ev, changes)?);
    }

    Ok(entries)
}
