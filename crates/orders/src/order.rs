use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use printshop_core::{Aggregate, AggregateId, AggregateRoot, DomainError, Money, TenantId};
use printshop_events::Event;
use printshop_parties::PartnerId;
use printshop_products::ProductId;

use crate::options::{Color, DesignFile, Size};
use crate::pricing;
use crate::validation;
use crate::workflow::{OrderState, Transition, WorkflowPolicy};

/// Placeholder reference of an order whose sequence could not be drawn.
pub const NEW_REFERENCE: &str = "New";

/// Sequence key used to draw order references.
pub const ORDER_SEQUENCE_CODE: &str = "printing.custom.order";

/// Custom order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CustomOrderId(pub AggregateId);

impl CustomOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for CustomOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// User-editable customization of an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    pub custom_text: Option<String>,
    pub color: Color,
    /// Hex code (e.g. `#FF5733`) when `color` is custom. Not validated.
    pub custom_color_code: Option<String>,
    pub size: Size,
    pub design_file: Option<DesignFile>,
    pub quantity: i64,
    pub notes: Option<String>,
}

impl Default for OrderDetails {
    fn default() -> Self {
        Self {
            custom_text: None,
            color: Color::default(),
            custom_color_code: None,
            size: Size::default(),
            design_file: None,
            quantity: 1,
            notes: None,
        }
    }
}

/// Write to a clearable field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldWrite<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T: Clone + PartialEq> FieldWrite<T> {
    pub fn is_keep(&self) -> bool {
        matches!(self, FieldWrite::Keep)
    }

    fn resolve(&self, current: &Option<T>) -> Option<T> {
        match self {
            FieldWrite::Keep => current.clone(),
            FieldWrite::Set(v) => Some(v.clone()),
            FieldWrite::Clear => None,
        }
    }

    /// Drop writes that would not change `current`.
    fn against(&self, current: &Option<T>) -> FieldWrite<T> {
        if self.resolve(current) == *current {
            FieldWrite::Keep
        } else {
            self.clone()
        }
    }
}

/// A partial write to an order. Untouched fields keep their value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<PartnerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "FieldWrite::is_keep")]
    pub custom_text: FieldWrite<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    #[serde(default, skip_serializing_if = "FieldWrite::is_keep")]
    pub custom_color_code: FieldWrite<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Size>,
    #[serde(default, skip_serializing_if = "FieldWrite::is_keep")]
    pub design_file: FieldWrite<DesignFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<i64>,
    #[serde(default, skip_serializing_if = "FieldWrite::is_keep")]
    pub notes: FieldWrite<String>,
}

impl OrderChanges {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customer(mut self, customer_id: PartnerId) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn product(mut self, product_id: ProductId) -> Self {
        self.product_id = Some(product_id);
        self
    }

    pub fn custom_text(mut self, text: impl Into<String>) -> Self {
        self.custom_text = FieldWrite::Set(text.into());
        self
    }

    pub fn clear_custom_text(mut self) -> Self {
        self.custom_text = FieldWrite::Clear;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(color);
        self
    }

    pub fn custom_color_code(mut self, code: impl Into<String>) -> Self {
        self.custom_color_code = FieldWrite::Set(code.into());
        self
    }

    pub fn clear_custom_color_code(mut self) -> Self {
        self.custom_color_code = FieldWrite::Clear;
        self
    }

    pub fn size(mut self, size: Size) -> Self {
        self.size = Some(size);
        self
    }

    pub fn design_file(mut self, file: DesignFile) -> Self {
        self.design_file = FieldWrite::Set(file);
        self
    }

    pub fn clear_design_file(mut self) -> Self {
        self.design_file = FieldWrite::Clear;
        self
    }

    pub fn quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = FieldWrite::Set(notes.into());
        self
    }

    pub fn clear_notes(mut self) -> Self {
        self.notes = FieldWrite::Clear;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none()
            && self.product_id.is_none()
            && self.custom_text.is_keep()
            && self.color.is_none()
            && self.custom_color_code.is_keep()
            && self.size.is_none()
            && self.design_file.is_keep()
            && self.quantity.is_none()
            && self.notes.is_keep()
    }

    /// Whether the write touches an input of the customization fee.
    pub fn touches_fee_inputs(&self) -> bool {
        !self.custom_text.is_keep() || !self.design_file.is_keep() || self.size.is_some()
    }
}

/// Aggregate root: a customer's personalized print order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomOrder {
    id: CustomOrderId,
    tenant_id: Option<TenantId>,
    reference: String,
    customer_id: Option<PartnerId>,
    product_id: Option<ProductId>,
    details: OrderDetails,
    customization_fee: Money,
    total_price: Money,
    state: OrderState,
    created_at: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl CustomOrder {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: CustomOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            reference: NEW_REFERENCE.to_string(),
            customer_id: None,
            product_id: None,
            details: OrderDetails::default(),
            customization_fee: Money::ZERO,
            total_price: Money::ZERO,
            state: OrderState::Draft,
            created_at: None,
            updated_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> CustomOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn customer_id(&self) -> Option<PartnerId> {
        self.customer_id
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn details(&self) -> &OrderDetails {
        &self.details
    }

    pub fn custom_text(&self) -> Option<&str> {
        self.details.custom_text.as_deref()
    }

    pub fn color(&self) -> Color {
        self.details.color
    }

    pub fn custom_color_code(&self) -> Option<&str> {
        self.details.custom_color_code.as_deref()
    }

    pub fn size(&self) -> Size {
        self.details.size
    }

    pub fn design_file(&self) -> Option<&DesignFile> {
        self.details.design_file.as_ref()
    }

    pub fn quantity(&self) -> i64 {
        self.details.quantity
    }

    pub fn notes(&self) -> Option<&str> {
        self.details.notes.as_deref()
    }

    pub fn customization_fee(&self) -> Money {
        self.customization_fee
    }

    pub fn total_price(&self) -> Money {
        self.total_price
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }
}

impl AggregateRoot for CustomOrder {
    type Id = CustomOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateCustomOrder.
///
/// `reference` and `list_price` are resolved by the caller (sequence generator
/// and product catalog) before the command reaches the aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCustomOrder {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub reference: String,
    pub customer_id: PartnerId,
    pub product_id: ProductId,
    pub details: OrderDetails,
    pub list_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UpdateCustomOrder.
///
/// `list_price` is the live price of the product the order points to after the
/// write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateCustomOrder {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub changes: OrderChanges,
    pub list_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Command: TransitionOrder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionOrder {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub transition: Transition,
    pub policy: WorkflowPolicy,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RefreshTotalPrice (the product's list price moved).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshTotalPrice {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub list_price: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomOrderCommand {
    CreateCustomOrder(CreateCustomOrder),
    UpdateCustomOrder(UpdateCustomOrder),
    TransitionOrder(TransitionOrder),
    RefreshTotalPrice(RefreshTotalPrice),
}

/// Event: CustomOrderCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOrderCreated {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub reference: String,
    pub customer_id: PartnerId,
    pub product_id: ProductId,
    pub details: OrderDetails,
    pub customization_fee: Money,
    pub total_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: CustomOrderUpdated. `changes` only holds effective changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomOrderUpdated {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub changes: OrderChanges,
    pub customization_fee: Money,
    pub total_price: Money,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStateChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderStateChanged {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub transition: Transition,
    pub from: OrderState,
    pub to: OrderState,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TotalPriceRefreshed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TotalPriceRefreshed {
    pub tenant_id: TenantId,
    pub order_id: CustomOrderId,
    pub list_price: Money,
    pub total_price: Money,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CustomOrderEvent {
    CustomOrderCreated(CustomOrderCreated),
    CustomOrderUpdated(CustomOrderUpdated),
    OrderStateChanged(OrderStateChanged),
    TotalPriceRefreshed(TotalPriceRefreshed),
}

impl Event for CustomOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            CustomOrderEvent::CustomOrderCreated(_) => "printing.order.created",
            CustomOrderEvent::CustomOrderUpdated(_) => "printing.order.updated",
            CustomOrderEvent::OrderStateChanged(_) => "printing.order.state_changed",
            CustomOrderEvent::TotalPriceRefreshed(_) => "printing.order.total_refreshed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            CustomOrderEvent::CustomOrderCreated(e) => e.occurred_at,
            CustomOrderEvent::CustomOrderUpdated(e) => e.occurred_at,
            CustomOrderEvent::OrderStateChanged(e) => e.occurred_at,
            CustomOrderEvent::TotalPriceRefreshed(e) => e.occurred_at,
        }
    }
}

impl Aggregate for CustomOrder {
    type Command = CustomOrderCommand;
    type Event = CustomOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            CustomOrderEvent::CustomOrderCreated(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.reference = e.reference.clone();
                self.customer_id = Some(e.customer_id);
                self.product_id = Some(e.product_id);
                self.details = e.details.clone();
                self.customization_fee = e.customization_fee;
                self.total_price = e.total_price;
                self.state = OrderState::Draft;
                self.created_at = Some(e.occurred_at);
                self.updated_at = Some(e.occurred_at);
                self.created = true;
            }
            CustomOrderEvent::CustomOrderUpdated(e) => {
                self.assign(&e.changes);
                self.customization_fee = e.customization_fee;
                self.total_price = e.total_price;
                self.updated_at = Some(e.occurred_at);
            }
            CustomOrderEvent::OrderStateChanged(e) => {
                self.state = e.to;
                self.updated_at = Some(e.occurred_at);
            }
            CustomOrderEvent::TotalPriceRefreshed(e) => {
                self.total_price = e.total_price;
                self.updated_at = Some(e.occurred_at);
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            CustomOrderCommand::CreateCustomOrder(cmd) => self.handle_create(cmd),
            CustomOrderCommand::UpdateCustomOrder(cmd) => self.handle_update(cmd),
            CustomOrderCommand::TransitionOrder(cmd) => self.handle_transition(cmd),
            CustomOrderCommand::RefreshTotalPrice(cmd) => self.handle_refresh(cmd),
        }
    }
}

impl CustomOrder {
    fn ensure_target(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        if self.tenant_id != Some(tenant_id) {
            return Err(DomainError::invariant("tenant mismatch"));
        }
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn assign(&mut self, changes: &OrderChanges) {
        if let Some(customer_id) = changes.customer_id {
            self.customer_id = Some(customer_id);
        }
        if let Some(product_id) = changes.product_id {
            self.product_id = Some(product_id);
        }
        let d = &mut self.details;
        d.custom_text = changes.custom_text.resolve(&d.custom_text);
        if let Some(color) = changes.color {
            d.color = color;
        }
        d.custom_color_code = changes.custom_color_code.resolve(&d.custom_color_code);
        if let Some(size) = changes.size {
            d.size = size;
        }
        d.design_file = changes.design_file.resolve(&d.design_file);
        if let Some(quantity) = changes.quantity {
            d.quantity = quantity;
        }
        d.notes = changes.notes.resolve(&d.notes);
    }

    /// Reduce a write to the fields it actually changes.
    fn effective_changes(&self, changes: &OrderChanges) -> OrderChanges {
        let d = &self.details;
        OrderChanges {
            customer_id: changes.customer_id.filter(|c| Some(*c) != self.customer_id),
            product_id: changes.product_id.filter(|p| Some(*p) != self.product_id),
            custom_text: changes.custom_text.against(&d.custom_text),
            color: changes.color.filter(|c| *c != d.color),
            custom_color_code: changes.custom_color_code.against(&d.custom_color_code),
            size: changes.size.filter(|s| *s != d.size),
            design_file: changes.design_file.against(&d.design_file),
            quantity: changes.quantity.filter(|q| *q != d.quantity),
            notes: changes.notes.against(&d.notes),
        }
    }

    fn handle_create(&self, cmd: &CreateCustomOrder) -> Result<Vec<CustomOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("custom order already exists"));
        }

        if cmd.reference.trim().is_empty() {
            return Err(DomainError::invariant("order reference must be assigned"));
        }

        let d = &cmd.details;
        validation::check_fields(d.quantity, d.custom_text.as_deref())?;

        let fee = pricing::customization_fee(d.custom_text.as_deref(), d.design_file.as_ref(), d.size);
        let total = pricing::total_price(cmd.list_price, fee, d.quantity)?;

        Ok(vec![CustomOrderEvent::CustomOrderCreated(CustomOrderCreated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            reference: cmd.reference.clone(),
            customer_id: cmd.customer_id,
            product_id: cmd.product_id,
            details: d.clone(),
            customization_fee: fee,
            total_price: total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateCustomOrder) -> Result<Vec<CustomOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;

        let changes = self.effective_changes(&cmd.changes);
        if changes.is_empty() {
            return Ok(vec![]);
        }

        // Tentative record: validated and priced before anything is emitted.
        let mut next = self.clone();
        next.assign(&changes);
        let d = &next.details;
        validation::check_fields(d.quantity, d.custom_text.as_deref())?;

        let fee = if changes.touches_fee_inputs() {
            pricing::customization_fee(d.custom_text.as_deref(), d.design_file.as_ref(), d.size)
        } else {
            self.customization_fee
        };

        let total_dirty = changes.touches_fee_inputs()
            || changes.quantity.is_some()
            || changes.product_id.is_some();
        let total = if total_dirty {
            pricing::total_price(cmd.list_price, fee, d.quantity)?
        } else {
            self.total_price
        };

        Ok(vec![CustomOrderEvent::CustomOrderUpdated(CustomOrderUpdated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            changes,
            customization_fee: fee,
            total_price: total,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_transition(&self, cmd: &TransitionOrder) -> Result<Vec<CustomOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;

        let to = cmd.policy.resolve(self.state, cmd.transition)?;

        Ok(vec![CustomOrderEvent::OrderStateChanged(OrderStateChanged {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            transition: cmd.transition,
            from: self.state,
            to,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_refresh(&self, cmd: &RefreshTotalPrice) -> Result<Vec<CustomOrderEvent>, DomainError> {
        self.ensure_target(cmd.tenant_id, cmd.order_id)?;

        let total = pricing::total_price(cmd.list_price, self.customization_fee, self.details.quantity)?;
        if total == self.total_price {
            return Ok(vec![]);
        }

        Ok(vec![CustomOrderEvent::TotalPriceRefreshed(TotalPriceRefreshed {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            list_price: cmd.list_price,
            total_price: total,
            occurred_at: cmd.occurred_at,
        })])
    }
}
