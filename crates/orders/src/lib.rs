//! Custom print order domain module (event-sourced).
//!
//! A custom order binds a customer and a base product to a set of
//! customization choices (text, colour, size, design upload), keeps its
//! customization fee and total price current on every write, and moves through
//! a five-state workflow. Pure domain logic: no IO, no storage.

pub mod options;
pub mod order;
pub mod pricing;
pub mod tracking;
pub mod validation;
pub mod workflow;

pub use options::{Color, DesignFile, Size};
pub use order::{
    CreateCustomOrder, CustomOrder, CustomOrderCommand, CustomOrderCreated, CustomOrderEvent,
    CustomOrderId, CustomOrderUpdated, FieldWrite, NEW_REFERENCE, ORDER_SEQUENCE_CODE,
    OrderChanges, OrderDetails, OrderStateChanged, RefreshTotalPrice, TotalPriceRefreshed,
    TransitionOrder, UpdateCustomOrder,
};
pub use pricing::{customization_fee, size_surcharge, total_price};
pub use tracking::{FieldChange, tracked_changes};
pub use workflow::{OrderState, Transition, WorkflowPolicy};
