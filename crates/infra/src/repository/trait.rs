use std::sync::Arc;

use thiserror::Error;

use printshop_core::{ExpectedVersion, TenantId};
use printshop_orders::{CustomOrder, CustomOrderId};

/// Repository operation error.
///
/// Infrastructure failures only; business rules are enforced by the order
/// aggregate before anything reaches the repository.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    #[error("optimistic concurrency check failed: {0}")]
    Concurrency(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    #[error("order already exists: {0}")]
    AlreadyExists(CustomOrderId),

    #[error("order not found: {0}")]
    NotFound(CustomOrderId),

    #[error("repository storage unavailable: {0}")]
    Storage(String),
}

/// Tenant-scoped storage of committed custom orders.
///
/// A commit is all-or-nothing: either the full new snapshot is stored, or the
/// previous one stays untouched.
///
/// - `insert` stores a freshly created order; the id must be unused.
/// - `update` replaces the stored order only if its version still equals
///   `expected` (optimistic concurrency).
/// - `list` returns a tenant's orders newest first (creation time, then id).
pub trait OrderRepository: Send + Sync {
    fn insert(&self, order: CustomOrder) -> Result<(), RepositoryError>;

    fn get(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<Option<CustomOrder>, RepositoryError>;

    fn update(&self, order: CustomOrder, expected: ExpectedVersion) -> Result<(), RepositoryError>;

    fn list(&self, tenant_id: TenantId) -> Result<Vec<CustomOrder>, RepositoryError>;
}

impl<R> OrderRepository for Arc<R>
where
    R: OrderRepository + ?Sized,
{
    fn insert(&self, order: CustomOrder) -> Result<(), RepositoryError> {
        (**self).insert(order)
    }

    fn get(&self, tenant_id: TenantId, order_id: CustomOrderId) -> Result<Option<CustomOrder>, RepositoryError> {
        (**self).get(tenant_id, order_id)
    }

    fn update(&self, order: CustomOrder, expected: ExpectedVersion) -> Result<(), RepositoryError> {
        (**self).update(order, expected)
    }

    fn list(&self, tenant_id: TenantId) -> Result<Vec<CustomOrder>, RepositoryError> {
        (**self).list(tenant_id)
    }
}
