//! Tenant-isolated key/value storage backing the directory and catalog.

pub mod tenant_store;

pub use tenant_store::{InMemoryTenantStore, StoreUnavailable, TenantStore};
