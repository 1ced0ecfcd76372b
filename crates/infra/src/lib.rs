//! Infrastructure layer: order storage, activity log, sequences, lookup
//! adapters, configuration and the order service composing them.

pub mod activity_log;
pub mod catalog;
pub mod config;
pub mod directory;
pub mod lookup;
pub mod order_service;
pub mod read_model;
pub mod repository;
pub mod sequence;

mod integration_tests;

pub use activity_log::{ActivityEntry, ActivityLog, ActivityLogError, InMemoryActivityLog};
pub use catalog::{InMemoryProductCatalog, ProductCatalog};
pub use config::{ConfigError, PrintshopConfig};
pub use directory::{CustomerDirectory, InMemoryCustomerDirectory};
pub use lookup::LookupError;
pub use order_service::{NewOrder, OrderPorts, OrderService, OrderView, ServiceError};
pub use repository::{InMemoryOrderRepository, OrderRepository, RepositoryError};
pub use sequence::{InMemorySequenceGenerator, SequenceDefinition, SequenceError, SequenceGenerator};
