//! Errors shared by the customer directory and the product catalog.

use thiserror::Error;

use printshop_core::DomainError;

use crate::read_model::StoreUnavailable;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The referenced record does not exist for this tenant.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// A write to the collaborator was rejected by its own domain rules.
    #[error(transparent)]
    Rejected(#[from] DomainError),

    #[error("lookup storage unavailable: {0}")]
    Storage(String),
}

impl LookupError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl From<StoreUnavailable> for LookupError {
    fn from(value: StoreUnavailable) -> Self {
        Self::Storage(value.to_string())
    }
}
