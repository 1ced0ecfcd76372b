//! Human-readable reference numbers (`PRINT/001`, `PRINT/002`, ...).

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use thiserror::Error;

use printshop_core::TenantId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SequenceError {
    #[error("sequence storage unavailable: {0}")]
    Storage(String),

    #[error("sequence '{0}' exhausted")]
    Exhausted(String),
}

/// Produces the next value of a named sequence.
///
/// `Ok(None)` means no sequence is registered under `code`. Every `Some`
/// advances the counter exactly once.
pub trait SequenceGenerator: Send + Sync {
    fn next(&self, tenant_id: TenantId, code: &str) -> Result<Option<String>, SequenceError>;
}

impl<G> SequenceGenerator for Arc<G>
where
    G: SequenceGenerator + ?Sized,
{
    fn next(&self, tenant_id: TenantId, code: &str) -> Result<Option<String>, SequenceError> {
        (**self).next(tenant_id, code)
    }
}

/// Rendering rule of a sequence: `prefix` followed by the counter padded with
/// zeros to `padding` digits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceDefinition {
    pub prefix: String,
    pub padding: usize,
}

impl SequenceDefinition {
    pub fn new(prefix: impl Into<String>, padding: usize) -> Self {
        Self {
            prefix: prefix.into(),
            padding,
        }
    }

    pub fn render(&self, number: u64) -> String {
        format!("{}{:0width$}", self.prefix, number, width = self.padding)
    }
}

/// In-memory generator with per-tenant counters.
#[derive(Debug, Default)]
pub struct InMemorySequenceGenerator {
    definitions: RwLock<HashMap<String, SequenceDefinition>>,
    counters: Mutex<HashMap<(TenantId, String), u64>>,
}

impl InMemorySequenceGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the definition of `code`. Existing counters keep
    /// running.
    pub fn register(&self, code: impl Into<String>, definition: SequenceDefinition) -> Result<(), SequenceError> {
        let mut defs = self
            .definitions
            .write()
            .map_err(|_| SequenceError::Storage("lock poisoned".to_string()))?;
        defs.insert(code.into(), definition);
        Ok(())
    }

    pub fn with_sequence(self, code: impl Into<String>, definition: SequenceDefinition) -> Result<Self, SequenceError> {
        self.register(code, definition)?;
        Ok(self)
    }
}

impl SequenceGenerator for InMemorySequenceGenerator {
    fn next(&self, tenant_id: TenantId, code: &str) -> Result<Option<String>, SequenceError> {
        let definition = {
            let defs = self
                .definitions
                .read()
                .map_err(|_| SequenceError::Storage("lock poisoned".to_string()))?;
            match defs.get(code) {
                Some(d) => d.clone(),
                None => return Ok(None),
            }
        };

        let mut counters = self
            .counters
            .lock()
            .map_err(|_| SequenceError::Storage("lock poisoned".to_string()))?;
        let counter = counters.entry((tenant_id, code.to_string())).or_insert(0);
        *counter = counter
            .checked_add(1)
            .ok_or_else(|| SequenceError::Exhausted(code.to_string()))?;

        Ok(Some(definition.render(*counter)))
    }
}
