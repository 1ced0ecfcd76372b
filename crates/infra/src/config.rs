//! Configuration loaded from environment variables.
//!
//! | variable                     | default                 |
//! |------------------------------|-------------------------|
//! | `PRINTSHOP_SEQUENCE_CODE`    | `printing.custom.order` |
//! | `PRINTSHOP_SEQUENCE_PREFIX`  | `PRINT/`                |
//! | `PRINTSHOP_SEQUENCE_PADDING` | `3`                     |
//! | `PRINTSHOP_WORKFLOW_POLICY`  | `strict`                |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use printshop_orders::{ORDER_SEQUENCE_CODE, WorkflowPolicy};

use crate::sequence::{InMemorySequenceGenerator, SequenceDefinition, SequenceError};

pub const ENV_SEQUENCE_CODE: &str = "PRINTSHOP_SEQUENCE_CODE";
pub const ENV_SEQUENCE_PREFIX: &str = "PRINTSHOP_SEQUENCE_PREFIX";
pub const ENV_SEQUENCE_PADDING: &str = "PRINTSHOP_SEQUENCE_PADDING";
pub const ENV_WORKFLOW_POLICY: &str = "PRINTSHOP_WORKFLOW_POLICY";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrintshopConfig {
    pub sequence_code: String,
    pub sequence_prefix: String,
    pub sequence_padding: usize,
    pub workflow_policy: WorkflowPolicy,
}

impl Default for PrintshopConfig {
    fn default() -> Self {
        Self {
            sequence_code: ORDER_SEQUENCE_CODE.to_string(),
            sequence_prefix: "PRINT/".to_string(),
            sequence_padding: 3,
            workflow_policy: WorkflowPolicy::Strict,
        }
    }
}

impl PrintshopConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source. Missing
    /// variables take their default; present but malformed ones are errors.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let sequence_code = match lookup(ENV_SEQUENCE_CODE) {
            Some(code) if code.trim().is_empty() => {
                return Err(ConfigError::Invalid {
                    var: ENV_SEQUENCE_CODE,
                    reason: "must not be blank".to_string(),
                });
            }
            Some(code) => code.trim().to_string(),
            None => defaults.sequence_code,
        };

        let sequence_prefix = lookup(ENV_SEQUENCE_PREFIX).unwrap_or(defaults.sequence_prefix);

        let sequence_padding = match lookup(ENV_SEQUENCE_PADDING) {
            Some(raw) => raw.trim().parse::<usize>().map_err(|e| ConfigError::Invalid {
                var: ENV_SEQUENCE_PADDING,
                reason: e.to_string(),
            })?,
            None => defaults.sequence_padding,
        };

        let workflow_policy = match lookup(ENV_WORKFLOW_POLICY) {
            Some(raw) => raw.parse::<WorkflowPolicy>().map_err(|e| ConfigError::Invalid {
                var: ENV_WORKFLOW_POLICY,
                reason: e.to_string(),
            })?,
            None => defaults.workflow_policy,
        };

        Ok(Self {
            sequence_code,
            sequence_prefix,
            sequence_padding,
            workflow_policy,
        })
    }

    pub fn sequence_definition(&self) -> SequenceDefinition {
        SequenceDefinition::new(self.sequence_prefix.clone(), self.sequence_padding)
    }

    /// In-memory generator with the order sequence registered.
    pub fn sequence_generator(&self) -> Result<InMemorySequenceGenerator, SequenceError> {
        InMemorySequenceGenerator::new().with_sequence(self.sequence_code.clone(), self.sequence_definition())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let cfg = PrintshopConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, PrintshopConfig::default());
        assert_eq!(cfg.sequence_code, "printing.custom.order");
        assert_eq!(cfg.workflow_policy, WorkflowPolicy::Strict);
    }

    #[test]
    fn overrides_are_read() {
        let env = vars(&[
            (ENV_SEQUENCE_PREFIX, "CO-"),
            (ENV_SEQUENCE_PADDING, "5"),
            (ENV_WORKFLOW_POLICY, "permissive"),
        ]);
        let cfg = PrintshopConfig::from_lookup(|k| env.get(k).cloned()).unwrap();

        assert_eq!(cfg.sequence_definition().render(42), "CO-00042");
        assert_eq!(cfg.workflow_policy, WorkflowPolicy::Permissive);
    }

    #[test]
    fn malformed_padding_is_rejected() {
        let env = vars(&[(ENV_SEQUENCE_PADDING, "three")]);
        let err = PrintshopConfig::from_lookup(|k| env.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_SEQUENCE_PADDING, .. }));
    }

    #[test]
    fn unknown_policy_is_rejected() {
        let env = vars(&[(ENV_WORKFLOW_POLICY, "lenient")]);
        assert!(PrintshopConfig::from_lookup(|k| env.get(k).cloned()).is_err());
    }

    #[test]
    fn blank_sequence_code_is_rejected() {
        let env = vars(&[(ENV_SEQUENCE_CODE, "   ")]);
        assert!(PrintshopConfig::from_lookup(|k| env.get(k).cloned()).is_err());
    }
}
