//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! [weights]
//! lambda = 0.5
//! p = 0.2
//!
//! [budgets]
//! local = 300
//! story = 800
//!
//! [builder]
//! local_window = 8
//!
//! [scheduler]
//! main_branch_size = 12
//! ```
//!
//! Every table and key is optional; missing values take their defaults.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::context_assembler::{BuilderSettings, ContextBudgets, ContextWeights};
use crate::error::ConfigError;
use crate::skeleton::SchedulerConfig;

/// Complete configuration for context selection and skeleton generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: ContextWeights,
    pub budgets: ContextBudgets,
    pub builder: BuilderSettings,
    pub scheduler: SchedulerConfig,
}

impl EngineConfig {
    /// Parse and validate a configuration from a TOML string.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(toml_str).map_err(|e| ConfigError::Parse {
            path: "<string>".to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            source: e,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would make scoring meaningless.
    ///
    /// Scheduler parameters are not checked here; generation clamps them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        let fields = [
            ("weights.lambda", w.lambda),
            ("weights.mu", w.mu),
            ("weights.alpha", w.alpha),
            ("weights.beta", w.beta),
            ("weights.gamma", w.gamma),
            ("weights.delta", w.delta),
            ("weights.eta", w.eta),
            ("weights.kappa", w.kappa),
            ("weights.p", w.p),
        ];
        for (field, value) in fields {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field: field.to_string(),
                    message: format!("must be a finite non-negative number, got {}", value),
                });
            }
        }

        if self.builder.chars_per_token == 0 {
            return Err(ConfigError::Invalid {
                field: "builder.chars_per_token".to_string(),
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context_assembler::ChunkType;

    #[test]
    fn test_empty_toml_gives_defaults() {
        let config = EngineConfig::from_toml_str("").unwrap();
        assert_eq!(config, EngineConfig::default());
    }

    #[test]
    fn test_partial_toml() {
        let config = EngineConfig::from_toml_str(
            r#"
            [weights]
            lambda = 0.5

            [budgets]
            local = 300
            story = 800

            [builder]
            local_window = 8

            [scheduler]
            main_branch_size = 12
            prompt = "A ghost story"
            "#,
        )
        .unwrap();

        assert_eq!(config.weights.lambda, 0.5);
        assert_eq!(config.weights.mu, ContextWeights::default().mu);
        assert_eq!(config.budgets.get(ChunkType::Local), Some(300));
        assert_eq!(config.budgets.get(ChunkType::Character), None);
        assert_eq!(config.builder.local_window, 8);
        assert_eq!(config.builder.chars_per_token, 4);
        assert_eq!(config.scheduler.main_branch_size, 12);
        assert_eq!(config.scheduler.prompt, "A ghost story");
    }

    #[test]
    fn test_rejects_negative_weight() {
        let err = EngineConfig::from_toml_str("[weights]\nalpha = -1.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "weights.alpha"));
    }

    #[test]
    fn test_rejects_zero_chars_per_token() {
        let err = EngineConfig::from_toml_str("[builder]\nchars_per_token = 0\n").unwrap_err();
        assert!(err.to_string().contains("builder.chars_per_token"));
    }

    #[test]
    fn test_parse_error() {
        let err = EngineConfig::from_toml_str("[weights\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = EngineConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_round_trip_through_toml() {
        let config = EngineConfig::default();
        let text = toml::to_string(&config).unwrap();
        let restored = EngineConfig::from_toml_str(&text).unwrap();
        assert_eq!(restored, config);
    }
}
