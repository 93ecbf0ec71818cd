//! Orchestrator configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the batch orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Maximum batches processed concurrently.
    /// Batches never share intermediate files, so raising this only
    /// multiplies disk and encoder pressure.
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
}

fn default_max_concurrent_batches() -> usize {
    1
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_batches: default_max_concurrent_batches(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.max_concurrent_batches, 1);
    }

    #[test]
    fn test_deserialize_empty_uses_defaults() {
        let config: OrchestratorConfig = toml::from_str("").unwrap();
        assert_eq!(config.max_concurrent_batches, 1);
    }

    #[test]
    fn test_deserialize_override() {
        let toml = r#"
            max_concurrent_batches = 3
        "#;
        let config: OrchestratorConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.max_concurrent_batches, 3);
    }
}
