//! Planner configuration loader.

use std::path::Path;

use dialogue_core::PlannerConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for planner configuration from TOML files.
///
/// Missing keys keep their [`PlannerConfig`] defaults.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &Path) -> LoadResult<PlannerConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML at {}: {}", path.display(), e))
    }

    pub fn parse(content: &str) -> Result<PlannerConfig, toml::de::Error> {
        toml::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let config = ConfigLoader::parse("agent = \"hero\"\ndeviation_threshold = 4\n").unwrap();
        assert_eq!(config.agent, "hero");
        assert_eq!(config.deviation_threshold, 4);
        assert_eq!(config.solver_timeout_ms, PlannerConfig::DEFAULT_SOLVER_TIMEOUT_MS);
    }

    #[test]
    fn wrong_type_is_rejected() {
        assert!(ConfigLoader::parse("solver_timeout_ms = \"soon\"").is_err());
    }
}
