//! Content factory for loading worlds and tuning from a data directory.

use std::path::{Path, PathBuf};

use dialogue_core::{GraphModel, PlannerConfig};

use crate::loaders::{AtlasLoader, ConfigLoader, LoadResult};

/// Loads every piece of dialogue content from one directory.
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── tavern/           (atlas directory)
/// │   ├── world.ron
/// │   └── characters/
/// └── vault.ron         (single-file atlas)
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Loads `config.toml`, falling back to defaults when the file is absent.
    pub fn load_config(&self) -> LoadResult<PlannerConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no planner config, using defaults");
            return Ok(PlannerConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Loads the world `name`, either `name/` or `name.ron`.
    pub fn load_world(&self, name: &str) -> LoadResult<GraphModel> {
        AtlasLoader::load(&self.world_path(name))
    }

    pub fn world_path(&self, name: &str) -> PathBuf {
        let dir = self.data_dir.join(name);
        if dir.is_dir() {
            dir
        } else {
            self.data_dir.join(format!("{name}.ron"))
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
