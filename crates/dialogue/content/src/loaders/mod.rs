//! Content loaders for reading dialogue data from files.
//!
//! RON holds authored world content, TOML holds planner tuning.

pub mod atlas;
pub mod config;
pub mod factory;

pub use atlas::{AtlasLoader, CharacterFile, ContextOverride, WorldAtlas};
pub use config::ConfigLoader;
pub use factory::ContentFactory;

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
