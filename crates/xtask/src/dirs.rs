//! Platform-specific directory utilities
//!
//! Provides consistent directory paths across different operating systems,
//! following platform conventions for cache directories.

use std::path::PathBuf;

/// Get the platform-specific log directory
///
/// Follows platform conventions:
/// - macOS: `~/Library/Caches/npc-dialogue/logs`
/// - Linux: `~/.cache/npc-dialogue/logs` (or `$XDG_CACHE_HOME/npc-dialogue/logs`)
/// - Windows: `%LOCALAPPDATA%\npc-dialogue\logs`
/// - Fallback: `/tmp/npc-dialogue/logs`
pub fn log_dir() -> PathBuf {
    directories::ProjectDirs::from("", "", "npc-dialogue")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("/tmp/npc-dialogue"))
        .join("logs")
}
