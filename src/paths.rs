/// Centralized platform-specific path computation
///
/// Follows the XDG Base Directory specification on Unix-like systems.
use std::path::PathBuf;

/// Name of the per-user directory the tool keeps its caches and config under
pub const TOOL_DIR_NAME: &str = "code_embedder";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate cache directory for the current platform
    ///
    /// - Windows: %LOCALAPPDATA%
    /// - macOS: ~/Library/Caches
    /// - Linux/Unix: $XDG_CACHE_HOME or ~/.cache
    pub fn cache_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("LOCALAPPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Caches"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("XDG_CACHE_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".cache")))
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            std::env::var("APPDATA")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("."))
        } else if cfg!(target_os = "macos") {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join("Library/Application Support"))
                .unwrap_or_else(|_| PathBuf::from("."))
        } else {
            std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
                .unwrap_or_else(|_| PathBuf::from("."))
        }
    }

    /// Returns: {cache_dir}/code_embedder
    pub fn tool_cache_dir() -> PathBuf {
        Self::cache_dir().join(TOOL_DIR_NAME)
    }

    /// Returns: {config_dir}/code_embedder
    pub fn tool_config_dir() -> PathBuf {
        Self::config_dir().join(TOOL_DIR_NAME)
    }

    /// Where downloaded embedding model weights are cached
    ///
    /// Returns: {cache_dir}/code_embedder/models
    pub fn default_model_cache_dir() -> PathBuf {
        Self::tool_cache_dir().join("models")
    }

    /// Scratch space for exported commit snapshots
    ///
    /// Returns: {cache_dir}/code_embedder/snapshots
    pub fn default_snapshot_dir() -> PathBuf {
        Self::tool_cache_dir().join("snapshots")
    }

    /// Returns: {config_dir}/code_embedder/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::tool_config_dir().join("config.toml")
    }
}
