//! Configuration module for nodetree-rs
//!
//! Editor settings live in a single TOML file. Every field has a default, so
//! a partial (or missing) file is always valid.
//!
//! # App Data Location
//!
//! - **Linux**: `~/.local/share/dev.nodetree.nodetree-rs/`
//! - **macOS**: `~/Library/Application Support/dev.nodetree.nodetree-rs/`
//! - **Windows**: `%APPDATA%\dev.nodetree.nodetree-rs\`
//!
//! # Example
//!
//! ```toml
//! [history]
//! merge_window_ms = 300
//! max_depth = 500
//!
//! [layout]
//! node_width = 150.0
//! node_height = 30.0
//!
//! [logging]
//! filter = "info,nodetree_rs=trace"
//! log_dir = "/tmp/nodetree-logs"
//! ```

use crate::error::{NodeTreeError, Result};
use crate::graph::NodeExtent;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application identifier for data directories
pub const APP_ID: &str = "dev.nodetree.nodetree-rs";

/// Editor config filename
pub const CONFIG_FILE: &str = "editor.toml";

/// Default merge window for parameter edits in milliseconds
pub const DEFAULT_MERGE_WINDOW_MS: u64 = 200;

/// Default node extent used for centring and bounds
pub const DEFAULT_NODE_WIDTH: f64 = 150.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 30.0;

/// Default keyboard nudge distances
pub const DEFAULT_KEYBOARD_STEP: f64 = 20.0;
pub const DEFAULT_KEYBOARD_FINE_STEP: f64 = 5.0;

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,nodetree_rs=debug";

// ==================== App Data Directory ====================

/// Get the application data directory path
pub fn app_data_dir() -> Option<PathBuf> {
    dirs_next::data_dir().map(|p| p.join(APP_ID))
}

/// Ensure the app data directory exists
pub fn ensure_app_data_dir() -> Result<PathBuf> {
    let dir = app_data_dir().ok_or_else(|| {
        NodeTreeError::Config("Could not determine app data directory".to_string())
    })?;

    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| {
            NodeTreeError::Config(format!("Failed to create app data directory: {}", e))
        })?;
    }

    Ok(dir)
}

/// Get the path to the editor config file
pub fn config_path() -> Option<PathBuf> {
    app_data_dir().map(|p| p.join(CONFIG_FILE))
}

// ==================== Settings ====================

/// Undo history behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistorySettings {
    /// Window within which consecutive parameter edits coalesce
    pub merge_window_ms: u64,

    /// Oldest entries are dropped past this depth (0 = unlimited)
    pub max_depth: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            merge_window_ms: DEFAULT_MERGE_WINDOW_MS,
            max_depth: 0,
        }
    }
}

/// Canvas geometry the core needs without a renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    pub node_width: f64,
    pub node_height: f64,
    pub keyboard_step: f64,
    pub keyboard_fine_step: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            node_width: DEFAULT_NODE_WIDTH,
            node_height: DEFAULT_NODE_HEIGHT,
            keyboard_step: DEFAULT_KEYBOARD_STEP,
            keyboard_fine_step: DEFAULT_KEYBOARD_FINE_STEP,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    pub filter: String,

    /// Also write logs to daily-rotated files here
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: DEFAULT_LOG_FILTER.to_string(),
            log_dir: None,
        }
    }
}

/// Top-level editor configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistorySettings,
    pub layout: LayoutSettings,
    pub logging: LoggingSettings,
}

impl EditorConfig {
    /// Parse a TOML document
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| NodeTreeError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| NodeTreeError::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Load config from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NodeTreeError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Load config from the default location, returning defaults on any error
    pub fn load_or_default() -> Self {
        let Some(path) = config_path() else {
            return Self::default();
        };
        if !path.exists() {
            return Self::default();
        }
        Self::load(&path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load editor config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Save config to a file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = self.to_toml_string()?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| NodeTreeError::Config(format!("Failed to write config: {}", e)))
    }

    /// Save config to the default location
    pub fn save_default(&self) -> Result<PathBuf> {
        let path = ensure_app_data_dir()?.join(CONFIG_FILE);
        self.save(&path)?;
        Ok(path)
    }

    fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if !(layout.node_width > 0.0 && layout.node_height > 0.0) {
            return Err(NodeTreeError::Config(format!(
                "Node size must be positive, got {}x{}",
                layout.node_width, layout.node_height
            )));
        }
        Ok(())
    }

    pub fn merge_window(&self) -> Duration {
        Duration::from_millis(self.history.merge_window_ms)
    }

    pub fn node_extent(&self) -> NodeExtent {
        NodeExtent {
            width: self.layout.node_width,
            height: self.layout.node_height,
        }
    }

    /// Keyboard nudge distance; `fine` is the modifier-held step
    pub fn nudge_step(&self, fine: bool) -> f64 {
        if fine {
            self.layout.keyboard_fine_step
        } else {
            self.layout.keyboard_step
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EditorConfig::default();
        assert_eq!(config.merge_window(), Duration::from_millis(200));
        assert_eq!(config.history.max_depth, 0);
        assert_eq!(config.node_extent(), NodeExtent::default());
        assert_eq!(config.nudge_step(false), 20.0);
        assert_eq!(config.nudge_step(true), 5.0);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = EditorConfig::from_toml_str("[history]\nmerge_window_ms = 350\n").unwrap();
        assert_eq!(config.history.merge_window_ms, 350);
        assert_eq!(config.history.max_depth, 0);
        assert_eq!(config.layout, LayoutSettings::default());
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(EditorConfig::from_toml_str("[history]\nmerge_window_ms = \"fast\"\n").is_err());
        let err = EditorConfig::from_toml_str("[layout]\nnode_width = 0.0\n").unwrap_err();
        assert!(matches!(err, NodeTreeError::Config(_)));
    }

    #[test]
    fn test_save_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        let mut config = EditorConfig::default();
        config.history.max_depth = 64;
        config.logging.log_dir = Some(dir.path().join("logs"));
        config.save(&path).unwrap();

        assert_eq!(EditorConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = EditorConfig::load(dir.path().join("nope.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read"));
    }
}
