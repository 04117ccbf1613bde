//! Tuning for the whole list, loadable from TOML.
//!
//! Discovery order: `./.chatlist/config.toml`, then `config.toml` in the
//! platform config directory. A missing file means defaults; an unreadable
//! or malformed one is logged and also falls back to defaults.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chatlist_layout::{CacheConfig, CellMeasurer, CellMetrics, LayoutCache, LayoutEngine, LayoutMetrics};
use chatlist_window::WindowConfig;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::viewport::ViewportConfig;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatListConfig {
    pub layout: LayoutMetrics,
    pub measurer: CellMetrics,
    pub cache: CacheConfig,
    pub window: WindowConfig,
    pub viewport: ViewportConfig,
}

impl ChatListConfig {
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| Error::Configuration(format!("Failed to parse config: {e}")))
    }

    /// Read `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// First config found in the standard locations, or the defaults.
    pub fn discover() -> Self {
        for path in Self::discovery_paths() {
            if !path.exists() {
                continue;
            }
            match Self::load(&path) {
                Ok(config) => {
                    tracing::debug!(target: "chatlist::config", path = %path.display(), "Loaded config");
                    return config;
                }
                Err(e) => {
                    tracing::warn!(
                        target: "chatlist::config",
                        path = %path.display(),
                        error = %e,
                        "Failed to load config. Using defaults."
                    );
                    return Self::default();
                }
            }
        }
        Self::default()
    }

    pub fn discovery_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from(".chatlist").join(CONFIG_FILE)];
        if let Some(dirs) = directories::ProjectDirs::from("", "", "chatlist") {
            paths.push(dirs.config_dir().join(CONFIG_FILE));
        }
        paths
    }

    /// Layout engine backed by the cell measurer and a fresh cache.
    pub fn build_engine(&self) -> LayoutEngine {
        LayoutEngine::new(
            self.layout.clone(),
            Arc::new(CellMeasurer::new(self.measurer.clone())),
            LayoutCache::new(&self.cache),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatlist_window::SortOrder;

    #[test]
    fn empty_file_is_default() {
        assert_eq!(ChatListConfig::from_toml_str("").unwrap(), ChatListConfig::default());
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = ChatListConfig::from_toml_str(
            r#"
            [window]
            order = "descending"
            initial_limit = 40

            [viewport]
            relayout_buffer = 5
            time_format = "%I:%M %p"

            [layout]
            max_bubble_width = 360.0
            "#,
        )
        .unwrap();

        assert_eq!(config.window.order, SortOrder::Descending);
        assert_eq!(config.window.initial_limit, 40);
        assert_eq!(config.window.page_limit, 100);
        assert_eq!(config.viewport.relayout_buffer, 5);
        assert!((config.viewport.at_bottom_threshold - 5.0).abs() < f64::EPSILON);
        assert!((config.layout.max_bubble_width - 360.0).abs() < f64::EPSILON);
        assert_eq!(config.cache, CacheConfig::default());
    }

    #[test]
    fn malformed_config_is_an_error() {
        let err = ChatListConfig::from_toml_str("[window]\ninitial_limit = \"many\"").unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn load_reads_file_and_tolerates_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        assert_eq!(ChatListConfig::load(&path).unwrap(), ChatListConfig::default());

        std::fs::write(&path, "[viewport]\nanimate_changes = false\n").unwrap();
        let config = ChatListConfig::load(&path).unwrap();
        assert!(!config.viewport.animate_changes);
    }

    #[test]
    fn project_config_is_discovered_first() {
        let paths = ChatListConfig::discovery_paths();
        assert_eq!(paths[0], PathBuf::from(".chatlist/config.toml"));
    }
}
