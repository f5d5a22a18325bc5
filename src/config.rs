use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available on this platform")]
    NoConfigDir,
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Layout and interaction tuning for the desktop surface.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DesktopConfig {
    #[serde(default = "default_margin")]
    pub left_margin: f32,
    #[serde(default = "default_margin")]
    pub top_margin: f32,
    #[serde(default = "default_column_gap")]
    pub column_gap: f32,
    #[serde(default = "default_item_height")]
    pub item_height: f32,
    #[serde(default = "default_icon_width")]
    pub icon_width: f32,
    #[serde(default = "default_icon_gap")]
    pub icon_gap: f32,
    #[serde(default = "default_item_padding")]
    pub item_padding: f32,
    #[serde(default = "default_char_width")]
    pub char_width: f32,
    #[serde(default = "default_bold_factor")]
    pub bold_factor: f32,
    /// Drop-target tolerance as a fraction of the target's own size.
    #[serde(default = "default_gravity")]
    pub gravity: f32,
    /// Pointer travel (px) after which a press becomes a drag.
    #[serde(default = "default_click_slop")]
    pub click_slop: f32,
    #[serde(default = "default_double_click_secs")]
    pub double_click_secs: f64,
}

fn default_margin() -> f32 {
    12.0
}

fn default_column_gap() -> f32 {
    24.0
}

fn default_item_height() -> f32 {
    28.0
}

fn default_icon_width() -> f32 {
    20.0
}

fn default_icon_gap() -> f32 {
    6.0
}

fn default_item_padding() -> f32 {
    10.0
}

fn default_char_width() -> f32 {
    7.0
}

fn default_bold_factor() -> f32 {
    1.1
}

fn default_gravity() -> f32 {
    0.5
}

fn default_click_slop() -> f32 {
    4.0
}

fn default_double_click_secs() -> f64 {
    0.4
}

impl Default for DesktopConfig {
    fn default() -> Self {
        Self {
            left_margin: default_margin(),
            top_margin: default_margin(),
            column_gap: default_column_gap(),
            item_height: default_item_height(),
            icon_width: default_icon_width(),
            icon_gap: default_icon_gap(),
            item_padding: default_item_padding(),
            char_width: default_char_width(),
            bold_factor: default_bold_factor(),
            gravity: default_gravity(),
            click_slop: default_click_slop(),
            double_click_secs: default_double_click_secs(),
        }
    }
}

/// One user override of the default key map, e.g. `{"chord": "Ctrl+E", "action": "extract"}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeyBindingEntry {
    pub chord: String,
    pub action: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    #[serde(default)]
    pub last_pos: Option<(f32, f32)>,
    #[serde(default)]
    pub last_size: Option<(f32, f32)>,
    #[serde(default)]
    pub import_root: Option<PathBuf>,
    #[serde(default = "default_import_depth")]
    pub import_depth: usize,
    #[serde(default)]
    pub desktop: DesktopConfig,
    #[serde(default)]
    pub key_bindings: Vec<KeyBindingEntry>,
}

fn default_import_depth() -> usize {
    3
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            last_pos: None,
            last_size: None,
            import_root: None,
            import_depth: default_import_depth(),
            desktop: DesktopConfig::default(),
            key_bindings: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "netdesk", "netdesk")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn load() -> Self {
        let Some(dir) = Self::config_dir() else {
            return Self::default();
        };
        let config_path = dir.join(CONFIG_FILE);
        if !config_path.exists() {
            return Self::default();
        }
        match Self::try_load_from(&config_path) {
            Ok(config) => config,
            Err(err) => {
                warn!("{err}; using default config");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let result = Self::config_dir()
            .ok_or(ConfigError::NoConfigDir)
            .and_then(|dir| self.save_to(&dir.join(CONFIG_FILE)));
        if let Err(err) = result {
            warn!("failed to save config: {err}");
        }
    }

    pub fn try_load_from(path: &Path) -> Result<Self, ConfigError> {
        let file = std::fs::File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| {
            ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io_err)?;
        }
        let file = std::fs::File::create(path).map_err(io_err)?;
        serde_json::to_writer_pretty(file, self).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_config_path(tag: &str) -> PathBuf {
        let uniq = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time error")
            .as_nanos();
        std::env::temp_dir()
            .join(format!("netdesk_config_{tag}_{uniq}"))
            .join(CONFIG_FILE)
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"desktop": {"gravity": 0.75}}"#).expect("parse");
        assert_eq!(config.import_depth, 3);
        assert!((config.desktop.gravity - 0.75).abs() < 0.001);
        assert!((config.desktop.column_gap - 24.0).abs() < 0.001);
        assert!(config.key_bindings.is_empty());
    }

    #[test]
    fn save_and_load_from_disk() {
        let path = temp_config_path("roundtrip");
        let mut config = AppConfig::default();
        config.last_size = Some((800.0, 600.0));
        config.key_bindings.push(KeyBindingEntry {
            chord: "Ctrl+E".into(),
            action: "extract".into(),
        });
        config.save_to(&path).expect("save");

        let loaded = AppConfig::try_load_from(&path).expect("load");
        assert_eq!(loaded, config);

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }

    #[test]
    fn malformed_file_reports_parse_error() {
        let path = temp_config_path("broken");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, b"{ not json").expect("write");

        let err = AppConfig::try_load_from(&path).expect_err("should fail");
        assert!(matches!(err, ConfigError::Parse { .. }));

        if let Some(dir) = path.parent() {
            let _ = std::fs::remove_dir_all(dir);
        }
    }
}
