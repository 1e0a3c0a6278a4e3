//! Editor configuration
//!
//! Settings can be built programmatically or loaded from `PAGEMARK_*`
//! environment variables.

use crate::interaction::MIN_RESIZE_EXTENT;
use std::path::{Path, PathBuf};

/// Error types for configuration loading
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}")]
    InvalidValue(String),
}

/// Tunables for the annotation editor
#[derive(Debug, Clone, PartialEq)]
pub struct EditorConfig {
    /// Minimum width/height produced by a resize drag, in document units
    pub min_resize_extent: f64,
    /// Side of the bottom-right resize handle, in screen pixels
    pub handle_size: f64,
    /// Maximum undo depth (None = unbounded)
    pub history_limit: Option<usize>,
    /// Persist the state after every change
    pub autosave: bool,
    /// Storage root override (None = platform data directory)
    pub data_dir: Option<PathBuf>,
    /// File stem used for exported artifacts
    pub export_base_name: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_resize_extent: MIN_RESIZE_EXTENT,
            handle_size: 12.0,
            history_limit: None,
            autosave: true,
            data_dir: None,
            export_base_name: "annotations".to_string(),
        }
    }
}

impl EditorConfig {
    pub fn with_min_resize_extent(mut self, extent: f64) -> Self {
        self.min_resize_extent = extent;
        self
    }

    pub fn with_handle_size(mut self, size: f64) -> Self {
        self.handle_size = size;
        self
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn with_autosave(mut self, autosave: bool) -> Self {
        self.autosave = autosave;
        self
    }

    pub fn with_data_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_export_base_name(mut self, name: impl Into<String>) -> Self {
        self.export_base_name = name.into();
        self
    }

    /// Loads configuration from environment variables.
    ///
    /// Environment variables:
    /// - `PAGEMARK_MIN_RESIZE`: resize floor in document units (default: 10)
    /// - `PAGEMARK_HANDLE_SIZE`: resize handle size in pixels (default: 12)
    /// - `PAGEMARK_HISTORY_LIMIT`: maximum undo depth, at least 1 (default: unbounded)
    /// - `PAGEMARK_AUTOSAVE`: `true`/`false` (default: true)
    /// - `PAGEMARK_DATA_DIR`: storage directory
    ///
    /// # Errors
    /// Returns an error if any variable holds an unparsable value.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`EditorConfig::from_env`] with an injectable variable source
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(val) = lookup("PAGEMARK_MIN_RESIZE") {
            config.min_resize_extent = parse_positive(&val, "PAGEMARK_MIN_RESIZE")?;
        }

        if let Some(val) = lookup("PAGEMARK_HANDLE_SIZE") {
            config.handle_size = parse_positive(&val, "PAGEMARK_HANDLE_SIZE")?;
        }

        if let Some(val) = lookup("PAGEMARK_HISTORY_LIMIT") {
            let limit = match val.parse::<usize>() {
                Ok(limit) if limit > 0 => limit,
                _ => return Err(ConfigError::InvalidValue("PAGEMARK_HISTORY_LIMIT".to_string())),
            };
            config.history_limit = Some(limit);
        }

        if let Some(val) = lookup("PAGEMARK_AUTOSAVE") {
            config.autosave = val
                .parse::<bool>()
                .map_err(|_| ConfigError::InvalidValue("PAGEMARK_AUTOSAVE".to_string()))?;
        }

        if let Some(val) = lookup("PAGEMARK_DATA_DIR") {
            config.data_dir = Some(PathBuf::from(val));
        }

        Ok(config)
    }
}

fn parse_positive(val: &str, key: &str) -> Result<f64, ConfigError> {
    match val.parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(ConfigError::InvalidValue(key.to_string())),
    }
}
