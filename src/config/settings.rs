use std::fs;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

use crate::state::{SpecDescriptor, Viewport};
use crate::util::paths::config_path;

/// Example configuration file contents (bundled with the binary)
pub const EXAMPLE_CONFIG: &str = include_str!("config.toml.example");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Runtime configuration handed to the runner and, with the spec attached,
/// to the event channel.
#[derive(Debug, Clone, PartialEq)]
pub struct RuntimeConfig {
    /// Namespace the resource server mounts spec iframes under
    pub namespace: String,
    /// Prefix prepended to every iframe URL
    pub iframe_prefix: String,
    /// Initial AUT viewport
    pub viewport: Viewport,
    /// Spec being run; set by the runner before each run
    pub spec: Option<SpecDescriptor>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            namespace: "__cypress".to_string(),
            iframe_prefix: String::new(),
            viewport: Viewport::default(),
            spec: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlViewport {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

/// TOML representation of the config file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub namespace: Option<String>,
    pub iframe_prefix: Option<String>,
    pub viewport: Option<TomlViewport>,
}

impl RuntimeConfig {
    /// Load `<data_dir>/config.toml` over the defaults, creating the file
    /// from the bundled example on first run. Problems fall back to the
    /// defaults.
    pub fn load() -> Self {
        let config_file = config_path();

        if !config_file.exists() {
            Self::create_default_config(&config_file);
        }

        match Self::load_from_path(&config_file) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(
                    path = %config_file.display(),
                    error = %e,
                    "Failed to load config, using defaults"
                );
                Self::default()
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let toml_config: TomlConfig = toml::from_str(contents)?;
        let mut config = Self::default();
        config.merge(toml_config);
        Ok(config)
    }

    fn merge(&mut self, toml_config: TomlConfig) {
        if let Some(namespace) = toml_config.namespace {
            self.namespace = namespace;
        }
        if let Some(prefix) = toml_config.iframe_prefix {
            self.iframe_prefix = prefix;
        }
        if let Some(viewport) = toml_config.viewport {
            if let Some(width) = viewport.width {
                self.viewport.width = width;
            }
            if let Some(height) = viewport.height {
                self.viewport.height = height;
            }
        }
    }

    fn create_default_config(path: &Path) {
        if let Some(parent) = path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::debug!(error = %e, "Failed to create config directory");
                return;
            }
        }
        if let Err(e) = fs::write(path, EXAMPLE_CONFIG) {
            tracing::debug!(error = %e, "Failed to write example config");
        }
    }

    /// Copy of this config with `spec` attached.
    pub fn with_spec(&self, spec: SpecDescriptor) -> Self {
        Self {
            spec: Some(spec),
            ..self.clone()
        }
    }
}
