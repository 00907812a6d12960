use crate::models::Settings;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Default settings file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "modsieve.yaml";

/// Prefix for environment variable overrides (e.g. `MODSIEVE_MIN_SIGNAL=3`).
pub const ENV_PREFIX: &str = "MODSIEVE";

/// Configuration manager for loading and saving the YAML settings file.
///
/// Settings are layered: built-in defaults, then the YAML file (if present), then
/// `MODSIEVE_*` environment variables.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager for the given settings file.
    ///
    /// # Arguments
    /// * `config_path` - Path to the YAML settings file (it does not need to exist)
    pub fn new<P: AsRef<Utf8Path>>(config_path: P) -> Self {
        Self {
            config_path: config_path.as_ref().to_path_buf(),
        }
    }

    /// Load settings from defaults, the settings file, and the environment.
    ///
    /// # Returns
    /// The merged Settings; defaults fill anything the sources leave out
    pub fn load_settings(&self) -> Result<Settings> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Config file not found at {}, using defaults",
                self.config_path
            );
        }

        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("extra_infra_keywords");

        let settings: Settings = config::Config::builder()
            .add_source(
                config::File::new(self.config_path.as_str(), config::FileFormat::Yaml)
                    .required(false),
            )
            .add_source(environment)
            .build()
            .with_context(|| format!("Failed to load settings from {}", self.config_path))?
            .try_deserialize()
            .with_context(|| format!("Failed to parse settings from {}", self.config_path))?;

        tracing::info!("Loaded settings (config file: {})", self.config_path);
        Ok(settings)
    }

    /// Write settings to the settings file as YAML.
    ///
    /// # Arguments
    /// * `settings` - The Settings to save
    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create config directory: {}", parent))?;
            }
        }

        let yaml_string =
            serde_yaml_ng::to_string(settings).context("Failed to serialize settings to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write settings: {}", self.config_path))?;

        tracing::info!("Saved settings to {}", self.config_path);
        Ok(())
    }

    /// Get the settings file path.
    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new(DEFAULT_CONFIG_FILE)
    }
}
