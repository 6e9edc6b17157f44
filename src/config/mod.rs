use crate::models::MarkingConfig;
use anyhow::{Context, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Name of the configuration file looked up inside the data directory.
pub const CONFIG_FILE_NAME: &str = "marking.yaml";

/// Configuration manager for the marking data directory.
///
/// Owns the data directory layout:
/// - `marking.yaml`: timing and protocol settings (optional)
/// - `rubric.txt`: the rubric backing store (name configurable)
/// - `exams/`: one record per exam (name configurable)
#[derive(Debug, Clone)]
pub struct ConfigManager {
    data_dir: Utf8PathBuf,
    config_path: Utf8PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager rooted at `data_dir`, reading `data_dir/marking.yaml`.
    pub fn new<P: AsRef<Utf8Path>>(data_dir: P) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        Self {
            config_path: data_dir.join(CONFIG_FILE_NAME),
            data_dir,
        }
    }

    /// Read the configuration from an explicit file instead of the data directory.
    pub fn with_config_path<P: AsRef<Utf8Path>>(mut self, config_path: P) -> Self {
        self.config_path = config_path.as_ref().to_path_buf();
        self
    }

    /// Load and validate the marking configuration.
    ///
    /// # Returns
    /// The loaded MarkingConfig, or defaults if the file doesn't exist
    pub fn load_marking_config(&self) -> Result<MarkingConfig> {
        if !self.config_path.exists() {
            tracing::warn!(
                "Marking config not found at {}, using defaults",
                self.config_path
            );
            return Ok(MarkingConfig::default());
        }

        let file_contents = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read marking config: {}", self.config_path))?;

        let config: MarkingConfig = serde_yaml_ng::from_str(&file_contents)
            .with_context(|| format!("Failed to parse marking config: {}", self.config_path))?;

        config
            .validate()
            .with_context(|| format!("Invalid marking config: {}", self.config_path))?;

        tracing::info!("Loaded marking config from {}", self.config_path);
        Ok(config)
    }

    /// Save the marking configuration.
    pub fn save_marking_config(&self, config: &MarkingConfig) -> Result<()> {
        let yaml_string =
            serde_yaml_ng::to_string(config).context("Failed to serialize marking config to YAML")?;

        fs::write(&self.config_path, yaml_string)
            .with_context(|| format!("Failed to write marking config: {}", self.config_path))?;

        tracing::info!("Saved marking config to {}", self.config_path);
        Ok(())
    }

    /// Rubric backing file for `config`
    pub fn rubric_path(&self, config: &MarkingConfig) -> Utf8PathBuf {
        self.data_dir.join(&config.rubric_file)
    }

    /// Exam record directory for `config`
    pub fn exams_dir(&self, config: &MarkingConfig) -> Utf8PathBuf {
        self.data_dir.join(&config.exams_dir)
    }

    pub fn data_dir(&self) -> &Utf8Path {
        &self.data_dir
    }

    pub fn config_path(&self) -> &Utf8Path {
        &self.config_path
    }
}
