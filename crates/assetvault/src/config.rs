//! Vault configuration with environment variable and file-based loading.
//!
//! Environment variables:
//! - `MESHDROP_VAULT_PATH`: Base path for vault storage
//! - `MESHDROP_SOURCE_FILE`: Source asset filename under `models/`
//!
//! Default path: `~/.meshdrop/vault`

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

/// Configuration for the asset vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Base path for vault storage.
    /// The source asset lives in `{base_path}/models/`, generated assets
    /// in `{base_path}/temp_assets/`.
    pub base_path: PathBuf,

    /// Filename of the source asset under the models directory.
    #[serde(default = "default_source_file")]
    pub source_file: String,
}

fn default_source_file() -> String {
    "coin.glb".to_string()
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            base_path: default_vault_path(),
            source_file: default_source_file(),
        }
    }
}

/// Get the default vault path (~/.meshdrop/vault).
fn default_vault_path() -> PathBuf {
    directories::BaseDirs::new()
        .map(|dirs| dirs.home_dir().join(".meshdrop").join("vault"))
        .unwrap_or_else(|| PathBuf::from(".meshdrop/vault"))
}

impl VaultConfig {
    /// Load configuration from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `MESHDROP_VAULT_PATH`: Override the base path
    /// - `MESHDROP_SOURCE_FILE`: Override the source asset filename
    pub fn from_env() -> Result<Self> {
        let base_path = env::var("MESHDROP_VAULT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| default_vault_path());

        let source_file =
            env::var("MESHDROP_SOURCE_FILE").unwrap_or_else(|_| default_source_file());

        Ok(Self {
            base_path,
            source_file,
        })
    }

    /// Load configuration from a TOML file, falling back to environment.
    ///
    /// The file should contain a `[vault]` section:
    /// ```toml
    /// [vault]
    /// base_path = "/srv/meshdrop"
    /// source_file = "coin.glb"
    /// ```
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        // Parse as TOML table, look for [vault] section
        let table: toml::Table = contents
            .parse()
            .with_context(|| format!("failed to parse TOML: {}", path.display()))?;

        if let Some(vault_section) = table.get("vault") {
            let config: VaultConfig = vault_section
                .clone()
                .try_into()
                .context("failed to parse [vault] section")?;
            Ok(config)
        } else {
            // No [vault] section, fall back to env
            Self::from_env()
        }
    }

    /// Create a config with a specific base path.
    pub fn with_base_path(path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: path.into(),
            source_file: default_source_file(),
        }
    }

    /// Builder: set the source asset filename.
    pub fn with_source_file(mut self, name: impl Into<String>) -> Self {
        self.source_file = name.into();
        self
    }

    /// Get the models directory path (read-only fixed inputs).
    pub fn models_dir(&self) -> PathBuf {
        self.base_path.join("models")
    }

    /// Get the generated assets directory path.
    pub fn assets_dir(&self) -> PathBuf {
        self.base_path.join("temp_assets")
    }

    /// Get the full path of the source asset.
    pub fn source_path(&self) -> PathBuf {
        self.models_dir().join(&self.source_file)
    }
}
