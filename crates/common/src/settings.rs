//! Layered settings: built-in defaults, `config.yaml`, then environment.

use crate::paths;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

pub const STORE_ENV: &str = "STORAGE_POLICY_STORE";

/// Content-repository node and mixin type names recognized out of the box.
pub const DEFAULT_CLASSIFICATIONS: &[&str] = &[
    "mix:mimeType",
    "mix:created",
    "mix:lastModified",
    "mix:referenceable",
    "mix:title",
    "mix:versionable",
    "nt:base",
    "nt:file",
    "nt:folder",
    "nt:resource",
    "nt:unstructured",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicySettings {
    /// Location of the durable policy store. Defaults to `<home>/policies.yaml`.
    pub store_path: Option<PathBuf>,
    /// Classification keys the attribute classifier recognizes.
    pub classifications: Vec<String>,
    /// Non-structural configuration keys accepted in place of a classification.
    pub configuration_keys: Vec<String>,
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            store_path: None,
            classifications: DEFAULT_CLASSIFICATIONS
                .iter()
                .map(|name| name.to_string())
                .collect(),
            configuration_keys: Vec::new(),
        }
    }
}

impl PolicySettings {
    /// Load settings from `path` (or the default config file), then apply
    /// environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => paths::config_file()?,
        };
        let mut settings = Self::from_file(&path)?;
        settings.apply_store_override(std::env::var(STORE_ENV).ok().as_deref());
        Ok(settings)
    }

    /// Read a config file. A missing file yields the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config at {:?}; using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {:?}", path))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse config from {:?}", path))
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn apply_store_override(&mut self, raw: Option<&str>) {
        if let Some(raw) = raw {
            let trimmed = raw.trim();
            if !trimmed.is_empty() {
                self.store_path = Some(PathBuf::from(trimmed));
            }
        }
    }

    pub fn resolved_store_path(&self) -> Result<PathBuf> {
        match &self.store_path {
            Some(path) => Ok(path.clone()),
            None => paths::store_file(),
        }
    }
}
