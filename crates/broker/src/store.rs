//! Durable mirror of the policy set.
//!
//! The durable shape is one multi-valued property per classification key on
//! a single configuration node, holding `"<match value>:<storage hint>"`.
//! Persisting a policy replaces the property, so only the most recently
//! persisted policy per classification key survives a reload.

use crate::policy::PROPERTY_SEPARATOR;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// One durable policy entry as read back from a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyRecord {
    pub classification: String,
    pub match_value: String,
    pub storage_hint: String,
}

impl PolicyRecord {
    /// Decode a `"<match value>:<storage hint>"` property value.
    pub fn from_property(classification: &str, value: &str) -> Option<Self> {
        let (match_value, storage_hint) = value.split_once(PROPERTY_SEPARATOR)?;
        if match_value.is_empty() || storage_hint.is_empty() {
            return None;
        }
        Some(Self {
            classification: classification.to_string(),
            match_value: match_value.to_string(),
            storage_hint: storage_hint.to_string(),
        })
    }
}

pub trait PolicyStore: Send + Sync {
    /// Write the property for `classification`, replacing any previous value.
    fn persist(&self, classification: &str, match_value: &str, storage_hint: &str) -> Result<()>;

    /// Remove the property for `classification`. Removing an absent property is not an error.
    fn remove_property(&self, classification: &str) -> Result<()>;

    /// Raw property value for `classification`, if present.
    fn property(&self, classification: &str) -> Result<Option<String>>;

    fn load(&self) -> Result<Vec<PolicyRecord>>;

    fn clear(&self) -> Result<()> {
        for record in self.load()? {
            self.remove_property(&record.classification)?;
        }
        Ok(())
    }
}

type Properties = BTreeMap<String, Vec<String>>;

fn records_from(properties: &Properties) -> Vec<PolicyRecord> {
    let mut records = Vec::new();
    for (classification, values) in properties {
        for value in values {
            match PolicyRecord::from_property(classification, value) {
                Some(record) => records.push(record),
                None => warn!(
                    "Skipping malformed policy property {}={:?}",
                    classification, value
                ),
            }
        }
    }
    records
}

fn property_from(properties: &Properties, classification: &str) -> Option<String> {
    properties
        .get(classification)
        .and_then(|values| values.first())
        .cloned()
}

/// Process-local store; state lives as long as the value.
#[derive(Debug, Default)]
pub struct InMemoryPolicyStore {
    properties: Mutex<Properties>,
}

impl InMemoryPolicyStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn properties(&self) -> Result<std::sync::MutexGuard<'_, Properties>> {
        self.properties
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire store lock: {}", e))
    }
}

impl PolicyStore for InMemoryPolicyStore {
    fn persist(&self, classification: &str, match_value: &str, storage_hint: &str) -> Result<()> {
        let value = format!("{}{}{}", match_value, PROPERTY_SEPARATOR, storage_hint);
        self.properties()?
            .insert(classification.to_string(), vec![value]);
        Ok(())
    }

    fn remove_property(&self, classification: &str) -> Result<()> {
        self.properties()?.remove(classification);
        Ok(())
    }

    fn property(&self, classification: &str) -> Result<Option<String>> {
        let properties = self.properties()?;
        Ok(property_from(&properties, classification))
    }

    fn load(&self) -> Result<Vec<PolicyRecord>> {
        let properties = self.properties()?;
        Ok(records_from(&properties))
    }

    fn clear(&self) -> Result<()> {
        self.properties()?.clear();
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct StoreFileV1 {
    #[serde(default)]
    properties: Properties,
}

/// YAML file standing in for the repository's policy configuration node.
#[derive(Debug)]
pub struct YamlPolicyStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl YamlPolicyStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<StoreFileV1> {
        if !self.path.exists() {
            return Ok(StoreFileV1::default());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read policy store from {:?}", self.path))?;
        if content.trim().is_empty() {
            return Ok(StoreFileV1::default());
        }
        serde_yaml::from_str(&content)
            .map_err(|err| anyhow::anyhow!("Failed to parse policy store {:?}: {}", self.path, err))
    }

    fn write(&self, file: &StoreFileV1) -> Result<()> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory {:?}", dir))?;

        let body = serde_yaml::to_string(file).context("Failed to serialize policy store")?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .with_context(|| format!("Failed to stage policy store in {:?}", dir))?;
        tmp.write_all(body.as_bytes())
            .context("Failed to write staged policy store")?;
        tmp.persist(&self.path)
            .map_err(|err| anyhow::anyhow!("Failed to replace {:?}: {}", self.path, err.error))?;
        debug!("Wrote policy store {:?}", self.path);
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Properties)) -> Result<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| anyhow::anyhow!("Failed to acquire store write lock: {}", e))?;
        let mut file = self.read()?;
        apply(&mut file.properties);
        self.write(&file)
    }
}

impl PolicyStore for YamlPolicyStore {
    fn persist(&self, classification: &str, match_value: &str, storage_hint: &str) -> Result<()> {
        let value = format!("{}{}{}", match_value, PROPERTY_SEPARATOR, storage_hint);
        self.update(|properties| {
            properties.insert(classification.to_string(), vec![value]);
        })
    }

    fn remove_property(&self, classification: &str) -> Result<()> {
        self.update(|properties| {
            properties.remove(classification);
        })
    }

    fn property(&self, classification: &str) -> Result<Option<String>> {
        Ok(property_from(&self.read()?.properties, classification))
    }

    fn load(&self) -> Result<Vec<PolicyRecord>> {
        Ok(records_from(&self.read()?.properties))
    }

    fn clear(&self) -> Result<()> {
        self.update(|properties| properties.clear())
    }
}
