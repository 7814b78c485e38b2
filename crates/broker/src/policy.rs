use crate::error::{BrokerError, BrokerResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Built-in "has a MIME type" mixin name.
pub const MIME_TYPE_CLASSIFICATION: &str = "mix:mimeType";

/// Separator between match value and storage hint in the durable property value.
pub const PROPERTY_SEPARATOR: char = ':';

/// An immutable attribute matcher plus the storage hint it resolves to.
///
/// Equality and hashing cover all three fields; two separately built
/// policies with the same fields are the same policy.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Policy {
    classification: String,
    match_value: String,
    storage_hint: String,
}

impl Policy {
    /// Build a policy without consulting the classifier or family factory.
    /// [`crate::DecisionPoint::add_policy`] validates it again before storing.
    pub fn new(
        classification: impl Into<String>,
        match_value: impl Into<String>,
        storage_hint: impl Into<String>,
    ) -> Self {
        Self {
            classification: classification.into(),
            match_value: match_value.into(),
            storage_hint: storage_hint.into(),
        }
    }

    pub fn classification(&self) -> &str {
        &self.classification
    }

    pub fn match_value(&self) -> &str {
        &self.match_value
    }

    pub fn storage_hint(&self) -> &str {
        &self.storage_hint
    }

    pub fn matches(&self, attributes: &ResourceAttributes) -> bool {
        attributes.get(&self.classification) == Some(self.match_value.as_str())
    }

    /// Durable property value, `"<match value>:<storage hint>"`.
    pub fn property_value(&self) -> String {
        format!(
            "{}{}{}",
            self.match_value, PROPERTY_SEPARATOR, self.storage_hint
        )
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} -> {}",
            self.classification, self.match_value, self.storage_hint
        )
    }
}

/// Descriptive attributes of a resource being placed, keyed by classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceAttributes {
    values: BTreeMap<String, String>,
}

impl ResourceAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, classification: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(classification, value);
        self
    }

    pub fn insert(&mut self, classification: impl Into<String>, value: impl Into<String>) {
        self.values.insert(classification.into(), value.into());
    }

    pub fn get(&self, classification: &str) -> Option<&str> {
        self.values.get(classification).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ResourceAttributes {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut attributes = Self::new();
        for (key, value) in iter {
            attributes.insert(key, value);
        }
        attributes
    }
}

impl fmt::Display for ResourceAttributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.values.is_empty() {
            return f.write_str("(no attributes)");
        }
        let mut first = true;
        for (key, value) in &self.values {
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{}={}", key, value)?;
            first = false;
        }
        Ok(())
    }
}

/// A family of policies sharing one matching dimension.
pub trait PolicyFamily: Send + Sync {
    fn name(&self) -> &'static str;

    /// Validate family-specific input and build the policy.
    fn build(
        &self,
        classification: &str,
        match_value: &str,
        storage_hint: &str,
    ) -> BrokerResult<Policy>;
}

/// Matches binaries by MIME type literal, e.g. `image/tiff`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MimeTypePolicyFamily;

impl PolicyFamily for MimeTypePolicyFamily {
    fn name(&self) -> &'static str {
        "mime-type"
    }

    fn build(
        &self,
        classification: &str,
        match_value: &str,
        storage_hint: &str,
    ) -> BrokerResult<Policy> {
        let valid_mime = match match_value.split_once('/') {
            Some((kind, subtype)) => {
                !kind.is_empty()
                    && !subtype.is_empty()
                    && !subtype.contains('/')
                    && !match_value.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid_mime {
            return Err(BrokerError::InvalidArgument(format!(
                "invalid MIME type '{}' (expected type/subtype)",
                match_value
            )));
        }
        Ok(Policy::new(classification, match_value, storage_hint))
    }
}

/// Classification key → policy family constructor.
///
/// New families are added with [`PolicyFactory::register`]; `build` never
/// needs to change.
#[derive(Clone)]
pub struct PolicyFactory {
    families: HashMap<String, Arc<dyn PolicyFamily>>,
}

impl PolicyFactory {
    /// A factory with no families registered.
    pub fn empty() -> Self {
        Self {
            families: HashMap::new(),
        }
    }

    /// A factory with the built-in MIME-type family.
    pub fn new() -> Self {
        let mut factory = Self::empty();
        factory.register(MIME_TYPE_CLASSIFICATION, Arc::new(MimeTypePolicyFamily));
        factory
    }

    /// Register `family` for `classification`, returning any family it replaces.
    pub fn register(
        &mut self,
        classification: impl Into<String>,
        family: Arc<dyn PolicyFamily>,
    ) -> Option<Arc<dyn PolicyFamily>> {
        self.families.insert(classification.into(), family)
    }

    pub fn supports(&self, classification: &str) -> bool {
        self.families.contains_key(classification)
    }

    pub fn family_name(&self, classification: &str) -> Option<&'static str> {
        self.families.get(classification).map(|family| family.name())
    }

    pub fn build(
        &self,
        classification: &str,
        match_value: &str,
        storage_hint: &str,
    ) -> BrokerResult<Policy> {
        let family = self.families.get(classification).ok_or_else(|| {
            BrokerError::UnsupportedClassification(format!(
                "{}: mapping not found",
                classification
            ))
        })?;

        if match_value.is_empty() || match_value.contains(PROPERTY_SEPARATOR) {
            return Err(BrokerError::InvalidArgument(format!(
                "match value must be non-empty and must not contain '{}': '{}'",
                PROPERTY_SEPARATOR, match_value
            )));
        }
        if storage_hint.is_empty() || storage_hint.chars().any(char::is_whitespace) {
            return Err(BrokerError::InvalidArgument(format!(
                "storage hint must be non-empty without whitespace: '{}'",
                storage_hint
            )));
        }

        family.build(classification, match_value, storage_hint)
    }
}

impl Default for PolicyFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for PolicyFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.families.keys().collect();
        keys.sort();
        f.debug_struct("PolicyFactory")
            .field("classifications", &keys)
            .finish()
    }
}

#[cfg(test)]
mod tests;
