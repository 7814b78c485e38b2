//! Attribute classification: which keys a policy may be written against.

use std::collections::BTreeSet;
use storage_policy_common::PolicySettings;

/// Schema knowledge consumed by the decision point; not owned by it.
pub trait AttributeClassifier: Send + Sync {
    /// Whether `key` names a recognized structural classification
    /// (a node or mixin type known to the content repository).
    fn is_recognized_classification(&self, key: &str) -> bool;

    /// Whether `key` names a non-structural configuration property.
    fn is_configuration_key(&self, _key: &str) -> bool {
        false
    }

    fn accepts(&self, key: &str) -> bool {
        self.is_recognized_classification(key) || self.is_configuration_key(key)
    }
}

/// Classifier backed by a fixed set of type names.
#[derive(Debug, Clone, Default)]
pub struct NodeTypeClassifier {
    node_types: BTreeSet<String>,
    configuration_keys: BTreeSet<String>,
}

impl NodeTypeClassifier {
    pub fn new<I, S>(node_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            node_types: node_types.into_iter().map(Into::into).collect(),
            configuration_keys: BTreeSet::new(),
        }
    }

    pub fn from_settings(settings: &PolicySettings) -> Self {
        let mut classifier = Self::new(settings.classifications.iter().cloned());
        classifier.configuration_keys = settings.configuration_keys.iter().cloned().collect();
        classifier
    }

    pub fn with_configuration_key(mut self, key: impl Into<String>) -> Self {
        self.configuration_keys.insert(key.into());
        self
    }
}

impl AttributeClassifier for NodeTypeClassifier {
    fn is_recognized_classification(&self, key: &str) -> bool {
        self.node_types.contains(key)
    }

    fn is_configuration_key(&self, key: &str) -> bool {
        self.configuration_keys.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_settings_recognize_mime_mixin_only_structurally() {
        let classifier = NodeTypeClassifier::from_settings(&PolicySettings::default());
        assert!(classifier.is_recognized_classification("mix:mimeType"));
        assert!(classifier.is_recognized_classification("nt:file"));
        assert!(!classifier.is_recognized_classification("bogus:type"));
        assert!(!classifier.is_configuration_key("mix:mimeType"));
    }

    #[test]
    fn names_are_case_sensitive() {
        let classifier = NodeTypeClassifier::new(["mix:mimeType"]);
        assert!(!classifier.accepts("mix:mimetype"));
        assert!(classifier.accepts("mix:mimeType"));
    }

    #[test]
    fn configuration_keys_are_accepted() {
        let classifier =
            NodeTypeClassifier::new(["nt:file"]).with_configuration_key("runtime:tier");
        assert!(!classifier.is_recognized_classification("runtime:tier"));
        assert!(classifier.accepts("runtime:tier"));
    }
}
