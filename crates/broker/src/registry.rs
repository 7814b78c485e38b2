//! In-memory policy set with first-match evaluation.

use crate::error::{BrokerError, BrokerResult};
use crate::policy::{Policy, ResourceAttributes};
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;

pub const NO_POLICIES_SENTINEL: &str = "No Policies Found";

/// Policies in registration order. No two entries are equal.
#[derive(Debug, Clone, Default)]
pub struct PolicyRegistry {
    policies: Vec<Policy>,
    index: HashSet<Policy>,
}

impl PolicyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `policy`. An equal policy already present is rejected, never merged.
    pub fn add(&mut self, policy: Policy) -> BrokerResult<()> {
        if !self.index.insert(policy.clone()) {
            return Err(BrokerError::DuplicatePolicy(policy.to_string()));
        }
        self.policies.push(policy);
        Ok(())
    }

    pub fn contains(&self, policy: &Policy) -> bool {
        self.index.contains(policy)
    }

    pub fn is_empty(&self) -> bool {
        self.policies.is_empty()
    }

    pub fn len(&self) -> usize {
        self.policies.len()
    }

    pub fn clear(&mut self) {
        self.policies.clear();
        self.index.clear();
    }

    pub fn policies(&self) -> &[Policy] {
        &self.policies
    }

    pub fn has_classification(&self, classification: &str) -> bool {
        self.policies
            .iter()
            .any(|policy| policy.classification() == classification)
    }

    /// Drop every policy written against `classification`, returning them.
    pub fn remove_classification(&mut self, classification: &str) -> Vec<Policy> {
        let (removed, kept): (Vec<_>, Vec<_>) = self
            .policies
            .drain(..)
            .partition(|policy| policy.classification() == classification);
        self.policies = kept;
        for policy in &removed {
            self.index.remove(policy);
        }
        removed
    }

    /// First registered policy whose predicate holds for `attributes`.
    pub fn find(&self, attributes: &ResourceAttributes) -> Option<&Policy> {
        self.policies.iter().find(|policy| policy.matches(attributes))
    }

    pub fn evaluate(&self, attributes: &ResourceAttributes) -> BrokerResult<String> {
        self.find(attributes)
            .map(|policy| policy.storage_hint().to_string())
            .ok_or_else(|| BrokerError::NoPolicyFound(attributes.to_string()))
    }

    pub fn describe(&self) -> PolicyListing {
        if self.policies.is_empty() {
            PolicyListing::NoPolicies
        } else {
            PolicyListing::Policies(self.policies.clone())
        }
    }
}

/// Operator view of the registry. An empty registry is reported as
/// [`PolicyListing::NoPolicies`], never as an empty list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyListing {
    NoPolicies,
    Policies(Vec<Policy>),
}

impl PolicyListing {
    pub fn policies(&self) -> &[Policy] {
        match self {
            Self::NoPolicies => &[],
            Self::Policies(policies) => policies,
        }
    }
}

impl fmt::Display for PolicyListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPolicies => f.write_str(NO_POLICIES_SENTINEL),
            Self::Policies(policies) => {
                for (i, policy) in policies.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\n")?;
                    }
                    write!(f, "{}", policy)?;
                }
                Ok(())
            }
        }
    }
}

impl Serialize for PolicyListing {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::NoPolicies => serializer.serialize_str(NO_POLICIES_SENTINEL),
            Self::Policies(policies) => policies.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::MIME_TYPE_CLASSIFICATION;

    fn tiff(hint: &str) -> Policy {
        Policy::new(MIME_TYPE_CLASSIFICATION, "image/tiff", hint)
    }

    fn mime(value: &str) -> ResourceAttributes {
        ResourceAttributes::new().with(MIME_TYPE_CLASSIFICATION, value)
    }

    #[test]
    fn add_then_contains_and_second_add_fails() {
        let mut registry = PolicyRegistry::new();
        registry.add(tiff("diskA")).unwrap();
        assert!(registry.contains(&tiff("diskA")));

        let err = registry.add(tiff("diskA")).unwrap_err();
        assert!(matches!(err, BrokerError::DuplicatePolicy(_)), "{err}");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn first_registered_match_wins() {
        let mut registry = PolicyRegistry::new();
        registry.add(tiff("diskA")).unwrap();
        registry.add(tiff("diskB")).unwrap();

        for _ in 0..10 {
            assert_eq!(registry.evaluate(&mime("image/tiff")).unwrap(), "diskA");
        }
    }

    #[test]
    fn unmatched_attributes_report_no_policy() {
        let mut registry = PolicyRegistry::new();
        registry.add(tiff("diskA")).unwrap();

        let err = registry.evaluate(&mime("application/pdf")).unwrap_err();
        assert!(err.is_no_match(), "{err}");
        assert!(err.to_string().contains("application/pdf"));
    }

    #[test]
    fn clear_resets_everything() {
        let mut registry = PolicyRegistry::new();
        registry.add(tiff("diskA")).unwrap();
        registry.add(Policy::new(MIME_TYPE_CLASSIFICATION, "image/png", "diskC")).unwrap();
        registry.clear();

        assert!(registry.is_empty());
        assert!(!registry.contains(&tiff("diskA")));
        assert!(registry.evaluate(&mime("image/tiff")).unwrap_err().is_no_match());
        assert!(registry.evaluate(&mime("image/png")).unwrap_err().is_no_match());

        registry.add(tiff("diskA")).unwrap();
    }

    #[test]
    fn describe_uses_sentinel_when_empty() {
        let registry = PolicyRegistry::new();
        let listing = registry.describe();
        assert_eq!(listing, PolicyListing::NoPolicies);
        assert_eq!(listing.to_string(), NO_POLICIES_SENTINEL);
        assert_eq!(
            serde_json::to_value(&listing).unwrap(),
            serde_json::json!(NO_POLICIES_SENTINEL)
        );
    }

    #[test]
    fn describe_keeps_insertion_order() {
        let mut registry = PolicyRegistry::new();
        registry.add(Policy::new(MIME_TYPE_CLASSIFICATION, "image/png", "diskC")).unwrap();
        registry.add(tiff("diskA")).unwrap();

        let listing = registry.describe();
        assert_eq!(
            listing.to_string(),
            "mix:mimeType image/png -> diskC\nmix:mimeType image/tiff -> diskA"
        );
        let json = serde_json::to_value(&listing).unwrap();
        assert_eq!(json[0]["match_value"], "image/png");
        assert_eq!(json[1]["storage_hint"], "diskA");
    }

    #[test]
    fn remove_classification_only_touches_that_key() {
        let mut registry = PolicyRegistry::new();
        registry.add(tiff("diskA")).unwrap();
        registry.add(Policy::new("nt:file", "x/y", "diskB")).unwrap();
        registry.add(tiff("diskB")).unwrap();

        let removed = registry.remove_classification(MIME_TYPE_CLASSIFICATION);
        assert_eq!(removed, vec![tiff("diskA"), tiff("diskB")]);
        assert_eq!(registry.len(), 1);
        assert!(!registry.has_classification(MIME_TYPE_CLASSIFICATION));
        assert!(registry.has_classification("nt:file"));
        registry.add(tiff("diskA")).unwrap();
    }
}
