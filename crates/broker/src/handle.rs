//! Cloneable handle passed to request handlers.

use crate::broker::DecisionPoint;
use crate::classifier::{AttributeClassifier, NodeTypeClassifier};
use crate::error::BrokerResult;
use crate::policy::{Policy, PolicyFactory, ResourceAttributes};
use crate::registry::PolicyListing;
use crate::store::{InMemoryPolicyStore, PolicyStore, YamlPolicyStore};
use std::sync::Arc;
use storage_policy_common::PolicySettings;
use tracing::info;

#[derive(Clone)]
pub struct DecisionPointHandle {
    inner: Arc<DecisionPoint>,
}

impl DecisionPointHandle {
    pub fn new(decision_point: DecisionPoint) -> Self {
        Self {
            inner: Arc::new(decision_point),
        }
    }

    /// Build from settings: YAML store at the configured path, classifier
    /// from the configured type names, built-in policy families.
    pub fn from_settings(settings: &PolicySettings) -> BrokerResult<Self> {
        let store_path = settings
            .resolved_store_path()
            .map_err(crate::BrokerError::persistence)?;
        info!("Opening policy store at {:?}", store_path);
        let store: Arc<dyn PolicyStore> = Arc::new(YamlPolicyStore::new(store_path));
        let classifier: Arc<dyn AttributeClassifier> =
            Arc::new(NodeTypeClassifier::from_settings(settings));
        let decision_point = DecisionPoint::open(store, classifier, PolicyFactory::new())?;
        Ok(Self::new(decision_point))
    }

    /// Independent instance with an in-memory store and default settings.
    pub fn in_memory() -> Self {
        let classifier = NodeTypeClassifier::from_settings(&PolicySettings::default());
        Self::new(DecisionPoint::new(
            Arc::new(InMemoryPolicyStore::new()),
            Arc::new(classifier),
            PolicyFactory::new(),
        ))
    }

    pub fn create_policy(
        &self,
        classification: &str,
        match_value: &str,
        storage_hint: &str,
    ) -> BrokerResult<Policy> {
        self.inner
            .create_policy(classification, match_value, storage_hint)
    }

    pub fn add_policy(&self, policy: Policy) -> BrokerResult<()> {
        self.inner.add_policy(policy)
    }

    pub fn remove_policy(&self, classification: &str) -> BrokerResult<()> {
        self.inner.remove_policy(classification)
    }

    pub fn clear(&self) -> BrokerResult<()> {
        self.inner.clear()
    }

    pub fn contains(&self, policy: &Policy) -> BrokerResult<bool> {
        self.inner.contains(policy)
    }

    pub fn is_empty(&self) -> BrokerResult<bool> {
        self.inner.is_empty()
    }

    pub fn evaluate(&self, attributes: &ResourceAttributes) -> BrokerResult<String> {
        self.inner.evaluate(attributes)
    }

    pub fn list_policies(&self) -> BrokerResult<PolicyListing> {
        self.inner.describe()
    }

    pub fn stored_property(&self, classification: &str) -> BrokerResult<String> {
        self.inner.stored_property(classification)
    }
}
