//! Decision point state: the active policy set and its durable mirror.

use crate::classifier::AttributeClassifier;
use crate::error::{BrokerError, BrokerResult};
use crate::policy::{Policy, PolicyFactory, ResourceAttributes};
use crate::registry::{PolicyListing, PolicyRegistry};
use crate::store::{PolicyRecord, PolicyStore};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

/// Answers "where should this binary be stored?".
///
/// The in-memory registry is the source of truth at runtime; the store is
/// consulted only by [`DecisionPoint::open`]. Mutations hold the registry
/// write lock across the store call, and the store is written before the
/// registry, so a failed write leaves the registry untouched.
pub struct DecisionPoint {
    registry: RwLock<PolicyRegistry>,
    store: Arc<dyn PolicyStore>,
    classifier: Arc<dyn AttributeClassifier>,
    factory: PolicyFactory,
}

impl DecisionPoint {
    /// An empty decision point. The store is not read.
    pub fn new(
        store: Arc<dyn PolicyStore>,
        classifier: Arc<dyn AttributeClassifier>,
        factory: PolicyFactory,
    ) -> Self {
        Self {
            registry: RwLock::new(PolicyRegistry::new()),
            store,
            classifier,
            factory,
        }
    }

    /// Rebuild the policy set from `store`.
    ///
    /// Records whose classification is no longer supported are skipped so a
    /// stale store cannot block startup.
    pub fn open(
        store: Arc<dyn PolicyStore>,
        classifier: Arc<dyn AttributeClassifier>,
        factory: PolicyFactory,
    ) -> BrokerResult<Self> {
        let records = store.load().map_err(BrokerError::persistence)?;
        let decision_point = Self::new(store, classifier, factory);
        {
            let mut registry = decision_point.write_registry()?;
            for record in records {
                match decision_point.rebuild(&record) {
                    Ok(policy) => {
                        if let Err(err) = registry.add(policy) {
                            warn!("Skipping stored policy: {}", err);
                        }
                    }
                    Err(err) => warn!(
                        "Skipping stored policy for {}: {}",
                        record.classification, err
                    ),
                }
            }
            info!("Loaded {} storage policies", registry.len());
        }
        Ok(decision_point)
    }

    fn rebuild(&self, record: &PolicyRecord) -> BrokerResult<Policy> {
        self.create_policy(
            &record.classification,
            &record.match_value,
            &record.storage_hint,
        )
    }

    fn read_registry(&self) -> BrokerResult<RwLockReadGuard<'_, PolicyRegistry>> {
        self.registry
            .read()
            .map_err(|e| {
                BrokerError::Internal(format!("Failed to acquire policy read lock: {}", e))
            })
    }

    fn write_registry(&self) -> BrokerResult<RwLockWriteGuard<'_, PolicyRegistry>> {
        self.registry
            .write()
            .map_err(|e| {
                BrokerError::Internal(format!("Failed to acquire policy write lock: {}", e))
            })
    }

    /// Validate the classification and build a policy through its family.
    /// Never touches the registry.
    pub fn create_policy(
        &self,
        classification: &str,
        match_value: &str,
        storage_hint: &str,
    ) -> BrokerResult<Policy> {
        if !self.classifier.accepts(classification) {
            return Err(BrokerError::UnsupportedClassification(format!(
                "Invalid property type specified: {}",
                classification
            )));
        }
        self.factory.build(classification, match_value, storage_hint)
    }

    /// Add `policy` unless an equal one is present. The duplicate check,
    /// the store write and the insert happen under one write lock.
    ///
    /// Policies built outside [`DecisionPoint::create_policy`] are validated
    /// again here, since only a valid policy round-trips through the store.
    pub fn add_policy(&self, policy: Policy) -> BrokerResult<()> {
        self.create_policy(
            policy.classification(),
            policy.match_value(),
            policy.storage_hint(),
        )?;

        let mut registry = self.write_registry()?;
        if registry.contains(&policy) {
            return Err(BrokerError::DuplicatePolicy(policy.to_string()));
        }

        self.store
            .persist(
                policy.classification(),
                policy.match_value(),
                policy.storage_hint(),
            )
            .map_err(|err| {
                warn!("Failed to persist policy {}: {:#}", policy, err);
                BrokerError::persistence(err)
            })?;

        info!("Added storage policy: {}", policy);
        registry.add(policy)
    }

    /// Remove every policy for `classification` along with its durable property.
    pub fn remove_policy(&self, classification: &str) -> BrokerResult<()> {
        if !self.classifier.accepts(classification) {
            return Err(BrokerError::UnsupportedClassification(format!(
                "Invalid property type specified: {}",
                classification
            )));
        }

        let mut registry = self.write_registry()?;
        let durable = self
            .store
            .property(classification)
            .map_err(BrokerError::persistence)?;
        if durable.is_none() && !registry.has_classification(classification) {
            return Err(BrokerError::NotFound(classification.to_string()));
        }

        self.store
            .remove_property(classification)
            .map_err(BrokerError::persistence)?;
        let removed = registry.remove_classification(classification);
        info!(
            "Removed storage policy property {} ({} in memory)",
            classification,
            removed.len()
        );
        Ok(())
    }

    /// Remove all policies. On a store failure the registry keeps its
    /// contents and any partially cleared properties are restored.
    pub fn clear(&self) -> BrokerResult<()> {
        let mut registry = self.write_registry()?;
        let snapshot = self.store.load().map_err(BrokerError::persistence)?;

        if let Err(err) = self.store.clear() {
            warn!("Failed to clear policy store: {:#}", err);
            for record in &snapshot {
                if let Err(restore_err) = self.store.persist(
                    &record.classification,
                    &record.match_value,
                    &record.storage_hint,
                ) {
                    warn!(
                        "Failed to restore property {}: {:#}",
                        record.classification, restore_err
                    );
                }
            }
            return Err(BrokerError::persistence(err));
        }

        registry.clear();
        info!("Cleared all storage policies");
        Ok(())
    }

    pub fn contains(&self, policy: &Policy) -> BrokerResult<bool> {
        Ok(self.read_registry()?.contains(policy))
    }

    pub fn is_empty(&self) -> BrokerResult<bool> {
        Ok(self.read_registry()?.is_empty())
    }

    /// Storage hint of the first registered policy matching `attributes`.
    pub fn evaluate(&self, attributes: &ResourceAttributes) -> BrokerResult<String> {
        let registry = self.read_registry()?;
        match registry.find(attributes) {
            Some(policy) => {
                debug!("Matched {} for {}", policy, attributes);
                Ok(policy.storage_hint().to_string())
            }
            None => {
                debug!("No storage policy for {}", attributes);
                Err(BrokerError::NoPolicyFound(attributes.to_string()))
            }
        }
    }

    pub fn describe(&self) -> BrokerResult<PolicyListing> {
        Ok(self.read_registry()?.describe())
    }

    /// Durable `"<match value>:<storage hint>"` value stored for `classification`.
    pub fn stored_property(&self, classification: &str) -> BrokerResult<String> {
        debug!("Get storage policy for: {}", classification);
        self.store
            .property(classification)
            .map_err(BrokerError::persistence)?
            .ok_or_else(|| BrokerError::NotFound(classification.to_string()))
    }

    #[cfg(test)]
    pub(crate) fn registry_lock(&self) -> &RwLock<PolicyRegistry> {
        &self.registry
    }
}
