//! Storage policy decision point.
//!
//! Holds the active set of storage policies, matches a resource's attributes
//! against them in registration order, and mirrors every mutation into a
//! durable [`PolicyStore`].

mod broker;
mod classifier;
mod error;
mod handle;
mod policy;
mod registry;
pub mod request;
mod store;

pub use broker::DecisionPoint;
pub use classifier::{AttributeClassifier, NodeTypeClassifier};
pub use error::{BrokerError, BrokerResult};
pub use handle::DecisionPointHandle;
pub use policy::{
    MimeTypePolicyFamily, Policy, PolicyFactory, PolicyFamily, ResourceAttributes,
    MIME_TYPE_CLASSIFICATION,
};
pub use registry::{PolicyListing, PolicyRegistry, NO_POLICIES_SENTINEL};
pub use store::{InMemoryPolicyStore, PolicyRecord, PolicyStore, YamlPolicyStore};
