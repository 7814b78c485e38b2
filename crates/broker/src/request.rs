//! Transport-agnostic request layer over a [`DecisionPointHandle`].

use crate::error::{BrokerError, BrokerResult};
use crate::handle::DecisionPointHandle;
use crate::policy::ResourceAttributes;
use crate::registry::PolicyListing;
use tracing::debug;

/// Name of the collection resource that accepts new policies.
pub const POLICY_RESOURCE: &str = "policies";

const ADD_ARG_COUNT: usize = 3;

/// A parsed `"<classification> <match value> <storage hint>"` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    pub classification: String,
    pub match_value: String,
    pub storage_hint: String,
}

impl AddRequest {
    pub fn parse(body: &str) -> BrokerResult<Self> {
        let parts: Vec<&str> = body.split_whitespace().collect();
        match parts.as_slice() {
            [classification, match_value, storage_hint] => Ok(Self {
                classification: classification.to_string(),
                match_value: match_value.to_string(),
                storage_hint: storage_hint.to_string(),
            }),
            _ => Err(BrokerError::InvalidArgument(format!(
                "Invalid Arg: expected {} fields '<classification> <match value> <storage hint>', got {}",
                ADD_ARG_COUNT,
                parts.len()
            ))),
        }
    }
}

/// Parse a `key=value` resource attribute. The key may itself contain `:`.
pub fn parse_attribute(raw: &str) -> BrokerResult<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() && !value.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(BrokerError::InvalidArgument(format!(
            "expected KEY=VALUE attribute, got '{}'",
            raw
        ))),
    }
}

#[derive(Debug, Clone)]
pub enum PolicyRequest {
    /// Add a policy; `resource` must name the policy collection.
    Add { resource: String, body: String },
    Remove { classification: String },
    /// Collection name lists everything; any other name reads one stored property.
    Get { resource: String },
    List,
    Evaluate { attributes: ResourceAttributes },
    Clear,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyResponse {
    Created { classification: String },
    Removed,
    Cleared,
    Listing(PolicyListing),
    Property(String),
    Hint(String),
}

pub fn handle_request(
    decision_point: &DecisionPointHandle,
    request: PolicyRequest,
) -> BrokerResult<PolicyResponse> {
    match request {
        PolicyRequest::Add { resource, body } => {
            debug!("Add received request body: {}", body);
            if !resource.eq_ignore_ascii_case(POLICY_RESOURCE) {
                return Err(BrokerError::InvalidArgument(format!(
                    "add not allowed on '{}', try '{}'",
                    resource, POLICY_RESOURCE
                )));
            }
            let add = AddRequest::parse(&body)?;
            let policy = decision_point.create_policy(
                &add.classification,
                &add.match_value,
                &add.storage_hint,
            )?;
            decision_point.add_policy(policy)?;
            Ok(PolicyResponse::Created {
                classification: add.classification,
            })
        }
        PolicyRequest::Remove { classification } => {
            decision_point.remove_policy(&classification)?;
            Ok(PolicyResponse::Removed)
        }
        PolicyRequest::Get { resource } => {
            if resource.eq_ignore_ascii_case(POLICY_RESOURCE) {
                Ok(PolicyResponse::Listing(decision_point.list_policies()?))
            } else {
                Ok(PolicyResponse::Property(
                    decision_point.stored_property(&resource)?,
                ))
            }
        }
        PolicyRequest::List => Ok(PolicyResponse::Listing(decision_point.list_policies()?)),
        PolicyRequest::Evaluate { attributes } => {
            Ok(PolicyResponse::Hint(decision_point.evaluate(&attributes)?))
        }
        PolicyRequest::Clear => {
            decision_point.clear()?;
            Ok(PolicyResponse::Cleared)
        }
    }
}
