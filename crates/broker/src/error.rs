//! Error taxonomy for decision point operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("unsupported classification: {0}")]
    UnsupportedClassification(String),
    #[error("policy already exists: {0}")]
    DuplicatePolicy(String),
    #[error("storage policy not found: {0}")]
    NotFound(String),
    #[error("no storage policy matches: {0}")]
    NoPolicyFound(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("persistence failure: {0}")]
    Persistence(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl BrokerError {
    pub(crate) fn persistence(err: anyhow::Error) -> Self {
        Self::Persistence(format!("{:#}", err))
    }

    /// Errors caused by caller input rather than broker or store state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedClassification(_) | Self::InvalidArgument(_)
        )
    }

    /// An evaluation miss; callers with a fallback location treat this as normal.
    pub fn is_no_match(&self) -> bool {
        matches!(self, Self::NoPolicyFound(_))
    }
}

pub type BrokerResult<T> = Result<T, BrokerError>;
