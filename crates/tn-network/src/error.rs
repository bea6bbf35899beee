//! Network construction and validation errors.

use tn_core::CoreError;

/// Errors raised while building or validating a thermal network.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum NetworkError {
    #[error("Duplicate node id: {id}")]
    DuplicateNode { id: String },

    #[error("Unknown node id: {id}")]
    UnknownNode { id: String },

    #[error("Invalid parameter {what}: {reason}")]
    InvalidParameter { what: String, reason: String },

    #[error("Node {id} has no conductive path to a reference node")]
    DisconnectedNetwork { id: String },

    #[error("Network has no reference node")]
    NoReference,

    #[error(
        "Reference nodes disagree on temperature: {first} = {first_k} K, {second} = {second_k} K"
    )]
    MultipleReferenceTemperatures {
        first: String,
        first_k: f64,
        second: String,
        second_k: f64,
    },
}

pub type NetworkResult<T> = Result<T, NetworkError>;

impl NetworkError {
    pub(crate) fn invalid(what: impl Into<String>, reason: impl Into<String>) -> Self {
        NetworkError::InvalidParameter {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

impl From<CoreError> for NetworkError {
    fn from(err: CoreError) -> Self {
        let what = match &err {
            CoreError::NonFinite { what, .. }
            | CoreError::OutOfRange { what, .. }
            | CoreError::InvalidArg { what } => *what,
        };
        NetworkError::invalid(what, err.to_string())
    }
}
