//! Error types for simulation operations.

use thiserror::Error;
use tn_core::CoreError;
use tn_network::NetworkError;

/// Errors encountered while setting up or running a simulation.
#[derive(Error, Debug)]
pub enum SimError {
    #[error("Invalid parameter {what}: {reason}")]
    InvalidParameter { what: String, reason: String },

    #[error("Unknown signal: {name}")]
    UnknownSignal { name: String },

    #[error("Signal already registered: {name}")]
    DuplicateSignal { name: String },

    #[error("Signal log is sealed; the run has ended")]
    LogSealed,

    #[error("Sample time {time} does not follow previous sample at {previous}")]
    NonMonotonicTime { previous: f64, time: f64 },

    #[error("Non-finite heat flow {value} W at t = {time} s")]
    NonFiniteSource { time: f64, value: f64 },

    #[error("Integration diverged after t = {time} s: {reason}")]
    IntegrationDiverged {
        /// Last accepted time.
        time: f64,
        /// Node temperatures (K) at `time`, indexed by node ID.
        state: Vec<f64>,
        reason: String,
    },

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;

impl SimError {
    pub(crate) fn invalid(what: impl Into<String>, reason: impl Into<String>) -> Self {
        SimError::InvalidParameter {
            what: what.into(),
            reason: reason.into(),
        }
    }
}

impl From<CoreError> for SimError {
    fn from(err: CoreError) -> Self {
        let what = match &err {
            CoreError::NonFinite { what, .. }
            | CoreError::OutOfRange { what, .. }
            | CoreError::InvalidArg { what } => *what,
        };
        SimError::invalid(what, err.to_string())
    }
}
