use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Value out of range for {what}: {value} ({reason})")]
    OutOfRange {
        what: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },
}
