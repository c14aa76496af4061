use thiserror::Error;

/// Reasons a single prediction request can fail.
///
/// Every variant aborts the whole request; the caller collapses them into
/// the `("Invalid Input", 0)` sentinel.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PredictError {
    #[error("invalid value {value:?} for {field}")]
    InvalidCategory { field: &'static str, value: String },

    #[error("cannot parse {field}: {reason}")]
    Parse { field: &'static str, reason: String },

    #[error("artifact failure: {0}")]
    Artifact(String),
}

impl PredictError {
    pub(crate) fn parse(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Parse {
            field,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PredictError>;
