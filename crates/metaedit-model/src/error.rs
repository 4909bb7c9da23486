use thiserror::Error;

/// Errors raised by the record/provider layer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("model id `{raw}` is invalid: {reason}")]
    InvalidModelId { raw: String, reason: String },
    #[error("no data provider registered for `{0}`")]
    UnknownProvider(String),
    #[error("data provider `{provider}` failed: {message}")]
    Provider { provider: String, message: String },
    #[error("model of provider `{provider}` has no id")]
    MissingId { provider: String },
}
