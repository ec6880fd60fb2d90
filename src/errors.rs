use thiserror::Error;

/// Error taxonomy for cart and checkout operations.
///
/// Stock insufficiency is deliberately absent: it is reported through the
/// [`QuantityCheck`](crate::cart::QuantityCheck) outcome, never as an error.
#[derive(Error, Debug)]
pub enum CartError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Session codec error: {0}")]
    CodecError(#[from] serde_json::Error),

    #[error("Event error: {0}")]
    EventError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl CartError {
    /// Stable machine-readable code for logs and host error mapping.
    pub fn code(&self) -> &'static str {
        match self {
            CartError::NotFound(_) => "not_found",
            CartError::ValidationError(_) => "validation_error",
            CartError::InvalidOperation(_) => "invalid_operation",
            CartError::InvalidInput(_) => "invalid_input",
            CartError::CodecError(_) => "codec_error",
            CartError::EventError(_) => "event_error",
            CartError::ConfigError(_) => "config_error",
            CartError::InternalError(_) => "internal_error",
        }
    }
}
