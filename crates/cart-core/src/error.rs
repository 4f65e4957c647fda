//! # Payment Error Types
//!
//! Typed error handling for cart-checkout.
//! Every checkout operation returns `Result<T, PaymentError>`; the HTTP layer
//! maps the variant to a status code and never inspects message text.

use thiserror::Error;

/// Core error type for all checkout operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid shipping table)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Cart body could not be parsed or failed validation
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Payment provider rejected the call
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Network/HTTP error communicating with provider
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Provider answered with a body we could not read
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns true when the caller sent something we refuse to forward
    pub fn is_input_error(&self) -> bool {
        matches!(self, PaymentError::InvalidRequest(_))
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::Configuration(_)
            | PaymentError::ProviderError { .. }
            | PaymentError::NetworkError(_)
            | PaymentError::Serialization(_) => 500,
        }
    }

    /// The bare message returned to the client in `{"error": ...}`.
    ///
    /// Provider messages are passed through verbatim.
    pub fn client_message(&self) -> &str {
        match self {
            PaymentError::Configuration(msg)
            | PaymentError::InvalidRequest(msg)
            | PaymentError::NetworkError(msg)
            | PaymentError::Serialization(msg) => msg,
            PaymentError::ProviderError { message, .. } => message,
        }
    }
}

/// Result type alias for checkout operations
pub type PaymentResult<T> = Result<T, PaymentError>;
