//! Gateway-level error type.

use thiserror::Error;

/// Why a translation call did not produce a usable result.
///
/// Callers never show this to the end user directly; they degrade to the
/// placeholders in [`crate::fallback`]. [`TranslationFailure::is_retryable`]
/// decides whether the call is worth repeating first.
#[derive(Debug, Error)]
pub enum TranslationFailure {
    /// No API key is configured, so no request was sent.
    #[error("no API key configured for the translation service")]
    MissingCredential,

    /// The client configuration cannot be used (e.g. a non-HTTP model URL).
    #[error("invalid gateway configuration: {0}")]
    InvalidConfig(String),

    /// Transport-level failure: connect error, timeout, TLS, ...
    #[error("translation request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("translation service returned status {status}: {message}")]
    Api { status: u16, message: String },

    /// The service answered, but not with anything we can parse.
    #[error("malformed translation response: {0}")]
    MalformedResponse(String),

    /// Transient unavailability reported by a gateway that is not HTTP-backed.
    #[error("translation service unavailable: {0}")]
    Unavailable(String),
}

impl TranslationFailure {
    /// Transport errors, throttling and server-side failures are transient;
    /// everything else fails the same way on every attempt.
    pub fn is_retryable(&self) -> bool {
        match self {
            TranslationFailure::Http(err) => err.is_timeout() || err.is_connect(),
            TranslationFailure::Api { status, .. } => *status == 429 || *status >= 500,
            TranslationFailure::Unavailable(_) => true,
            TranslationFailure::MissingCredential
            | TranslationFailure::InvalidConfig(_)
            | TranslationFailure::MalformedResponse(_) => false,
        }
    }
}

impl From<serde_json::Error> for TranslationFailure {
    fn from(err: serde_json::Error) -> Self {
        TranslationFailure::MalformedResponse(err.to_string())
    }
}
