//! Error types and error handling
//!
//! Only construction-time APIs (configuration loading, key decoding) return
//! [`TurbolinksError`]. Per-request failures are absorbed by the middleware and
//! degrade to "behave as if Turbolinks were absent".

use thiserror::Error;

/// Framework error type
#[derive(Debug, Error)]
pub enum TurbolinksError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration could not be extracted from its sources
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// Signing key material is unusable
    #[error("Invalid signing key: {0}")]
    InvalidKey(String),
}

impl From<figment::Error> for TurbolinksError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

/// Errors produced by a [`CookieCodec`](crate::session::CookieCodec)
///
/// A decode error of any kind means "no pending value"; the middleware never
/// surfaces these to the client.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value map could not be serialized
    #[error("failed to serialize cookie values: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The authenticated payload was not a JSON object
    #[error("failed to deserialize cookie values: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// The payload was not valid base64
    #[error("invalid cookie encoding: {0}")]
    Encoding(#[from] base64::DecodeError),

    /// The signature did not verify (tampered, truncated or foreign key)
    #[error("cookie signature verification failed")]
    InvalidSignature,

    /// The signed jar produced no cookie for the given name
    #[error("cookie `{0}` could not be signed")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_error_messages() {
        assert_eq!(
            CodecError::InvalidSignature.to_string(),
            "cookie signature verification failed"
        );
        assert_eq!(
            CodecError::Malformed("_turbolinks_location".to_string()).to_string(),
            "cookie `_turbolinks_location` could not be signed"
        );
    }

    #[test]
    fn test_invalid_key_message() {
        let err = TurbolinksError::InvalidKey("too short".to_string());
        assert_eq!(err.to_string(), "Invalid signing key: too short");
    }
}
