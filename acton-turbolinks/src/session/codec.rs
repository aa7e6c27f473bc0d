//! Authenticated cookie codec
//!
//! The session store never sees raw cookie bytes: values are round-tripped
//! through a [`CookieCodec`], which must fail closed when a token has been
//! modified by the client.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use cookie::{Cookie, CookieJar, Key};
use serde_json::{Map, Value};

use crate::error::CodecError;

/// Key/value map carried inside an authenticated cookie
pub type CookieValues = Map<String, Value>;

/// Encode/decode capability for authenticated cookie values
///
/// Implementations are stateless and shared across concurrent requests.
pub trait CookieCodec: Send + Sync {
    /// Encode `values` into a token bound to the cookie `name`
    fn encode(&self, name: &str, values: &CookieValues) -> Result<String, CodecError>;

    /// Decode a token previously produced by [`encode`](Self::encode)
    ///
    /// Any modification of the token must produce an error.
    fn decode(&self, name: &str, token: &str) -> Result<CookieValues, CodecError>;
}

/// HMAC-SHA256 signed codec backed by the `cookie` crate's signed jar
///
/// The value map is serialized to JSON and base64url encoded so the token is
/// safe to place in a `Set-Cookie` header without quoting.
#[derive(Clone)]
pub struct SignedCookieCodec {
    key: Key,
}

impl std::fmt::Debug for SignedCookieCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignedCookieCodec")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl SignedCookieCodec {
    /// Create a codec signing with `key`
    #[must_use]
    pub const fn new(key: Key) -> Self {
        Self { key }
    }
}

impl CookieCodec for SignedCookieCodec {
    fn encode(&self, name: &str, values: &CookieValues) -> Result<String, CodecError> {
        let json = serde_json::to_vec(values).map_err(CodecError::Serialize)?;
        let payload = URL_SAFE_NO_PAD.encode(json);

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key)
            .add(Cookie::new(name.to_string(), payload));

        jar.get(name)
            .map(|cookie| cookie.value().to_string())
            .ok_or_else(|| CodecError::Malformed(name.to_string()))
    }

    fn decode(&self, name: &str, token: &str) -> Result<CookieValues, CodecError> {
        let mut jar = CookieJar::new();
        jar.add_original(Cookie::new(name.to_string(), token.to_string()));

        let verified = jar
            .signed(&self.key)
            .get(name)
            .ok_or(CodecError::InvalidSignature)?;

        let json = URL_SAFE_NO_PAD.decode(verified.value())?;
        serde_json::from_slice(&json).map_err(CodecError::Deserialize)
    }
}
