//! Configuration management for acton-turbolinks
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `TURBOLINKS_` prefix)
//! 2. `./turbolinks.toml` (development)
//! 3. `~/.config/acton-turbolinks/config.toml` (user config, XDG)
//! 4. `/etc/acton-turbolinks/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # turbolinks.toml
//! cookie_name = "_turbolinks_location"
//! secret_key = "<base64 encoded, at least 64 bytes>"
//! detect_xhr = true
//! root_relative_internal = true
//! cross_host_root_path_internal = false
//! trust_forwarded_proto = true
//! secure_cookies = true
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use acton_turbolinks::config::TurbolinksConfig;
//!
//! # fn example() -> Result<(), acton_turbolinks::error::TurbolinksError> {
//! let config = TurbolinksConfig::load()?;
//! let key = config.signing_key()?;
//! # Ok(())
//! # }
//! ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use cookie::Key;
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::TurbolinksError;
use crate::headers::LOCATION_COOKIE_NAME;

/// Number of random bytes in a generated signing key
const GENERATED_KEY_LEN: usize = 64;

/// Turbolinks middleware configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TurbolinksConfig {
    /// Name of the pending-redirect cookie
    pub cookie_name: String,

    /// Base64 encoded cookie signing key (at least 64 bytes once decoded)
    ///
    /// Instances sharing this key can replay each other's pending redirects.
    /// When unset, a random key is generated at layer construction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Treat `X-Requested-With: XMLHttpRequest` alone as a Turbolinks request
    pub detect_xhr: bool,

    /// Treat root-relative redirect targets (`/path`) as internal even when
    /// the referrer host differs (e.g. behind a proxy)
    pub root_relative_internal: bool,

    /// Treat absolute redirect targets on another host as internal when their
    /// path starts with `/` (e.g. a proxy exposing a backend host name)
    pub cross_host_root_path_internal: bool,

    /// Honour `X-Forwarded-Proto: https` when deciding the cookie `Secure` flag
    pub trust_forwarded_proto: bool,

    /// Force the cookie `Secure` flag on (`true`) or off (`false`)
    ///
    /// Servers terminating TLS themselves see origin-form request URIs
    /// without a scheme and should set this to `true`. When unset, the flag
    /// follows the request scheme and `X-Forwarded-Proto`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secure_cookies: Option<bool>,
}

impl Default for TurbolinksConfig {
    fn default() -> Self {
        Self {
            cookie_name: LOCATION_COOKIE_NAME.to_string(),
            secret_key: None,
            detect_xhr: true,
            root_relative_internal: true,
            cross_host_root_path_internal: false,
            trust_forwarded_proto: true,
            secure_cookies: None,
        }
    }
}

impl TurbolinksConfig {
    /// Load configuration from the standard locations
    ///
    /// Precedence, highest first: `TURBOLINKS_*` environment variables,
    /// `./turbolinks.toml`, the XDG user config, `/etc/acton-turbolinks/config.toml`,
    /// defaults.
    pub fn load() -> Result<Self, TurbolinksError> {
        let mut figment = Figment::new().merge(Toml::string(&Self::defaults_toml()?));

        let system_config = PathBuf::from("/etc/acton-turbolinks/config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        let user_config = Self::recommended_path();
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        let local_config = PathBuf::from("./turbolinks.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        figment = figment.merge(Env::prefixed("TURBOLINKS_").lowercase(true));

        Ok(figment.extract()?)
    }

    /// Load configuration from a specific file
    ///
    /// Environment variables still override values from the file.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use acton_turbolinks::config::TurbolinksConfig;
    ///
    /// # fn example() -> Result<(), acton_turbolinks::error::TurbolinksError> {
    /// let config = TurbolinksConfig::load_from("./config/production.toml")?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, TurbolinksError> {
        let config = Figment::new()
            .merge(Toml::string(&Self::defaults_toml()?))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("TURBOLINKS_").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Get the recommended XDG config path
    ///
    /// Returns `~/.config/acton-turbolinks/config.toml` where a config
    /// directory is known, `./turbolinks.toml` otherwise.
    #[must_use]
    pub fn recommended_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./turbolinks.toml"),
            |config_dir| config_dir.join("acton-turbolinks").join("config.toml"),
        )
    }

    /// Signing key for the pending-redirect cookie
    ///
    /// Decodes [`secret_key`](Self::secret_key) when present. Otherwise a
    /// fresh random key is generated, which means pending redirects do not
    /// survive a restart and are not shared between instances.
    pub fn signing_key(&self) -> Result<Key, TurbolinksError> {
        let Some(secret) = &self.secret_key else {
            tracing::warn!(
                "No turbolinks secret_key configured; generating an ephemeral signing key"
            );
            return Ok(generate_key());
        };

        let bytes = STANDARD
            .decode(secret.trim())
            .map_err(|e| TurbolinksError::InvalidKey(e.to_string()))?;

        Key::try_from(bytes.as_slice()).map_err(|e| TurbolinksError::InvalidKey(e.to_string()))
    }

    /// Generate a random base64 encoded secret suitable for [`secret_key`](Self::secret_key)
    #[must_use]
    pub fn generate_secret() -> String {
        let mut bytes = [0u8; GENERATED_KEY_LEN];
        OsRng.fill_bytes(&mut bytes);
        STANDARD.encode(bytes)
    }

    fn defaults_toml() -> Result<String, TurbolinksError> {
        toml::to_string(&Self::default()).map_err(|e| TurbolinksError::Config(e.to_string()))
    }
}

/// Generate a random signing key from the OS RNG
#[must_use]
pub fn generate_key() -> Key {
    let mut bytes = [0u8; GENERATED_KEY_LEN];
    OsRng.fill_bytes(&mut bytes);
    Key::from(bytes.as_slice())
}
