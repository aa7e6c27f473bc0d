//! Observability (logging and tracing)
//!
//! The middleware emits `tracing` events for every redirect decision; this
//! module installs a subscriber for applications that do not bring their own.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the tracing subscriber
///
/// Sets up:
/// - Pretty formatting in debug builds, JSON in release builds
/// - Log level filtering from `RUST_LOG`
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
///
/// # Example
///
/// ```rust,no_run
/// use acton_turbolinks::observability;
///
/// # fn main() -> anyhow::Result<()> {
/// observability::init()?;
/// tracing::info!("Application started");
/// # Ok(())
/// # }
/// ```
pub fn init() -> anyhow::Result<()> {
    init_with(&ObservabilityConfig::default())
}

/// Initialize the tracing subscriber with explicit settings
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_with(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()?;
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().pretty())
            .try_init()?;
    }

    tracing::debug!(service = %config.service_name, "Tracing initialized");
    Ok(())
}

/// Observability configuration
#[derive(Debug, Clone)]
pub struct ObservabilityConfig {
    /// Service name attached to the startup event
    pub service_name: String,

    /// Emit JSON lines instead of human-readable output
    pub json: bool,

    /// Trace the middleware's redirect decisions when `RUST_LOG` is unset
    pub verbose: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            service_name: "acton-turbolinks".to_string(),
            json: !cfg!(debug_assertions),
            verbose: cfg!(debug_assertions),
        }
    }
}

impl ObservabilityConfig {
    /// Create new observability config
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            ..Default::default()
        }
    }

    /// Emit JSON lines
    #[must_use]
    pub const fn with_json(mut self) -> Self {
        self.json = true;
        self
    }

    /// Emit human-readable output
    #[must_use]
    pub const fn with_pretty(mut self) -> Self {
        self.json = false;
        self
    }

    /// Trace middleware decisions by default
    #[must_use]
    pub const fn with_verbose(mut self) -> Self {
        self.verbose = true;
        self
    }

    fn default_directive(&self) -> &'static str {
        if self.verbose {
            "debug,acton_turbolinks=trace"
        } else {
            "info"
        }
    }
}
