//! Testing utilities for Turbolinks responses
//!
//! Assertion helpers for the protocol headers and the pending-redirect
//! cookie, used by the middleware tests.
//!
//! # Example
//!
//! ```rust,ignore
//! let response = app.oneshot(request).await.unwrap();
//! assert_turbolinks_location(&response, "/dashboard");
//! ```

pub mod assertions;

pub use assertions::*;
