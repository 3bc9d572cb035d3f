//! Core types for modpm
//!
//! This module holds the error model shared by every other module:
//! - **Strongly-typed errors** ([`ModpmError`]) for precise handling in code and tests
//! - **User-friendly contexts** ([`ErrorContext`]) with actionable suggestions for CLI users
//! - [`user_friendly_error`] to convert any `anyhow::Error` for display
//!
//! Planners return `anyhow::Result<T>` and raise [`ModpmError`] through it:
//!
//! ```rust
//! use modpm::core::ModpmError;
//!
//! fn refuse(name: &str) -> anyhow::Result<()> {
//!     Err(ModpmError::InvalidTarget {
//!         name: name.to_string(),
//!         reason: "the base game cannot be uninstalled".to_string(),
//!     }
//!     .into())
//! }
//!
//! let err = refuse("base").unwrap_err();
//! assert!(matches!(err.downcast_ref::<ModpmError>(), Some(ModpmError::InvalidTarget { .. })));
//! ```

pub mod error;

pub use error::{ErrorContext, IntoAnyhowWithContext, ModpmError, user_friendly_error};
