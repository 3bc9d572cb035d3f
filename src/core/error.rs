//! Error handling for modpm
//!
//! This module provides the strongly-typed error enum used across the dependency
//! engine and the user-facing error reporting used by the CLI. The design mirrors
//! two needs:
//! 1. **Strongly-typed errors** so planners and tests can match on the failure kind
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`ModpmError`] - Enumerated error kinds for every fatal condition
//! - [`ErrorContext`] - Wrapper that adds details and suggestions for display
//!
//! Planners return `anyhow::Result` and raise [`ModpmError`] values through it, so
//! callers can either add context with `?` or recover the kind with
//! `error.downcast_ref::<ModpmError>()`.
//!
//! # Error Categories
//!
//! - **Dependency planning**: [`ModpmError::MissingDependency`],
//!   [`ModpmError::VersionMismatch`], [`ModpmError::CircularDependency`],
//!   [`ModpmError::Conflict`], [`ModpmError::DependentsWouldBreak`]
//! - **Targets**: [`ModpmError::InvalidTarget`], [`ModpmError::ModNotInstalled`],
//!   [`ModpmError::InvalidModSpec`]
//! - **Registry**: [`ModpmError::RegistryUnavailable`],
//!   [`ModpmError::RegistryUnavailableTransitive`], [`ModpmError::ReleaseNotFound`],
//!   [`ModpmError::ChecksumMismatch`]
//! - **Parsing and I/O**: [`ModpmError::InvalidVersion`],
//!   [`ModpmError::InvalidDependency`], [`ModpmError::ManifestParseError`],
//!   [`ModpmError::ModListParseError`], [`ModpmError::IoError`], ...
//!
//! # Examples
//!
//! ```rust,no_run
//! use modpm::core::{ModpmError, user_friendly_error};
//!
//! let error = ModpmError::InvalidTarget {
//!     name: "base".to_string(),
//!     reason: "the base game cannot be disabled".to_string(),
//! };
//! let ctx = user_friendly_error(anyhow::Error::from(error));
//! ctx.display();
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for modpm operations
///
/// Every fatal condition the planners can hit has a dedicated variant whose
/// message names the MODs involved and, where applicable, the requirement and
/// the version that failed it.
#[derive(Error, Debug)]
pub enum ModpmError {
    /// A required dependency is absent or not installed
    #[error("MOD '{requester}' requires '{dependency}' ({requirement}), but it is not installed")]
    MissingDependency {
        /// The MOD declaring the dependency
        requester: String,
        /// The MOD that is required
        dependency: String,
        /// The requirement as written in the manifest
        requirement: String,
    },

    /// The resolved version of a dependency does not satisfy the requirement
    #[error(
        "MOD '{requester}' requires '{dependency}' {requirement}, but version {found} is installed"
    )]
    VersionMismatch {
        /// The MOD declaring the dependency
        requester: String,
        /// The MOD that is required
        dependency: String,
        /// The requirement as written in the manifest
        requirement: String,
        /// The version that failed the requirement
        found: String,
    },

    /// One or more dependency cycles among required edges
    ///
    /// Example: A requires B, B requires C, C requires A
    #[error("Circular dependency detected: {chain}")]
    CircularDependency {
        /// String representation of every cycle found
        chain: String,
    },

    /// Two MODs that declare each other incompatible would both be enabled
    #[error("MOD '{mod_a}' is incompatible with '{mod_b}'")]
    Conflict {
        /// The MOD being planned
        mod_a: String,
        /// The enabled or planned MOD it conflicts with
        mod_b: String,
    },

    /// Lifecycle operation not permitted for this MOD
    #[error("Cannot operate on '{name}': {reason}")]
    InvalidTarget {
        /// The requested MOD
        name: String,
        /// Why the operation is not allowed
        reason: String,
    },

    /// The requested MOD (or MOD version) is not installed
    #[error("MOD '{name}' is not installed")]
    ModNotInstalled {
        /// The requested MOD, with version when one was given
        name: String,
    },

    /// An explicitly requested MOD could not be fetched from the registry
    #[error("MOD '{name}' is unavailable from the registry: {reason}")]
    RegistryUnavailable {
        /// The requested MOD
        name: String,
        /// Why the fetch failed
        reason: String,
    },

    /// A discovered dependency could not be fetched from the registry
    ///
    /// Install planning records this as a warning and omits the dependency.
    #[error("Dependency '{name}' of '{requester}' is unavailable from the registry: {reason}")]
    RegistryUnavailableTransitive {
        /// The MOD declaring the dependency
        requester: String,
        /// The dependency that could not be fetched
        name: String,
        /// Why the fetch failed
        reason: String,
    },

    /// No release of a MOD matches the request
    #[error("No release of '{name}' matches {requirement}")]
    ReleaseNotFound {
        /// The MOD name
        name: String,
        /// The version or requirement that nothing matched
        requirement: String,
    },

    /// Removing the requested versions would leave enabled MODs unsatisfied
    #[error("Uninstalling would break enabled MODs: {dependents}")]
    DependentsWouldBreak {
        /// Every broken dependent with the requirement it would lose
        dependents: String,
    },

    /// Downloaded archive does not match the registry checksum
    #[error("Checksum mismatch for {file}: expected sha1 {expected}, got {actual}")]
    ChecksumMismatch {
        /// Archive file name
        file: String,
        /// Checksum published by the registry
        expected: String,
        /// Checksum of the downloaded bytes
        actual: String,
    },

    /// Version string could not be parsed
    #[error("Invalid version '{version}': {reason}")]
    InvalidVersion {
        /// The text that failed to parse
        version: String,
        /// Why it failed
        reason: String,
    },

    /// Dependency string could not be parsed
    #[error("Invalid dependency '{entry}': {reason}")]
    InvalidDependency {
        /// The raw dependency string
        entry: String,
        /// Why it failed
        reason: String,
    },

    /// `name`, `name@version` or `name@latest` could not be parsed
    #[error("Invalid MOD specification '{spec}': {reason}")]
    InvalidModSpec {
        /// The raw specification
        spec: String,
        /// Why it failed
        reason: String,
    },

    /// A MOD manifest could not be read or parsed
    #[error("Invalid MOD manifest in {path}: {reason}")]
    ManifestParseError {
        /// Archive or directory holding the manifest
        path: String,
        /// Why it failed
        reason: String,
    },

    /// The MOD list file could not be parsed
    #[error("Invalid MOD list file {path}: {reason}")]
    ModListParseError {
        /// Path to the MOD list
        path: String,
        /// Why it failed
        reason: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the configuration error
        message: String,
    },

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// Other error
    #[error("{message}")]
    Other {
        /// Generic error message
        message: String,
    },
}

/// Error context wrapper that provides user-friendly error information
///
/// Wraps a [`ModpmError`] with an optional suggestion (what to do) and optional
/// details (why it happened).
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: ModpmError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context without suggestion or details.
    #[must_use]
    pub const fn new(error: ModpmError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors
    ///
    /// - Error message: Red and bold
    /// - Details: Yellow
    /// - Suggestion: Green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Extension trait for converting [`ModpmError`] to [`anyhow::Error`] with context
pub trait IntoAnyhowWithContext {
    /// Convert the error to an [`anyhow::Error`] with the provided context
    fn into_anyhow_with_context(self, context: ErrorContext) -> anyhow::Error;
}

impl IntoAnyhowWithContext for ModpmError {
    fn into_anyhow_with_context(self, context: ErrorContext) -> anyhow::Error {
        anyhow::Error::new(ErrorContext {
            error: self,
            suggestion: context.suggestion,
            details: context.details,
        })
    }
}

/// Convert any error to a user-friendly [`ErrorContext`] with actionable suggestions
///
/// Recognizes [`ModpmError`] anywhere in the chain, I/O errors, and falls back to
/// the full error chain for everything else.
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if error.downcast_ref::<ErrorContext>().is_some() {
        return match error.downcast::<ErrorContext>() {
            Ok(ctx) => ctx,
            Err(error) => generic_context(&error),
        };
    }

    if error.downcast_ref::<ModpmError>().is_some() {
        let message = (error.chain().count() > 1).then(|| error.to_string());
        return match error.downcast::<ModpmError>() {
            Ok(modpm_error) => {
                let ctx = create_error_context(modpm_error);
                // Keep the outermost context message when one was attached
                match message {
                    Some(outer) if ctx.details.is_none() => ctx.with_details(outer),
                    _ => ctx,
                }
            }
            Err(error) => generic_context(&error),
        };
    }

    if let Some(io_error) = error.downcast_ref::<std::io::Error>() {
        match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => {
                return ErrorContext::new(ModpmError::Other {
                    message: error.to_string(),
                })
                .with_suggestion(
                    "Check that you own the mods directory or run with appropriate permissions",
                )
                .with_details("modpm could not read or write a file it needs");
            }
            std::io::ErrorKind::NotFound => {
                return ErrorContext::new(ModpmError::Other {
                    message: error.to_string(),
                })
                .with_suggestion("Check that --mods-dir and --data-dir point to existing directories")
                .with_details("A required file or directory could not be found");
            }
            _ => {}
        }
    }

    generic_context(&error)
}

fn generic_context(error: &anyhow::Error) -> ErrorContext {
    let mut message = error.to_string();
    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(ModpmError::Other {
        message,
    })
}

/// Map each [`ModpmError`] variant to an [`ErrorContext`] with suggestions.
fn create_error_context(error: ModpmError) -> ErrorContext {
    match &error {
        ModpmError::MissingDependency { dependency, .. } => {
            let suggestion = format!("Install it with 'modpm install {dependency}'");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        ModpmError::VersionMismatch { dependency, .. } => {
            let suggestion = format!(
                "Install a compatible version with 'modpm install {dependency}@<version>' or update it with 'modpm update {dependency}'"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        ModpmError::CircularDependency { .. } => ErrorContext::new(error)
            .with_suggestion("Disable or uninstall one of the MODs in the cycle")
            .with_details("Required dependencies cannot depend on themselves directly or indirectly"),
        ModpmError::Conflict { mod_b, .. } => {
            let suggestion = format!("Disable '{mod_b}' first with 'modpm disable {mod_b}'");
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        ModpmError::InvalidTarget { .. } => ErrorContext::new(error)
            .with_details("The base game is always enabled; expansions are managed by the game itself"),
        ModpmError::ModNotInstalled { .. } => ErrorContext::new(error)
            .with_suggestion("Run 'modpm list' to see installed MODs"),
        ModpmError::RegistryUnavailable { .. } => ErrorContext::new(error)
            .with_suggestion("Check the MOD name, your internet connection and the registry credentials in the config file"),
        ModpmError::ReleaseNotFound { .. } => ErrorContext::new(error)
            .with_suggestion("Omit the version to install the latest compatible release"),
        ModpmError::DependentsWouldBreak { .. } => ErrorContext::new(error)
            .with_suggestion("Disable or uninstall the dependent MODs first, or keep a compatible version installed"),
        ModpmError::ChecksumMismatch { .. } => ErrorContext::new(error)
            .with_suggestion("Retry the install; the download may have been corrupted in transit"),
        ModpmError::ManifestParseError { .. } | ModpmError::ModListParseError { .. } => {
            ErrorContext::new(error).with_suggestion("Fix or remove the malformed file and retry")
        }
        _ => ErrorContext::new(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_display_names_mods_and_versions() {
        let error = ModpmError::VersionMismatch {
            requester: "mod-a".to_string(),
            dependency: "mod-b".to_string(),
            requirement: ">= 2.0.0".to_string(),
            found: "1.5.0".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "MOD 'mod-a' requires 'mod-b' >= 2.0.0, but version 1.5.0 is installed"
        );

        let error = ModpmError::Conflict {
            mod_a: "a".to_string(),
            mod_b: "c".to_string(),
        };
        assert_eq!(error.to_string(), "MOD 'a' is incompatible with 'c'");
    }

    #[test]
    fn test_error_context_display() {
        let ctx = ErrorContext::new(ModpmError::ModNotInstalled {
            name: "x".to_string(),
        })
        .with_suggestion("Install it");

        let display = format!("{ctx}");
        assert!(display.contains("MOD 'x' is not installed"));
        assert!(display.contains("Suggestion: Install it"));
    }

    #[test]
    fn test_user_friendly_error_recovers_kind_through_context() {
        let error: anyhow::Result<()> = Err(ModpmError::Conflict {
            mod_a: "a".to_string(),
            mod_b: "c".to_string(),
        }
        .into());
        let error = error.context("Failed to plan enable").unwrap_err();

        let ctx = user_friendly_error(error);
        assert!(matches!(ctx.error, ModpmError::Conflict { .. }));
        assert_eq!(ctx.suggestion.as_deref(), Some("Disable 'c' first with 'modpm disable c'"));
        assert_eq!(ctx.details.as_deref(), Some("Failed to plan enable"));
    }

    #[test]
    fn test_user_friendly_error_generic_chain() {
        let error = anyhow::anyhow!("root cause").context("outer");
        let ctx = user_friendly_error(error);
        let text = ctx.error.to_string();
        assert!(text.starts_with("outer"));
        assert!(text.contains("1: root cause"));
    }

    #[test]
    fn test_into_anyhow_with_context() {
        let ctx = ErrorContext::new(ModpmError::Other {
            message: String::new(),
        })
        .with_suggestion("try again");
        let error = ModpmError::ModNotInstalled {
            name: "x".to_string(),
        }
        .into_anyhow_with_context(ctx);

        let recovered = user_friendly_error(error);
        assert!(matches!(recovered.error, ModpmError::ModNotInstalled { .. }));
        assert_eq!(recovered.suggestion.as_deref(), Some("try again"));
    }
}
