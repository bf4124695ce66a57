//! Error types for registration, resolution and the application shell.

use thiserror::Error;

use crate::expression::ParseError;

/// Errors raised while resolving a factory's dependencies.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Unresolved dependency '{dependency}' required by '{function}'")]
    Unresolved {
        dependency: String,
        function: String,
    },

    /// Failure raised by a factory, provider or binding target.
    ///
    /// Transparent so the original error keeps its message, source chain and
    /// downcast identity.
    #[error(transparent)]
    Construction(anyhow::Error),
}

impl ResolveError {
    /// The underlying construction error, if this is one.
    pub fn as_construction(&self) -> Option<&anyhow::Error> {
        match self {
            ResolveError::Construction(err) => Some(err),
            _ => None,
        }
    }
}

/// Errors raised while populating a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Dependency '{0}' has already been resolved and cannot be registered again")]
    AlreadyResolved(String),
}

/// Application-level errors.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}
