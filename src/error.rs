//! Error handling for knoblink-rs
//!
//! This module defines the crate error type and a Result alias used
//! throughout the library.
//!
//! Restoration entry points deliberately do **not** surface unresolved
//! links or rejected expressions as errors: those degrade to a logged
//! diagnostic so a project load can always run to completion. The
//! variants below cover programmer-facing failures only (bad rule
//! configs, poisoned locks, scripting-engine misuse).

use thiserror::Error;

/// Main error type for knoblink-rs operations
#[derive(Error, Debug)]
pub enum KnobLinkError {
    /// Errors related to expression compilation/validation
    #[error("Expression error: {0}")]
    Expression(String),

    /// Errors related to rule configuration loading
    #[error("Config error: {0}")]
    Config(String),

    /// Errors related to record serialization
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A shared model lock was poisoned by a panicking writer
    #[error("Lock error: {0}")]
    Lock(String),

    /// Errors related to model access (bad dimension index, dropped handles)
    #[error("Model error: {0}")]
    Model(String),

    /// IO errors (rule config files)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<KnobLinkError>,
    },
}

impl KnobLinkError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        KnobLinkError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Create an expression error from a Rhai parse error
    pub fn from_rhai_error(err: rhai::ParseError) -> Self {
        KnobLinkError::Expression(err.to_string())
    }
}

/// Result type alias for knoblink-rs operations
pub type Result<T> = std::result::Result<T, KnobLinkError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, rhai::ParseError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| KnobLinkError::from_rhai_error(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| KnobLinkError::from_rhai_error(e).with_context(f()))
    }
}
