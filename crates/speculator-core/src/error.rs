//! Error types for speculation runs.
//!
//! ## Error Hierarchy
//!
//! ```text
//! SpeculateError (run-level)
//! ├── ConfigurationError - invalid options, raised before any work starts
//! ├── Predicate          - the user predicate failed (wraps PredicateError)
//! ├── DirectiveError     - directive file could not be read or written
//! └── Worker             - a background run could not be completed
//!
//! CompileError           - per-signature failure, never escapes a run
//! ```
//!
//! Per-signature failures are turned into warned outcomes by the executor.
//! Everything that reaches [`SpeculateError`] aborts the run.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::QualifiedName;

// ============================================================================
// Configuration Errors
// ============================================================================

/// Invalid options, detected before any candidate is processed.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// `limit` must be at least 1.
    #[error("limit must be at least 1, got {0}")]
    InvalidLimit(usize),

    /// The directive path could not be opened for appending.
    #[error("cannot write directives to '{}': {source}", path.display())]
    UnwritablePath {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A verbosity flag name was not recognized.
    #[error("unknown verbosity flag '{0}'")]
    UnknownVerbosity(String),

    /// The worker thread budget is unusable.
    #[error("invalid thread budget: {0}")]
    InvalidThreadBudget(String),

    /// An environment variable held an unparseable value.
    #[error("invalid value '{value}' for {key}")]
    InvalidValue { key: String, value: String },
}

// ============================================================================
// Predicate Errors
// ============================================================================

/// Failure raised by a user-supplied predicate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct PredicateError {
    message: String,
}

impl PredicateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Compile Errors
// ============================================================================

/// Unrecoverable failure while compiling one specialization.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CompileError {
    message: String,
}

impl CompileError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

// ============================================================================
// Directive Errors
// ============================================================================

/// Directive file read or write failure.
#[derive(Debug, Error)]
pub enum DirectiveError {
    #[error("directive file I/O failed: {0}")]
    Io(#[from] io::Error),

    /// A line is not a directive.
    #[error("malformed directive at line {line}: '{text}'")]
    Malformed { line: usize, text: String },
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Error that aborts a whole speculation run.
#[derive(Debug, Error)]
pub enum SpeculateError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// The predicate failed while examining `namespace::name`.
    #[error("predicate failed for '{namespace}::{name}': {source}")]
    Predicate {
        namespace: QualifiedName,
        name: String,
        #[source]
        source: PredicateError,
    },

    #[error(transparent)]
    Directive(#[from] DirectiveError),

    /// The background worker stopped before delivering a result.
    #[error("background run failed: {0}")]
    Worker(String),
}

impl SpeculateError {
    /// The predicate failure, if that is what aborted the run.
    pub fn as_predicate_error(&self) -> Option<&PredicateError> {
        match self {
            SpeculateError::Predicate { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Result alias for run-level operations.
pub type SpeculateResult<T> = Result<T, SpeculateError>;
