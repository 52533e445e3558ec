//! Core error types for formidable.
//!
//! Two disjoint classes of failure exist:
//!
//! - [`FormError`] covers structural and programming errors (malformed
//!   bracket keys, invalid form configuration, saving an invalid form,
//!   persistence calls without the required collaborator). These are
//!   returned as `Err` and are never swallowed by the engine.
//! - [`FieldError`] is a recoverable, per-field validation outcome: a stable
//!   error code plus optional structured arguments. It is stored on the
//!   field that produced it and aggregated by the form, never raised.

use std::fmt;

use indexmap::IndexMap;
use thiserror::Error;

use crate::value::Value;

/// A recoverable validation failure for a single field.
///
/// The `code` is a stable key (e.g. `"required"`, `"min_items"`) used to
/// look up the human message; `args` carries the context used to format it.
///
/// # Examples
///
/// ```
/// use formidable_core::error::FieldError;
///
/// let err = FieldError::new("min_length").with_arg("min_length", 3);
/// assert_eq!(err.code, "min_length");
/// assert_eq!(err.args.unwrap()["min_length"], 3.into());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    /// A short code identifying the type of validation failure.
    pub code: String,
    /// Parameters providing context for the error message.
    pub args: Option<IndexMap<String, Value>>,
}

impl FieldError {
    /// Creates a new `FieldError` with the given code and no arguments.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            args: None,
        }
    }

    /// Adds an argument to this error.
    #[must_use]
    pub fn with_arg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args
            .get_or_insert_with(IndexMap::new)
            .insert(key.into(), value.into());
        self
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code)?;
        if let Some(args) = &self.args {
            for (key, value) in args {
                write!(f, " {key}={value}")?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for FieldError {}

/// A malformed key in the flat request payload.
///
/// Parse errors are client or programming errors, not validation outcomes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A `[` without a matching `]`, a stray `]`, or text after a `]`.
    #[error("Unbalanced brackets in key '{0}'")]
    UnbalancedBrackets(String),

    /// The key has no root segment (e.g. `[a]` or the empty string).
    #[error("Missing root segment in key '{0}'")]
    EmptyRoot(String),

    /// `[]` used anywhere but as the final segment.
    #[error("Empty brackets must be the last segment in key '{0}'")]
    EmptyBracketNotLast(String),

    /// The same path is addressed both as a mapping, a sequence, or a leaf.
    #[error("Conflicting structure at '{path}' in key '{key}'")]
    ShapeConflict {
        /// The path (bracket notation) where the conflict happened.
        path: String,
        /// The offending input key.
        key: String,
    },

    /// A sequence index with more digits than a `usize` can hold.
    #[error("Index out of range in key '{0}'")]
    IndexOverflow(String),

    /// A sequence index above the configured `max_index`.
    #[error("Index {index} exceeds the maximum of {max} in key '{key}'")]
    IndexTooLarge {
        /// The requested index.
        index: usize,
        /// The configured maximum.
        max: usize,
        /// The offending input key.
        key: String,
    },
}

/// The primary error type for formidable.
///
/// Each variant is a structural or programming error. Field validation
/// failures are not represented here; see [`FieldError`].
#[derive(Error, Debug)]
pub enum FormError {
    // ── Input ────────────────────────────────────────────────────────

    /// The flat request payload contains a malformed key.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    // ── Programming errors ───────────────────────────────────────────

    /// `save()` was called on a form that is neither valid nor deleted.
    #[error("Form is not valid: {0}")]
    InvalidForm(String),

    /// A form, field, or object manager was configured incorrectly.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    /// An update or delete was requested without an existing object.
    #[error("No object to {0}")]
    MissingObject(String),

    /// The injected persistence collaborator reported a failure.
    #[error("Model error: {0}")]
    ModelError(String),

    // ── Configuration ────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    // ── Serialization ────────────────────────────────────────────────

    /// An error occurred during serialization or deserialization.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;
