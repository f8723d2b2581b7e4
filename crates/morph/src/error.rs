//! Error types for morph.
//!
//! All fallible operations in the crate return [`MorphError`]. The enum is
//! wider than the wire-level taxonomy: transport adapters never serialize a
//! `MorphError` variant directly, they serialize its [`ErrorKind`], which
//! collapses internal variants (`MissingTool`, `Io`, `Validation`) onto the
//! six kinds clients are allowed to observe.
//!
//! # Propagation policy
//!
//! The dispatcher is the single point where heterogeneous converter failures
//! are caught and reclassified (see [`MorphError::into_conversion_failed`]).
//! Adapters only map kinds to their protocol's error shape; they never
//! interpret raw converter errors themselves.

use thiserror::Error;

/// Result type alias using `MorphError`.
pub type Result<T> = std::result::Result<T, MorphError>;

/// Wire-level error classification.
///
/// Every [`MorphError`] maps onto exactly one kind; both the REST and MCP
/// adapters surface the same kind for the same failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input or output token not recognized by any category.
    UnknownFormat,
    /// Both formats are valid but belong to different categories.
    CrossCategoryConversion,
    /// Same category, but this specific ordered pair is not enumerated.
    UnsupportedPair,
    /// Payload exceeds the configured maximum size.
    PayloadTooLarge,
    /// The underlying converter raised, timed out, or produced no output.
    ConversionFailed,
    /// Malformed base64 payload or malformed request body.
    InvalidEncoding,
}

impl ErrorKind {
    /// Wire token used in REST error bodies.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::UnknownFormat => "UnknownFormat",
            ErrorKind::CrossCategoryConversion => "CrossCategoryConversion",
            ErrorKind::UnsupportedPair => "UnsupportedPair",
            ErrorKind::PayloadTooLarge => "PayloadTooLarge",
            ErrorKind::ConversionFailed => "ConversionFailed",
            ErrorKind::InvalidEncoding => "InvalidEncoding",
        }
    }

    /// Suggested HTTP status for this kind.
    pub fn status_code(&self) -> u16 {
        match self {
            ErrorKind::UnknownFormat
            | ErrorKind::CrossCategoryConversion
            | ErrorKind::UnsupportedPair
            | ErrorKind::InvalidEncoding => 400,
            ErrorKind::PayloadTooLarge => 413,
            ErrorKind::ConversionFailed => 500,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for all morph operations.
#[derive(Debug, Error)]
pub enum MorphError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown format: {0}")]
    UnknownFormat(String),

    #[error("Cannot convert {input} ({input_category}) to {output} ({output_category}): cross-category conversion is not supported")]
    CrossCategory {
        input: String,
        input_category: crate::core::registry::Category,
        output: String,
        output_category: crate::core::registry::Category,
    },

    #[error("Conversion from {input} to {output} is not supported")]
    UnsupportedPair { input: String, output: String },

    #[error("Payload of {size} bytes exceeds the configured maximum of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("Conversion failed: {message}")]
    ConversionFailed {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid encoding: {message}")]
    InvalidEncoding { message: String },

    #[error("Missing tool: {0}")]
    MissingTool(String),

    #[error("Validation error: {message}")]
    Validation { message: String },
}

impl MorphError {
    /// Create a ConversionFailed error.
    pub fn conversion_failed<S: Into<String>>(message: S) -> Self {
        Self::ConversionFailed {
            message: message.into(),
            source: None,
        }
    }

    /// Create a ConversionFailed error with source.
    pub fn conversion_failed_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::ConversionFailed {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create an InvalidEncoding error.
    pub fn invalid_encoding<S: Into<String>>(message: S) -> Self {
        Self::InvalidEncoding { message: message.into() }
    }

    /// Create a Validation error.
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation { message: message.into() }
    }

    /// Wire-level classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            MorphError::UnknownFormat(_) => ErrorKind::UnknownFormat,
            MorphError::CrossCategory { .. } => ErrorKind::CrossCategoryConversion,
            MorphError::UnsupportedPair { .. } => ErrorKind::UnsupportedPair,
            MorphError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            MorphError::ConversionFailed { .. } | MorphError::MissingTool(_) | MorphError::Io(_) => {
                ErrorKind::ConversionFailed
            }
            MorphError::InvalidEncoding { .. } | MorphError::Validation { .. } => ErrorKind::InvalidEncoding,
        }
    }

    /// Reclassify a converter-internal failure as `ConversionFailed`,
    /// preserving the message for diagnostics.
    ///
    /// Called at the dispatcher boundary; converters are free to return
    /// `MissingTool`, `Io` or any other variant and it is folded here.
    pub fn into_conversion_failed(self) -> Self {
        match self {
            err @ MorphError::ConversionFailed { .. } => err,
            other => MorphError::ConversionFailed {
                message: other.to_string(),
                source: Some(Box::new(other)),
            },
        }
    }
}
