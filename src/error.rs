//! # Error Handling
//!
//! One error type for the whole pipeline, with the metadata needed to log a
//! failure usefully and to decide whether it is worth trying again.
//!
//! ## Architecture
//!
//! - **GramError**: one variant per failure class, each carrying an [`ErrorContext`]
//! - **ErrorContext**: timestamp, operation, free-form context, severity, metadata
//! - **Classification traits**: [`HasSeverity`] and [`Retryable`]
//!
//! ## Failures Versus Absence
//!
//! Filters and the render sweep never propagate these errors. A filter that hits
//! a `BufferAllocation`, `Decode` or `Inference` error logs it and reports "no
//! output", so one broken model cannot abort the sweep. `GramError` travels
//! upward only from the fallible building blocks (`PixelBuffer::from_bitmap`,
//! `StyleModel::predict`, config validation, photo loading).
//!
//! ## Usage
//!
//! ```rust
//! use gram::error::{GramError, HasSeverity, ErrorSeverity};
//!
//! let error = GramError::inference("Mosaic", "model returned an empty tensor")
//!     .with_operation("render")
//!     .with_context("input 720x720");
//!
//! assert_eq!(error.category(), "inference");
//! assert_eq!(error.severity(), ErrorSeverity::Error);
//! ```

use std::{collections::HashMap, time::SystemTime};

/// Severity levels for errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

/// Metadata about when and where an error occurred
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// When the error occurred
    pub timestamp: SystemTime,
    /// The operation being performed when the error occurred
    pub operation: Option<String>,
    /// Additional context about the error
    pub context: Option<String>,
    /// Error severity level
    pub severity: ErrorSeverity,
    /// Additional metadata as key-value pairs
    pub metadata: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            severity: ErrorSeverity::Error,
            metadata: HashMap::new(),
        }
    }
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_severity(mut self, severity: ErrorSeverity) -> Self {
        self.severity = severity;
        self
    }
}

/// Base error type for the gram pipeline
#[derive(Debug, thiserror::Error)]
pub enum GramError {
    /// Configuration validation errors
    #[error("Configuration error in '{field}': {reason} (value: {value})")]
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// A pixel buffer could not be allocated (zero or overflowing size, allocator refusal)
    #[error("Cannot allocate {width}x{height} pixel buffer: {reason}")]
    BufferAllocation {
        width: u32,
        height: u32,
        reason: String,
        context: ErrorContext,
    },
    /// Pixel data could not be turned into a displayable image, or a photo could not be decoded
    #[error("Decode error: {reason}")]
    Decode {
        reason: String,
        context: ErrorContext,
    },
    /// A model failed to load or to produce output
    #[error("Inference failed for '{model}': {reason}")]
    Inference {
        model: String,
        reason: String,
        context: ErrorContext,
    },
    /// Geometry kernel errors
    #[error("Geometry error during {operation}: {source}")]
    Geometry {
        operation: String,
        #[source]
        source: gram_scale::cpu::ScaleError,
        context: ErrorContext,
    },
    /// I/O errors
    #[error("I/O error during {operation}: {source}")]
    Io {
        operation: String,
        path: Option<String>,
        #[source]
        source: std::io::Error,
        context: ErrorContext,
    },
    /// Timeout errors
    #[error("Operation '{operation}' timed out after {duration_ms}ms")]
    Timeout {
        operation: String,
        duration_ms: u64,
        context: ErrorContext,
    },
    /// The render session worker is gone or refused the request
    #[error("Session error: {reason}")]
    Session {
        reason: String,
        context: ErrorContext,
    },
}

impl GramError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a buffer allocation error
    pub fn buffer_allocation(width: u32, height: u32, reason: impl Into<String>) -> Self {
        Self::BufferAllocation {
            width,
            height,
            reason: reason.into(),
            context: ErrorContext::new().with_severity(ErrorSeverity::Critical),
        }
    }

    /// Create a decode error
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an inference error
    pub fn inference(model: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Inference {
            model: model.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a geometry error
    pub fn geometry(operation: impl Into<String>, source: gram_scale::cpu::ScaleError) -> Self {
        Self::Geometry {
            operation: operation.into(),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create a timeout error
    pub fn timeout(operation: impl Into<String>, duration_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration_ms,
            context: ErrorContext::new().with_severity(ErrorSeverity::Warning),
        }
    }

    /// Create a session error
    pub fn session(reason: impl Into<String>) -> Self {
        Self::Session {
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Attach the path an I/O error refers to
    pub fn with_path(mut self, p: impl Into<String>) -> Self {
        if let Self::Io { path, .. } = &mut self {
            *path = Some(p.into());
        }
        self
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. }
            | Self::BufferAllocation { context, .. }
            | Self::Decode { context, .. }
            | Self::Inference { context, .. }
            | Self::Geometry { context, .. }
            | Self::Io { context, .. }
            | Self::Timeout { context, .. }
            | Self::Session { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. }
            | Self::BufferAllocation { context, .. }
            | Self::Decode { context, .. }
            | Self::Inference { context, .. }
            | Self::Geometry { context, .. }
            | Self::Io { context, .. }
            | Self::Timeout { context, .. }
            | Self::Session { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::BufferAllocation { .. } => "buffer_allocation",
            Self::Decode { .. } => "decode",
            Self::Inference { .. } => "inference",
            Self::Geometry { .. } => "geometry",
            Self::Io { .. } => "io",
            Self::Timeout { .. } => "timeout",
            Self::Session { .. } => "session",
        }
    }
}

/// Result type alias for convenience
pub type GramResult<T> = Result<T, GramError>;

/// Errors that may succeed when attempted again
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for GramError {
    fn is_retryable(&self) -> bool {
        // Inference faults can be resource exhaustion; nothing else changes on retry.
        matches!(self, Self::Timeout { .. } | Self::Inference { .. })
    }
}

/// Trait for errors that have severity levels
pub trait HasSeverity {
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for GramError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

impl From<std::io::Error> for GramError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<image::ImageError> for GramError {
    fn from(error: image::ImageError) -> Self {
        match error {
            image::ImageError::IoError(e) => Self::io("image", e),
            other => Self::decode(other.to_string()),
        }
    }
}
