//! Error types for feed parsing.

use thiserror::Error;

/// Errors that abort a [`parse`](crate::feed::parse) call.
///
/// Entry-level problems never surface here: a malformed entry is dropped and
/// its siblings are still parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The bytes contained no root element.
    #[error("document has no root element")]
    MissingRoot,

    /// The XML layer rejected the document.
    #[error("XML parse error: {0}")]
    ParseFailure(String),

    /// No configured adapter recognised the root element.
    #[error("unsupported feed format")]
    UnsupportedFormat,

    /// The root matched a format but its version marker is not one we read.
    #[error("unsupported feed version: {0:?}")]
    InvalidVersion(String),

    /// A required element is absent at feed or channel level.
    #[error("missing required <{element}> in <{parent}>")]
    MissingElement {
        element: &'static str,
        parent: &'static str,
    },

    /// SEC-004: Document exceeds the configured size limit.
    #[error("document is {size} bytes (max {limit} bytes)")]
    TooLarge { size: usize, limit: usize },
}

/// Result type alias for parse operations.
pub type Result<T> = std::result::Result<T, ParseError>;
