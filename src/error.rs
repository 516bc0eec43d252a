//! Error types for bounce report parsing

use thiserror::Error;

/// Errors that can occur while building a report from one message
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Failed to parse the message structure
    #[error("Failed to parse message structure: {0}")]
    Structure(String),

    /// Content-Type header present but not a valid media type
    #[error("Malformed Content-Type: {0}")]
    MalformedContentType(String),

    /// The embedded message was expected in a multipart body
    #[error("Message is not multipart")]
    NotMultipart,

    /// No block of original-message headers could be located
    #[error("Embedded headers not found")]
    EmbeddedHeadersNotFound,

    /// Address header missing or not a single mailbox
    #[error("Unparseable address in {header}: {details}")]
    UnparseableAddress { header: String, details: String },

    /// No supported date shape found
    #[error("Unparseable date: {0}")]
    UnparseableDate(String),

    /// Failed to decode content
    #[error("Failed to decode content: {0}")]
    DecodeFailure(String),

    /// The collector could not start its parsing pool
    #[error("Failed to build worker pool: {0}")]
    WorkerPool(String),
}

/// Result type for report parsing operations
pub type Result<T> = std::result::Result<T, ParseError>;
