//! Error types for diffing and patching.

use thiserror::Error;

/// Result type alias for diff and patch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while parsing, diffing or patching documents.
#[derive(Error, Debug)]
pub enum Error {
    /// XML parsing error.
    #[error("XML parse error: {0}")]
    Parse(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// XML error from quick-xml.
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The diff could not be computed.
    #[error("Diff failed: {0}")]
    Diff(String),

    /// A delta document is malformed or does not apply to the target.
    #[error("Malformed patch: {0}")]
    PatchFormat(String),
}
