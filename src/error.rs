//! Error types for gamebook-mechanics
//!
//! Only the loading side of the crate fails with an [`Error`]. Problems found
//! while validating mechanics rules are data: they are appended as strings to
//! the validator's error list and never surface here.

use thiserror::Error;

/// Result type alias using the crate [`Error`]
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for gamebook-mechanics operations
#[derive(Error, Debug)]
pub enum Error {
    /// One of the book, mechanics or objects downloads failed
    #[error("Error downloading book files")]
    Download(#[source] Box<Error>),

    /// Resource loading error
    #[error("resource error: {0}")]
    Resource(String),

    /// XML parsing error
    #[error("XML error: {0}")]
    Xml(String),

    /// Limit exceeded error
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    /// Invalid configuration
    #[error("configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// URL parsing error
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap an error as a failed book download
    pub fn download(source: Error) -> Self {
        Error::Download(Box::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_download_error_message_is_fixed() {
        let err = Error::download(Error::Resource("objects.xml: 404".to_string()));
        assert_eq!(err.to_string(), "Error downloading book files");

        let source = err.source().expect("download keeps its cause");
        assert!(source.to_string().contains("objects.xml: 404"));
    }

    #[test]
    fn test_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
