//! Error types for the cityprint library
//!
//! Covers transport failures from the query API, payload and cache parsing,
//! and the terminal empty-input case of the raster stage.

use std::fmt;

/// Main error type for cityprint operations
#[derive(Debug)]
pub enum Error {
    /// Non-success HTTP response from the query API; carries the status code
    /// when one was received
    HttpError {
        status: Option<u16>,
        message: String,
    },

    /// API-side or connect timeout, typical for oversized batch queries
    TimeoutError(String),

    /// Other network connectivity failure
    NetworkError(String),

    /// Malformed JSON payload or cache file
    JsonError(serde_json::Error),

    /// File I/O error
    IoError(std::io::Error),

    /// Nothing to rasterize: no building resolved at all
    EmptyInput,

    /// Invalid configuration or parameters
    InvalidInput(String),

    /// PNG serialization failure
    EncodingError(png::EncodingError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::HttpError {
                status: Some(code),
                message,
            } => {
                write!(f, "HTTP error {}: {}", code, message)
            }
            Error::HttpError {
                status: None,
                message,
            } => {
                write!(f, "HTTP error: {}", message)
            }
            Error::TimeoutError(msg) => {
                write!(f, "Query timed out: {}", msg)
            }
            Error::NetworkError(msg) => {
                write!(f, "Network error: {}", msg)
            }
            Error::JsonError(err) => {
                write!(f, "Malformed JSON: {}", err)
            }
            Error::IoError(err) => {
                write!(f, "I/O error: {}", err)
            }
            Error::EmptyInput => {
                write!(f, "No buildings resolved, nothing to render")
            }
            Error::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            Error::EncodingError(err) => {
                write!(f, "PNG encoding error: {}", err)
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            Error::JsonError(err) => Some(err),
            Error::EncodingError(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::JsonError(err)
    }
}

impl From<png::EncodingError> for Error {
    fn from(err: png::EncodingError) -> Self {
        Error::EncodingError(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::TimeoutError(err.to_string())
        } else if err.is_connect() {
            Error::NetworkError(err.to_string())
        } else {
            Error::HttpError {
                status: err.status().map(|s| s.as_u16()),
                message: err.to_string(),
            }
        }
    }
}

/// Convenience result type for cityprint operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_includes_status() {
        let err = Error::HttpError {
            status: Some(504),
            message: "gateway timeout".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error 504: gateway timeout");
    }

    #[test]
    fn test_http_error_display_without_status() {
        let err = Error::HttpError {
            status: None,
            message: "connection reset".to_string(),
        };
        assert_eq!(err.to_string(), "HTTP error: connection reset");
    }

    #[test]
    fn test_io_error_keeps_source() {
        use std::error::Error as _;

        let inner = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = Error::from(inner);
        assert!(err.source().is_some());
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_empty_input_display() {
        assert_eq!(
            Error::EmptyInput.to_string(),
            "No buildings resolved, nothing to render"
        );
    }
}
