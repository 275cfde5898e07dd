use std::io::Error as IoError;

use thiserror::Error;

use crate::http::errors::{ParseError, StatusError};
use crate::webservice::WebServiceError;

pub type BoxedError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Low level http error.
    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),
    /// Request parsing error.
    #[error("Http parse error: {0}")]
    HttpParse(#[from] ParseError),
    /// Http status error.
    #[error("Http status error: {0}")]
    HttpStatus(#[from] StatusError),
    /// Content negotiation or view error.
    #[error("Web service error: {0}")]
    WebService(#[from] WebServiceError),
    /// Std I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] IoError),
    /// SerdeJson error.
    #[error("Serde json error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    /// Custom error that does not fall under any other error kind.
    #[error("{0}")]
    Other(BoxedError),
}

impl Error {
    pub fn other(error: impl Into<BoxedError>) -> Self {
        Self::Other(error.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::other("invalid header value");
        assert_eq!(err.to_string(), "invalid header value");

        let err: Error = StatusError::not_acceptable().into();
        assert!(matches!(err, Error::HttpStatus(_)));
        assert!(err.to_string().contains("Not Acceptable"));
    }
}
