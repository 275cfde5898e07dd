use std::error::Error as StdError;
use std::fmt;

use async_trait::async_trait;

use crate::{
    depot::Depot,
    http::{Request, Response, StatusCode},
    writer::Writer,
};

/// An http error carrying the status code to respond with.
#[derive(Debug, Clone)]
pub struct StatusError {
    pub code: StatusCode,
    pub name: String,
    pub summary: Option<String>,
    pub detail: Option<String>,
}

macro_rules! default_errors {
    ($($name:ident, $code:expr, $brief:expr);+) => {
        $(
            pub fn $name() -> StatusError {
                StatusError {
                    code: $code,
                    name: $brief.into(),
                    summary: None,
                    detail: None,
                }
            }
        )+
    }
}

impl StatusError {
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    default_errors! {
        bad_request,            StatusCode::BAD_REQUEST,            "Bad Request";
        unauthorized,           StatusCode::UNAUTHORIZED,           "Unauthorized";
        forbidden,              StatusCode::FORBIDDEN,              "Forbidden";
        not_found,              StatusCode::NOT_FOUND,              "Not Found";
        method_not_allowed,     StatusCode::METHOD_NOT_ALLOWED,     "Method Not Allowed";
        not_acceptable,         StatusCode::NOT_ACCEPTABLE,         "Not Acceptable";
        unsupported_media_type, StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported Media Type";
        internal_server_error,  StatusCode::INTERNAL_SERVER_ERROR,  "Internal Server Error";
        not_implemented,        StatusCode::NOT_IMPLEMENTED,        "Not Implemented";
        service_unavailable,    StatusCode::SERVICE_UNAVAILABLE,    "Service Unavailable"
    }

    /// Builds an error for any client or server error status, `None` otherwise.
    pub fn from_code(code: StatusCode) -> Option<StatusError> {
        if !code.is_client_error() && !code.is_server_error() {
            return None;
        }
        Some(StatusError {
            code,
            name: code.canonical_reason().unwrap_or("Unknown Error").into(),
            summary: None,
            detail: None,
        })
    }
}

impl fmt::Display for StatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "code: {}, name: {}, summary: {:?}, detail: {:?}",
            self.code, self.name, self.summary, self.detail
        )
    }
}

impl StdError for StatusError {}

#[async_trait]
impl Writer for StatusError {
    async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        res.set_status_error(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code() {
        let err = StatusError::from_code(StatusCode::NOT_ACCEPTABLE).unwrap();
        assert_eq!(err.name, "Not Acceptable");
        assert!(StatusError::from_code(StatusCode::OK).is_none());
        assert!(StatusError::from_code(StatusCode::FOUND).is_none());
    }

    #[test]
    fn test_builders() {
        let err = StatusError::internal_server_error()
            .with_summary("An error has occurred")
            .with_detail("no view");
        assert_eq!(err.code, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.summary.as_deref(), Some("An error has occurred"));
        assert_eq!(err.detail.as_deref(), Some("no view"));
    }
}
