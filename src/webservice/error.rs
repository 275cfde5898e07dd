use async_trait::async_trait;
use thiserror::Error;

use crate::depot::Depot;
use crate::http::header::ALLOW;
use crate::http::{Request, Response, StatusError};
use crate::writer::Writer;

/// Failures of the negotiation and rendering stages of a [`WebService`](super::WebService).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WebServiceError {
    #[error("No supported accept types found")]
    NotAcceptable,
    #[error("error_reading_input")]
    InputReadFailure,
    #[error("An error has occurred")]
    ViewNotFound,
    /// The view was found but failed to produce a body.
    #[error("An error has occurred")]
    RenderFailure,
    #[error("method not allowed, allow: {allow}")]
    MethodNotAllowed { allow: String },
}

impl WebServiceError {
    pub fn status_error(&self) -> StatusError {
        match self {
            WebServiceError::NotAcceptable => {
                StatusError::not_acceptable().with_summary(self.to_string())
            }
            WebServiceError::InputReadFailure
            | WebServiceError::ViewNotFound
            | WebServiceError::RenderFailure => {
                StatusError::internal_server_error().with_summary(self.to_string())
            }
            WebServiceError::MethodNotAllowed { .. } => StatusError::method_not_allowed(),
        }
    }
}

impl From<WebServiceError> for StatusError {
    fn from(e: WebServiceError) -> Self {
        e.status_error()
    }
}

#[async_trait]
impl Writer for WebServiceError {
    async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        if let WebServiceError::MethodNotAllowed { allow } = &self {
            if res.add_header(ALLOW, allow.as_str(), true).is_err() {
                tracing::error!(allow = %allow, "invalid allow header value");
            }
        }
        res.set_status_error(self.status_error());
    }
}
