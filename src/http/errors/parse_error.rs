use async_trait::async_trait;
use serde::de::value::Error as DeError;
use thiserror::Error;

use crate::{
    depot::Depot,
    http::{Request, Response},
    writer::Writer,
};

use super::StatusError;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ParseError {
    /// The body is not a form, or not of the expected kind.
    #[error("The request did not have a valid Content-Type header.")]
    InvalidContentType,

    /// The request body is empty.
    #[error("The request body is empty.")]
    EmptyBody,

    /// The body has already been taken out of the request.
    #[error("The request body has already been consumed.")]
    BodyConsumed,

    /// Form or raw values could not be deserialized into the target type.
    #[error("Deserialize error: {0}")]
    Deserialize(#[from] DeError),

    /// Malformed multipart body.
    #[error("Multer error: {0}")]
    Multer(#[from] multer::Error),

    /// Reading the body from hyper failed.
    #[error("Hyper error: {0}")]
    Hyper(#[from] hyper::Error),

    /// Malformed json body.
    #[error("Serde json error: {0}")]
    SerdeJson(#[from] serde_json::error::Error),
}

#[async_trait]
impl Writer for ParseError {
    async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
        tracing::error!(error = ?self, "http read error");
        res.set_status_error(
            StatusError::bad_request()
                .with_summary("http read error happened")
                .with_detail("there is no more detailed explanation"),
        )
    }
}
