use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use hyper::{
    body::Bytes,
    header::{IntoHeaderName, CONTENT_TYPE},
    http::HeaderValue,
    HeaderMap, StatusCode,
};

use std::error::Error as StdError;

use crate::error::Error;
use crate::writer::Piece;

use super::errors::StatusError;

/// Response body, grown by [`Response::write_body`].
#[derive(Default)]
pub enum ResBody {
    #[default]
    None,
    Once(Bytes),
    Chunks(VecDeque<Bytes>),
}

impl ResBody {
    pub fn is_none(&self) -> bool {
        matches!(*self, ResBody::None)
    }
    pub fn is_chunks(&self) -> bool {
        matches!(*self, ResBody::Chunks(_))
    }
    pub fn size(&self) -> u64 {
        match self {
            ResBody::None => 0,
            ResBody::Once(bytes) => bytes.len() as u64,
            ResBody::Chunks(chunks) => chunks.iter().map(|bytes| bytes.len() as u64).sum(),
        }
    }
}

impl Stream for ResBody {
    type Item = Result<Bytes, Box<dyn StdError + Send + Sync>>;

    fn poll_next(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        let chunk = match std::mem::take(this) {
            ResBody::None => None,
            ResBody::Once(bytes) => Some(bytes),
            ResBody::Chunks(mut chunks) => {
                let chunk = chunks.pop_front();
                if !chunks.is_empty() {
                    *this = ResBody::Chunks(chunks);
                }
                chunk
            }
        };
        Poll::Ready(chunk.map(Ok))
    }
}

impl std::fmt::Debug for ResBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResBody::None => write!(f, "ResBody::None"),
            ResBody::Once(bytes) => write!(f, "ResBody::Once({} bytes)", bytes.len()),
            ResBody::Chunks(chunks) => write!(f, "ResBody::Chunks({} chunks)", chunks.len()),
        }
    }
}

#[derive(Debug)]
pub struct Response {
    status_code: Option<StatusCode>,
    pub(crate) status_error: Option<StatusError>,
    headers: HeaderMap,
    pub(crate) body: ResBody,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Response {
        Response {
            status_code: None,
            status_error: None,
            body: ResBody::None,
            headers: HeaderMap::new(),
        }
    }
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    pub fn add_header<N, V>(&mut self, name: N, value: V, overwrite: bool) -> crate::Result<()>
    where
        N: IntoHeaderName,
        V: TryInto<HeaderValue>,
    {
        let value = value
            .try_into()
            .map_err(|_| Error::other("invalid header value"))?;
        if overwrite {
            self.headers.insert(name, value);
        } else {
            self.headers.append(name, value);
        }
        Ok(())
    }
    pub fn body(&self) -> &ResBody {
        &self.body
    }
    pub fn take_body(&mut self) -> ResBody {
        std::mem::take(&mut self.body)
    }

    pub fn status_code(&self) -> Option<StatusCode> {
        self.status_code
    }
    pub fn set_status_code(&mut self, code: StatusCode) {
        self.status_code = Some(code);
        if !code.is_success() && !code.is_redirection() {
            if let Some(e) = StatusError::from_code(code) {
                self.status_error = Some(e);
            }
        }
    }
    pub fn status_error(&self) -> Option<&StatusError> {
        self.status_error.as_ref()
    }
    pub fn set_status_error(&mut self, e: StatusError) {
        self.status_code = Some(e.code);
        self.status_error = Some(e);
    }

    /// A response is stamped once it carries an error or redirection status,
    /// later handlers are skipped.
    pub fn is_stamped(&self) -> bool {
        match self.status_code {
            Some(code) => code.is_client_error() || code.is_server_error() || code.is_redirection(),
            None => false,
        }
    }

    pub fn render<P>(&mut self, piece: P)
    where
        P: Piece,
    {
        piece.render(self)
    }

    pub fn write_body(&mut self, data: impl Into<Bytes>) -> crate::Result<()> {
        match self.body {
            ResBody::None => {
                self.body = ResBody::Once(data.into());
            }
            ResBody::Once(ref bytes) => {
                let mut chunks = VecDeque::new();
                chunks.push_back(bytes.clone());
                chunks.push_back(data.into());
                self.body = ResBody::Chunks(chunks);
            }
            ResBody::Chunks(ref mut chunks) => {
                chunks.push_back(data.into());
            }
        }
        Ok(())
    }

    pub(crate) async fn write_back(self, res: &mut hyper::Response<hyper::Body>) {
        let Self {
            status_code,
            headers,
            body,
            ..
        } = self;
        *res.headers_mut() = headers;
        // Default to a 404 if no response code was set
        *res.status_mut() = status_code.unwrap_or(StatusCode::NOT_FOUND);

        match body {
            ResBody::None => {
                res.headers_mut()
                    .insert(hyper::header::CONTENT_LENGTH, HeaderValue::from_static("0"));
            }
            ResBody::Once(bytes) => {
                *res.body_mut() = hyper::Body::from(bytes);
            }
            ResBody::Chunks(chunks) => {
                *res.body_mut() = hyper::Body::wrap_stream(futures_util::stream::iter(
                    chunks.into_iter().map(Result::<_, Box<dyn StdError + Send + Sync>>::Ok),
                ));
            }
        }
    }

    pub fn content_type(&self) -> Option<mime::Mime> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.parse().ok())
    }
}
