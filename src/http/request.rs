use std::{cmp::Ordering, collections::HashMap, fmt, net::SocketAddr};

use hyper::{
    header::{IntoHeaderName, ACCEPT, CONTENT_TYPE},
    http::HeaderValue,
    Body as ReqBody, HeaderMap, Method, Uri,
};
use mime::Mime;
use multimap::MultiMap;
use once_cell::sync::OnceCell;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::{
    error::Error,
    http::{errors::ParseError, form::FormData},
    serde::{from_str_multi_val, from_str_val},
};

/// An incoming request, with lazily parsed queries, body and form fields.
pub struct Request {
    uri: Uri,
    headers: HeaderMap,
    body: Option<ReqBody>,
    method: Method,
    pub(crate) params: HashMap<String, String>,

    pub(crate) queries: OnceCell<MultiMap<String, String>>,
    pub(crate) form_data: tokio::sync::OnceCell<FormData>,
    pub(crate) payload: tokio::sync::OnceCell<Vec<u8>>,

    pub(crate) remote_addr: Option<SocketAddr>,
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("method", self.method())
            .field("uri", self.uri())
            .field("headers", self.headers())
            .field("params", self.params())
            .finish()
    }
}

impl Default for Request {
    fn default() -> Self {
        Self::new()
    }
}

impl From<hyper::Request<ReqBody>> for Request {
    fn from(req: hyper::Request<ReqBody>) -> Self {
        let (parts, body) = req.into_parts();
        Request {
            uri: parts.uri,
            headers: parts.headers,
            method: parts.method,
            body: Some(body),
            ..Request::new()
        }
    }
}

impl Request {
    pub fn new() -> Request {
        Request {
            uri: Uri::default(),
            headers: HeaderMap::new(),
            body: Some(ReqBody::default()),
            method: Method::default(),
            params: HashMap::new(),
            queries: OnceCell::new(),
            form_data: tokio::sync::OnceCell::new(),
            payload: tokio::sync::OnceCell::new(),
            remote_addr: None,
        }
    }
    pub fn uri(&self) -> &Uri {
        &self.uri
    }
    pub fn uri_mut(&mut self) -> &mut Uri {
        &mut self.uri
    }
    pub fn method(&self) -> &Method {
        &self.method
    }
    pub fn method_mut(&mut self) -> &mut Method {
        &mut self.method
    }
    pub fn remote_addr(&self) -> Option<&SocketAddr> {
        self.remote_addr.as_ref()
    }
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }
    pub fn add_header<N, V>(&mut self, name: N, value: V, overwrite: bool) -> crate::Result<&mut Self>
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
        Ok(self)
    }

    pub fn body(&self) -> Option<&ReqBody> {
        self.body.as_ref()
    }
    pub fn take_body(&mut self) -> Option<ReqBody> {
        self.body.take()
    }

    pub fn content_type(&self) -> Option<Mime> {
        self.headers
            .get(CONTENT_TYPE)
            .and_then(|h| h.to_str().ok())
            .and_then(|v| v.parse().ok())
    }

    /// Accepted media types, highest quality first.
    ///
    /// Entries with equal quality keep the order the client sent them in,
    /// entries with `q=0` are dropped.
    pub fn accept(&self) -> Vec<Mime> {
        let mut list: Vec<(f32, Mime)> = Vec::new();
        for value in self.headers.get_all(ACCEPT) {
            let value = match value.to_str() {
                Ok(value) => value,
                Err(_) => continue,
            };
            for part in value.split(',') {
                let part = part.trim();
                if part.is_empty() {
                    continue;
                }
                if let Ok(mime) = part.parse::<Mime>() {
                    let quality = mime
                        .get_param("q")
                        .and_then(|q| q.as_str().parse::<f32>().ok())
                        .unwrap_or(1.0);
                    if quality > 0.0 {
                        list.push((quality, mime));
                    }
                }
            }
        }
        list.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));
        list.into_iter().map(|(_, mime)| mime).collect()
    }
    /// Accepted media types as bare `type/subtype` strings, see [`Request::accept`].
    pub fn accept_types(&self) -> Vec<String> {
        self.accept()
            .iter()
            .map(|mime| mime.essence_str().to_owned())
            .collect()
    }

    pub fn params(&self) -> &HashMap<String, String> {
        &self.params
    }
    pub fn param<'de, T>(&'de self, key: &str) -> Option<T>
    where
        T: Deserialize<'de>,
    {
        self.params.get(key).and_then(|v| from_str_val(v.as_str()).ok())
    }

    pub fn queries(&self) -> &MultiMap<String, String> {
        self.queries.get_or_init(|| {
            form_urlencoded::parse(self.uri.query().unwrap_or_default().as_bytes())
                .into_owned()
                .collect()
        })
    }
    pub fn query<'de, T>(&'de self, key: &str) -> Option<T>
    where
        T: Deserialize<'de>,
    {
        self.queries()
            .get_vec(key)
            .and_then(|vs| from_str_multi_val(vs.iter().map(|v| v.as_str())).ok())
    }

    /// Reads the whole body once, later calls return the cached bytes.
    pub async fn payload(&mut self) -> Result<&Vec<u8>, ParseError> {
        let body = if self.payload.initialized() {
            None
        } else {
            self.body.take()
        };
        self.payload
            .get_or_try_init(|| async move {
                match body {
                    Some(body) => hyper::body::to_bytes(body)
                        .await
                        .map(|d| d.to_vec())
                        .map_err(ParseError::Hyper),
                    None => Err(ParseError::BodyConsumed),
                }
            })
            .await
    }

    /// Parsed form fields of an urlencoded or multipart body.
    pub async fn form_data(&mut self) -> Result<&FormData, ParseError> {
        let ctype = self
            .headers
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_owned();
        if !FormData::is_form_type(&ctype) {
            return Err(ParseError::InvalidContentType);
        }
        if !self.form_data.initialized() {
            self.payload().await?;
        }
        let payload = self.payload.get().map(|p| p.as_slice()).unwrap_or_default();
        self.form_data
            .get_or_try_init(|| FormData::read(&ctype, payload))
            .await
    }

    pub async fn parse_json<T>(&mut self) -> Result<T, ParseError>
    where
        T: DeserializeOwned,
    {
        let payload = self.payload().await?;
        if payload.is_empty() {
            return Err(ParseError::EmptyBody);
        }
        Ok(serde_json::from_slice::<T>(payload)?)
    }
}
