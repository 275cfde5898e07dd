use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::StreamExt;
use serde::de::DeserializeOwned;

use crate::error::Error;
use crate::http::Response;

/// Reads back the body written into a [`Response`].
#[async_trait]
pub trait ResponseExt {
    async fn take_bytes(&mut self) -> crate::Result<Bytes>;
    async fn take_string(&mut self) -> crate::Result<String>;
    async fn take_json<T: DeserializeOwned>(&mut self) -> crate::Result<T>;
}

#[async_trait]
impl ResponseExt for Response {
    async fn take_bytes(&mut self) -> crate::Result<Bytes> {
        let mut body = self.take_body();
        let mut data = BytesMut::new();
        while let Some(chunk) = body.next().await {
            data.extend_from_slice(&chunk.map_err(Error::Other)?);
        }
        Ok(data.freeze())
    }
    async fn take_string(&mut self) -> crate::Result<String> {
        let bytes = self.take_bytes().await?;
        String::from_utf8(bytes.to_vec()).map_err(Error::other)
    }
    async fn take_json<T: DeserializeOwned>(&mut self) -> crate::Result<T> {
        let bytes = self.take_bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
