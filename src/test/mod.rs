//! Helpers for driving a [`Service`](crate::Service) without a socket.

mod client;
mod response;

pub use client::TestClient;
pub use request::RequestBuilder;
pub use response::ResponseExt;
