use std::net::SocketAddr;

use hyper::server::conn::AddrStream;
use tokio::io::{AsyncRead, AsyncWrite};

/// A connection accepted by a listener.
pub trait Transport: AsyncRead + AsyncWrite {
    fn remote_addr(&self) -> Option<SocketAddr>;
}

impl Transport for AddrStream {
    fn remote_addr(&self) -> Option<SocketAddr> {
        Some(AddrStream::remote_addr(self))
    }
}
