use std::io::Error as IoError;
use std::net::{IpAddr, SocketAddr as StdSocketAddr, ToSocketAddrs};
use std::pin::Pin;
use std::task::{Context, Poll};

use hyper::server::accept::Accept;
use hyper::server::conn::{AddrIncoming, AddrStream};

pub trait Listener: Accept {}

pub struct TcpListener {
    incoming: AddrIncoming,
}

impl TcpListener {
    pub fn incoming(&self) -> &AddrIncoming {
        &self.incoming
    }
    pub fn local_addr(&self) -> StdSocketAddr {
        self.incoming.local_addr()
    }
    /// Binds the listener, panics when the address can not be bound.
    pub fn bind(incoming: impl IntoAddrIncoming) -> Self {
        match Self::try_bind(incoming) {
            Ok(listener) => listener,
            Err(e) => panic!("failed to bind tcp listener: {}", e),
        }
    }
    pub fn try_bind(incoming: impl IntoAddrIncoming) -> Result<Self, IoError> {
        Ok(TcpListener {
            incoming: incoming.into_incoming()?,
        })
    }
}

impl Listener for TcpListener {}
impl Accept for TcpListener {
    type Conn = AddrStream;
    type Error = IoError;
    fn poll_accept(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Self::Conn, Self::Error>>> {
        Pin::new(&mut self.get_mut().incoming).poll_accept(cx)
    }
}

pub trait IntoAddrIncoming {
    fn into_incoming(self) -> Result<AddrIncoming, IoError>;
}

fn bind_nodelay(addr: &StdSocketAddr) -> Result<AddrIncoming, IoError> {
    let mut incoming = AddrIncoming::bind(addr).map_err(IoError::other)?;
    incoming.set_nodelay(true);
    Ok(incoming)
}

impl IntoAddrIncoming for StdSocketAddr {
    fn into_incoming(self) -> Result<AddrIncoming, IoError> {
        bind_nodelay(&self)
    }
}

impl IntoAddrIncoming for AddrIncoming {
    fn into_incoming(self) -> Result<AddrIncoming, IoError> {
        Ok(self)
    }
}

impl<T: ToSocketAddrs + ?Sized> IntoAddrIncoming for &T {
    fn into_incoming(self) -> Result<AddrIncoming, IoError> {
        let mut last_error = None;
        for addr in self.to_socket_addrs()? {
            match bind_nodelay(&addr) {
                Ok(incoming) => return Ok(incoming),
                Err(e) => last_error = Some(e),
            }
        }
        Err(last_error.unwrap_or_else(|| IoError::other("no socket address resolved")))
    }
}

impl<I: Into<IpAddr>> IntoAddrIncoming for (I, u16) {
    fn into_incoming(self) -> Result<AddrIncoming, IoError> {
        bind_nodelay(&StdSocketAddr::new(self.0.into(), self.1))
    }
}

#[cfg(test)]
mod tests {
    use futures_util::future::poll_fn;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpStream;

    use super::*;

    #[tokio::test]
    async fn test_tcp_listener() {
        let mut listener = TcpListener::bind(&"127.0.0.1:0");
        let addr = listener.local_addr();

        tokio::spawn(async move {
            let mut stream = TcpStream::connect(addr).await.unwrap();
            stream.write_i32(150).await.unwrap();
        });

        let mut stream = poll_fn(|cx| Pin::new(&mut listener).poll_accept(cx))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stream.read_i32().await.unwrap(), 150);
    }

    #[test]
    fn test_try_bind_invalid() {
        assert!(TcpListener::try_bind(&"not an address").is_err());
    }
}
