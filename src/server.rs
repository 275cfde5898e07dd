use std::error::Error as StdError;
use std::future::Future;

use hyper::Server as HyperServer;

use crate::{listener::Listener, service::Service, transport::Transport};

/// Accepts connections from a listener and answers them with a [`Service`].
pub struct Server<L> {
    listener: L,
}

impl<L> Server<L>
where
    L: Listener,
    L::Conn: Transport + Send + Unpin + 'static,
    L::Error: Into<Box<dyn StdError + Send + Sync>>,
{
    pub fn new(listener: L) -> Self {
        Server { listener }
    }

    pub async fn try_serve<S>(self, service: S) -> Result<(), hyper::Error>
    where
        S: Into<Service>,
    {
        HyperServer::builder(self.listener)
            .serve(service.into())
            .await
    }

    /// Serves until `signal` resolves, then lets in-flight requests finish.
    pub async fn try_serve_with_graceful_shutdown<S, G>(
        self,
        service: S,
        signal: G,
    ) -> Result<(), hyper::Error>
    where
        S: Into<Service>,
        G: Future<Output = ()> + Send + 'static,
    {
        let server = HyperServer::builder(self.listener).serve(service.into());
        server.with_graceful_shutdown(signal).await.map_err(|e| {
            tracing::error!(error = %e, "server error");
            e
        })
    }
}
