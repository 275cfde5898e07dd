use std::future::Future;
use std::io::Error as IoError;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;

use futures_util::future;

use crate::catcher::{Catcher, CatcherImpl};
use crate::depot::Depot;
use crate::http::header::CONTENT_TYPE;
use crate::http::{Request, Response, StatusCode};
use crate::routing::{FlowCtrl, PathState, Router};
use crate::transport::Transport;

pub struct Service {
    pub(crate) router: Arc<Router>,
    pub(crate) catchers: Arc<Vec<Box<dyn Catcher>>>,
}

impl Service {
    pub fn new<T>(router: T) -> Service
    where
        T: Into<Arc<Router>>,
    {
        Service {
            router: router.into(),
            catchers: Arc::new(vec![]),
        }
    }
    pub fn router(&self) -> Arc<Router> {
        self.router.clone()
    }
    pub fn with_catchers<T>(mut self, catchers: T) -> Self
    where
        T: Into<Arc<Vec<Box<dyn Catcher>>>>,
    {
        self.catchers = catchers.into();
        self
    }
    pub fn catchers(&self) -> Arc<Vec<Box<dyn Catcher>>> {
        self.catchers.clone()
    }
    pub fn hyper_handler(&self, remote_addr: Option<SocketAddr>) -> HyperHandler {
        HyperHandler {
            remote_addr,
            router: self.router.clone(),
            catchers: self.catchers.clone(),
        }
    }
    pub async fn handle(&self, request: impl Into<Request>) -> Response {
        self.hyper_handler(None).handle(request.into()).await
    }
}

impl From<Router> for Service {
    fn from(router: Router) -> Self {
        Service::new(router)
    }
}

#[derive(Clone)]
pub struct HyperHandler {
    pub(crate) remote_addr: Option<SocketAddr>,
    pub(crate) router: Arc<Router>,
    pub(crate) catchers: Arc<Vec<Box<dyn Catcher>>>,
}

impl HyperHandler {
    /// Routes `req`, runs the matched chain and fills in what the handlers
    /// left unset: a status code, and an error page for bodiless errors.
    pub fn handle(&self, mut req: Request) -> impl Future<Output = Response> {
        req.remote_addr = self.remote_addr;
        let router = self.router.clone();
        let catchers = self.catchers.clone();

        async move {
            let mut res = Response::new();
            let mut depot = Depot::new();
            let mut path_state = PathState::new(req.uri().path());
            match router.detect(&mut req, &mut path_state) {
                Some(matched) => {
                    req.params = path_state.params;
                    let mut ctrl = FlowCtrl::new([&matched.hoops[..], &[matched.handler]].concat());
                    ctrl.call_next(&mut req, &mut depot, &mut res).await;
                }
                None => res.set_status_code(StatusCode::NOT_FOUND),
            }

            let status = match res.status_code() {
                Some(status) => status,
                None => {
                    let status = if res.body.is_none() {
                        StatusCode::NOT_FOUND
                    } else {
                        StatusCode::OK
                    };
                    res.set_status_code(status);
                    status
                }
            };
            if !res.body.is_none() && res.headers().get(CONTENT_TYPE).is_none() {
                tracing::warn!(uri = ?req.uri(), method = req.method().as_str(), "response has no content type");
            }
            if res.body.is_none() && (status.is_client_error() || status.is_server_error()) {
                let caught = catchers.iter().any(|c| c.catch(&req, &depot, &mut res));
                if !caught {
                    CatcherImpl.catch(&req, &depot, &mut res);
                }
            }

            tracing::debug!(
                remote_addr = ?req.remote_addr(),
                method = req.method().as_str(),
                uri = ?req.uri(),
                status = status.as_u16(),
                "request handled"
            );
            res
        }
    }
}

impl hyper::service::Service<hyper::Request<hyper::body::Body>> for HyperHandler {
    type Response = hyper::Response<hyper::body::Body>;
    type Error = hyper::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;
    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        std::task::Poll::Ready(Ok(()))
    }
    fn call(&mut self, req: hyper::Request<hyper::body::Body>) -> Self::Future {
        let response = self.handle(req.into());
        let fut = async move {
            let mut hyper_response = hyper::Response::<hyper::Body>::new(hyper::Body::empty());
            response.await.write_back(&mut hyper_response).await;
            Ok(hyper_response)
        };
        Box::pin(fut)
    }
}

impl<'t, T> hyper::service::Service<&'t T> for Service
where
    T: Transport,
{
    type Response = HyperHandler;
    type Error = IoError;
    type Future = future::Ready<Result<Self::Response, Self::Error>>;

    fn poll_ready(
        &mut self,
        _cx: &mut std::task::Context<'_>,
    ) -> std::task::Poll<Result<(), Self::Error>> {
        Ok(()).into()
    }
    fn call(&mut self, req: &'t T) -> Self::Future {
        future::ok(self.hyper_handler(req.remote_addr()))
    }
}
