pub mod catcher;
pub mod config;
pub mod depot;
pub mod error;
pub mod handler;
pub mod http;
pub mod listener;
pub mod negotiation;
pub mod routing;
pub mod serde;
pub mod server;
pub mod service;
pub mod test;
pub mod transport;
pub mod view;
pub mod webservice;
pub mod writer;

pub use async_trait::async_trait;
pub use webservice_macros::handler;

pub use self::catcher::{Catcher, CatcherImpl};
pub use self::config::WebServiceConfig;
pub use self::depot::Depot;
pub use self::error::{BoxedError, Error};
pub use self::handler::Handler;
pub use self::http::{Request, Response};
pub use self::routing::{FlowCtrl, Router};
pub use self::server::Server;
pub use self::service::Service;
pub use self::writer::{Piece, Writer};

pub type Result<T> = std::result::Result<T, Error>;

pub mod prelude {
    pub use async_trait::async_trait;
    pub use webservice_macros::handler;

    pub use crate::depot::Depot;
    pub use crate::handler::Handler;
    pub use crate::http::errors::{ParseError, StatusError};
    pub use crate::http::{Mime, Request, Response, StatusCode};
    pub use crate::listener::TcpListener;
    pub use crate::negotiation::{
        AllowedFormats, FormatRegistry, FormatSource, FormatSpec, NegotiationResult, Negotiator,
        RequestData, VerbMap,
    };
    pub use crate::routing::{FlowCtrl, Router};
    pub use crate::server::Server;
    pub use crate::service::Service;
    pub use crate::view::{BuiltinViews, DirViews, LayeredViews, View, ViewData, ViewSource};
    pub use crate::webservice::{DepotExt, RequestContext, WebService, WebServiceError};
    pub use crate::writer::{Piece, Text, Writer};
    pub use crate::Catcher;
}
