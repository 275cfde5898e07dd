pub mod errors;
pub mod form;
pub mod request;
pub mod response;

pub use hyper::http::uri;
pub use hyper::{header, Method, StatusCode};
pub use mime::{self, Mime};

pub use self::errors::{ParseError, StatusError};
pub use self::request::Request;
pub use self::response::{ResBody, Response};

pub(crate) fn guess_accept_mime(req: &Request, default_type: Option<Mime>) -> Mime {
    let dmime: Mime = default_type.unwrap_or(mime::TEXT_HTML);
    let accept = req.accept();
    accept.first().unwrap_or(&dmime).clone()
}
