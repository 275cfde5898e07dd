use hyper::body::Bytes;
use hyper::{header::CONTENT_TYPE, http::HeaderValue};

use crate::http::Response;

use super::Piece;

/// Text body with a fixed utf-8 content type.
pub enum Text<C> {
    /// `text/plain; charset=utf-8`
    Plain(C),
    /// `text/html; charset=utf-8`
    Html(C),
}

impl<C> Text<C> {
    fn split(self) -> (&'static str, C) {
        match self {
            Self::Plain(content) => ("text/plain; charset=utf-8", content),
            Self::Html(content) => ("text/html; charset=utf-8", content),
        }
    }
}

impl<C> Piece for Text<C>
where
    C: Into<Bytes>,
{
    fn render(self, res: &mut Response) {
        let (ctype, content) = self.split();
        res.headers_mut().insert(CONTENT_TYPE, HeaderValue::from_static(ctype));
        if let Err(e) = res.write_body(content) {
            tracing::error!(error = ?e, "failed to write text body");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_headers() {
        let mut res = Response::new();
        res.render(Text::Plain("plain"));
        assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "text/plain; charset=utf-8");

        let mut res = Response::new();
        res.render(Text::Html(String::from("<p>hi</p>")));
        assert_eq!(res.headers().get(CONTENT_TYPE).unwrap(), "text/html; charset=utf-8");
        assert_eq!(res.body().size(), 9);
    }
}
