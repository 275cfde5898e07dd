use hyper::{header, StatusCode};
use mime::Mime;
use quick_xml::escape::escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer as XmlWriter;

use crate::{
    depot::Depot,
    http::{errors::StatusError, guess_accept_mime, request::Request, response::Response},
};

const EMPTY_DETAIL_MSG: &str = "there is no more detailed explanation";

/// Fills the body of an error response nothing else has written to.
pub trait Catcher: Send + Sync + 'static {
    fn catch(&self, req: &Request, depot: &Depot, res: &mut Response) -> bool;
}

struct ErrorPage<'a> {
    code: u16,
    name: &'a str,
    summary: &'a str,
    detail: &'a str,
}

impl<'a> ErrorPage<'a> {
    fn new(err: &'a StatusError) -> Self {
        ErrorPage {
            code: err.code.as_u16(),
            name: &err.name,
            summary: err.summary.as_deref().unwrap_or(&err.name),
            detail: err.detail.as_deref().unwrap_or(EMPTY_DETAIL_MSG),
        }
    }
    fn html(&self) -> String {
        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{0}: {1}</title></head>\n\
             <body>\n<h1>{0}: {1}</h1>\n<h3>{2}</h3>\n<p>{3}</p>\n</body>\n</html>",
            self.code,
            escape(self.name),
            escape(self.summary),
            escape(self.detail),
        )
    }
    fn json(&self) -> String {
        serde_json::json!({
            "error": {
                "code": self.code,
                "name": self.name,
                "summary": self.summary,
                "detail": self.detail,
            }
        })
        .to_string()
    }
    fn plain(&self) -> String {
        format!(
            "code:{},\nname:{},\nsummary:{},\ndetail:{}",
            self.code, self.name, self.summary, self.detail
        )
    }
    fn xml(&self) -> quick_xml::Result<String> {
        let code = self.code.to_string();
        let mut writer = XmlWriter::new(Vec::new());
        writer.write_event(Event::Start(BytesStart::new("error")))?;
        for (name, text) in [
            ("code", code.as_str()),
            ("name", self.name),
            ("summary", self.summary),
            ("detail", self.detail),
        ] {
            writer.write_event(Event::Start(BytesStart::new(name)))?;
            writer.write_event(Event::Text(BytesText::new(text)))?;
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }
        writer.write_event(Event::End(BytesEnd::new("error")))?;
        Ok(String::from_utf8_lossy(&writer.into_inner()).into_owned())
    }
}

/// Renders a status error in the preferred format, html when that format
/// has no error page of its own.
pub fn status_error_bytes(err: &StatusError, prefer_format: &Mime) -> (Mime, Vec<u8>) {
    let page = ErrorPage::new(err);
    let (format, content) = match prefer_format.subtype().as_str() {
        "json" => (prefer_format.clone(), page.json()),
        "xml" => match page.xml() {
            Ok(xml) => (prefer_format.clone(), xml),
            Err(e) => {
                tracing::error!(error = ?e, "failed to write xml error page");
                (mime::TEXT_PLAIN, page.plain())
            }
        },
        "plain" => (prefer_format.clone(), page.plain()),
        _ => (mime::TEXT_HTML, page.html()),
    };
    (format, content.into_bytes())
}

/// Writes the default error page, picking its format from the `Accept` header.
pub struct CatcherImpl;

impl Catcher for CatcherImpl {
    fn catch(&self, req: &Request, _depot: &Depot, res: &mut Response) -> bool {
        let status = res.status_code().unwrap_or(StatusCode::NOT_FOUND);
        if !status.is_server_error() && !status.is_client_error() {
            return false;
        }
        let format = guess_accept_mime(req, None);
        let err = res
            .status_error
            .clone()
            .or_else(|| StatusError::from_code(status))
            .unwrap_or_else(StatusError::internal_server_error);
        let (format, data) = status_error_bytes(&err, &format);
        if let Ok(value) = format.to_string().parse() {
            res.headers_mut().insert(header::CONTENT_TYPE, value);
        }
        if let Err(e) = res.write_body(data) {
            tracing::error!(error = ?e, "failed to write error page");
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;
    use crate::test::{ResponseExt, TestClient};

    use super::*;

    struct CustomError;
    #[async_trait]
    impl Writer for CustomError {
        async fn write(mut self, _req: &mut Request, _depot: &mut Depot, res: &mut Response) {
            res.set_status_code(StatusCode::INTERNAL_SERVER_ERROR);
            res.render("custom error");
        }
    }

    struct Handle404;
    impl Catcher for Handle404 {
        fn catch(&self, _req: &Request, _depot: &Depot, res: &mut Response) -> bool {
            if let Some(StatusCode::NOT_FOUND) = res.status_code() {
                res.render("Custom 404 Error Page");
                true
            } else {
                false
            }
        }
    }

    #[test]
    fn test_status_error_bytes() {
        let err = StatusError::not_acceptable().with_summary("No supported accept types found");
        let (format, data) = status_error_bytes(&err, &mime::APPLICATION_JSON);
        assert_eq!(format, mime::APPLICATION_JSON);
        let value: serde_json::Value = serde_json::from_slice(&data).unwrap();
        assert_eq!(value["error"]["code"], 406);
        assert_eq!(value["error"]["summary"], "No supported accept types found");

        let (format, data) = status_error_bytes(&err, &"application/vnd.php.serialized".parse().unwrap());
        assert_eq!(format, mime::TEXT_HTML);
        assert!(String::from_utf8(data).unwrap().contains("<h1>406: Not Acceptable</h1>"));

        let err = StatusError::bad_request().with_detail("<id> is missing");
        let (_, data) = status_error_bytes(&err, &mime::TEXT_XML);
        assert!(String::from_utf8(data).unwrap().contains("<detail>&lt;id&gt; is missing</detail>"));
    }

    #[tokio::test]
    async fn test_handle_error() {
        #[handler(internal)]
        async fn handler_custom() -> Result<(), CustomError> {
            Err(CustomError)
        }
        let router = Router::new().push(Router::with_path("custom").get(handler_custom));
        let service = Service::new(router);

        let content = TestClient::get("http://127.0.0.1:7878/custom")
            .send(&service)
            .await
            .take_string()
            .await
            .unwrap();
        assert_eq!(content, "custom error");
    }

    #[tokio::test]
    async fn test_custom_catcher() {
        #[handler(internal)]
        async fn hello_world() -> &'static str {
            "Hello World"
        }
        let router = Router::new().get(hello_world);
        let catchers: Vec<Box<dyn Catcher>> = vec![Box::new(Handle404)];
        let service = Service::new(router).with_catchers(catchers);

        let content = TestClient::get("http://127.0.0.1:7878/notfound")
            .send(&service)
            .await
            .take_string()
            .await
            .unwrap();
        assert_eq!(content, "Custom 404 Error Page");
    }
}
