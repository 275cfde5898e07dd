use std::convert::Infallible;

use bytes::Bytes;
use multer::Multipart;
use multimap::MultiMap;

use super::errors::ParseError;

/// Text fields of an urlencoded or multipart body.
///
/// Multipart parts carrying their own `Content-Type` (file uploads) are skipped.
#[derive(Debug, Default)]
pub struct FormData {
    pub fields: MultiMap<String, String>,
}

impl FormData {
    pub fn new() -> FormData {
        FormData {
            fields: MultiMap::new(),
        }
    }
    pub(crate) fn is_form_type(ctype: &str) -> bool {
        ctype.starts_with("application/x-www-form-urlencoded") || ctype.starts_with("multipart/")
    }
    /// Parses an urlencoded body, as browsers send it for `<form>` posts.
    pub fn parse_urlencoded(data: &[u8]) -> FormData {
        FormData {
            fields: form_urlencoded::parse(data).into_owned().collect(),
        }
    }
    pub(crate) async fn read(ctype: &str, payload: &[u8]) -> Result<FormData, ParseError> {
        if ctype.starts_with("application/x-www-form-urlencoded") {
            Ok(FormData::parse_urlencoded(payload))
        } else if ctype.starts_with("multipart/") {
            let boundary = multer::parse_boundary(ctype)?;
            let data = Bytes::copy_from_slice(payload);
            let stream = futures_util::stream::once(async move { Ok::<_, Infallible>(data) });
            let mut multipart = Multipart::new(stream, boundary);
            let mut form_data = FormData::new();
            while let Some(field) = multipart.next_field().await? {
                if field.content_type().is_some() {
                    continue;
                }
                if let Some(name) = field.name().map(|s| s.to_owned()) {
                    form_data.fields.insert(name, field.text().await?);
                }
            }
            Ok(form_data)
        } else {
            Err(ParseError::InvalidContentType)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_urlencoded() {
        let form = FormData::read("application/x-www-form-urlencoded", b"a=1&b=x+y&a=2")
            .await
            .unwrap();
        assert_eq!(form.fields.get_vec("a").unwrap(), &vec!["1", "2"]);
        assert_eq!(form.fields.get("b").unwrap(), "x y");
    }

    #[tokio::test]
    async fn test_read_multipart() {
        let body = "--X-BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"name\"\r\n\r\n\
            jobs\r\n\
            --X-BOUNDARY\r\n\
            Content-Disposition: form-data; name=\"file\"; filename=\"a.txt\"\r\n\
            Content-Type: text/plain\r\n\r\n\
            content\r\n\
            --X-BOUNDARY--\r\n";
        let form = FormData::read("multipart/form-data; boundary=X-BOUNDARY", body.as_bytes())
            .await
            .unwrap();
        assert_eq!(form.fields.get("name").unwrap(), "jobs");
        assert!(form.fields.get("file").is_none());
    }

    #[tokio::test]
    async fn test_read_other_type() {
        assert!(matches!(
            FormData::read("application/json", b"{}").await,
            Err(ParseError::InvalidContentType)
        ));
    }
}
