use std::fmt::Write;
use std::sync::Arc;

use async_trait::async_trait;
use quick_xml::escape::escape;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer as XmlWriter;
use serde_json::Value;

use super::{View, ViewData, ViewSource};
use crate::error::Error;
use crate::webservice::WebServiceError;

const DEFAULT_PREFIX: &str = "webservice/default/";

/// The fallback views under `webservice/default/`: json, xml, html and php.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuiltinViews;

impl BuiltinViews {
    fn view(path: &str) -> Option<Arc<dyn View>> {
        match path.strip_prefix(DEFAULT_PREFIX)? {
            "json" => Some(Arc::new(JsonView)),
            "xml" => Some(Arc::new(XmlView)),
            "html" => Some(Arc::new(HtmlView)),
            "php" => Some(Arc::new(PhpView)),
            _ => None,
        }
    }
}

#[async_trait]
impl ViewSource for BuiltinViews {
    async fn exists(&self, path: &str) -> bool {
        BuiltinViews::view(path).is_some()
    }
    async fn load(&self, path: &str) -> crate::Result<Arc<dyn View>> {
        BuiltinViews::view(path).ok_or_else(|| WebServiceError::ViewNotFound.into())
    }
}

struct JsonView;
impl View for JsonView {
    fn render(&self, data: &ViewData) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(&data.content)?)
    }
    fn content_type(&self) -> Option<&str> {
        Some("application/json; charset=utf-8")
    }
}

struct XmlView;
impl View for XmlView {
    fn render(&self, data: &ViewData) -> crate::Result<Vec<u8>> {
        Ok(xml_document(&data.content)?.into_bytes())
    }
    fn content_type(&self) -> Option<&str> {
        Some("application/xml; charset=utf-8")
    }
}

struct HtmlView;
impl View for HtmlView {
    fn render(&self, data: &ViewData) -> crate::Result<Vec<u8>> {
        let pretty = serde_json::to_string_pretty(&data.content)?;
        let page = format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{}</title>
</head>
<body>
    <pre>{}</pre>
</body>
</html>
"#,
            escape(&data.uri),
            escape(&pretty)
        );
        Ok(page.into_bytes())
    }
    fn content_type(&self) -> Option<&str> {
        Some("text/html; charset=utf-8")
    }
}

struct PhpView;
impl View for PhpView {
    fn render(&self, data: &ViewData) -> crate::Result<Vec<u8>> {
        Ok(php_serialize(&data.content).into_bytes())
    }
}

/// Element name for an object key, characters XML does not allow become `_`.
fn element_name(key: &str) -> String {
    let mut name: String = key
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    match name.chars().next() {
        None => name.push_str("item"),
        Some(c) if !(c.is_alphabetic() || c == '_') => name.insert(0, '_'),
        _ => {}
    }
    name
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn put(writer: &mut XmlWriter<Vec<u8>>, event: Event<'_>) -> crate::Result<()> {
    writer.write_event(event).map_err(Error::other)
}

fn write_element(writer: &mut XmlWriter<Vec<u8>>, name: &str, value: &Value) -> crate::Result<()> {
    match value {
        Value::Object(map) => {
            put(writer, Event::Start(BytesStart::new(name)))?;
            for (key, value) in map {
                write_element(writer, &element_name(key), value)?;
            }
            put(writer, Event::End(BytesEnd::new(name)))
        }
        Value::Array(items) => {
            put(writer, Event::Start(BytesStart::new(name)))?;
            for item in items {
                write_element(writer, "item", item)?;
            }
            put(writer, Event::End(BytesEnd::new(name)))
        }
        scalar => {
            let text = scalar_text(scalar);
            if text.is_empty() {
                put(writer, Event::Empty(BytesStart::new(name)))
            } else {
                put(writer, Event::Start(BytesStart::new(name)))?;
                put(writer, Event::Text(BytesText::new(&text)))?;
                put(writer, Event::End(BytesEnd::new(name)))
            }
        }
    }
}

/// XML document with a `<root>` element. Object keys become child elements,
/// array items become `<item>` children and any other content is wrapped in a
/// single `<content>` element.
pub fn xml_document(content: &Value) -> crate::Result<String> {
    let mut writer = XmlWriter::new(Vec::new());
    put(&mut writer, Event::Decl(BytesDecl::new("1.0", None, None)))?;
    writer.get_mut().push(b'\n');
    match content {
        Value::Object(_) | Value::Array(_) => write_element(&mut writer, "root", content)?,
        scalar => {
            put(&mut writer, Event::Start(BytesStart::new("root")))?;
            write_element(&mut writer, "content", scalar)?;
            put(&mut writer, Event::End(BytesEnd::new("root")))?;
        }
    }
    let mut out = writer.into_inner();
    out.push(b'\n');
    String::from_utf8(out).map_err(Error::other)
}

fn php_string(out: &mut String, s: &str) {
    let _ = write!(out, "s:{}:\"{}\";", s.len(), s);
}

fn php_key(out: &mut String, key: &str) {
    match key.parse::<i64>() {
        Ok(index) if index.to_string() == key => {
            let _ = write!(out, "i:{};", index);
        }
        _ => php_string(out, key),
    }
}

fn php_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("N;"),
        Value::Bool(b) => {
            let _ = write!(out, "b:{};", u8::from(*b));
        }
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                let _ = write!(out, "i:{};", i);
            } else if let Some(u) = n.as_u64() {
                let _ = write!(out, "d:{};", u as f64);
            } else {
                let _ = write!(out, "d:{};", n.as_f64().unwrap_or_default());
            }
        }
        Value::String(s) => php_string(out, s),
        Value::Array(items) => {
            let _ = write!(out, "a:{}:{{", items.len());
            for (index, item) in items.iter().enumerate() {
                let _ = write!(out, "i:{};", index);
                php_value(out, item);
            }
            out.push('}');
        }
        Value::Object(map) => {
            let _ = write!(out, "a:{}:{{", map.len());
            for (key, item) in map {
                php_key(out, key);
                php_value(out, item);
            }
            out.push('}');
        }
    }
}

/// Encodes content the way PHP's `serialize()` encodes the equivalent array.
/// String lengths count bytes.
pub fn php_serialize(content: &Value) -> String {
    let mut out = String::new();
    php_value(&mut out, content);
    out
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_xml_document() {
        let doc = xml_document(&json!({"user": {"name": "Ada & co", "age": 36}, "tags": ["a", "b"]})).unwrap();
        assert_eq!(
            doc,
            "<?xml version=\"1.0\"?>\n<root><tags><item>a</item><item>b</item></tags><user><age>36</age><name>Ada &amp; co</name></user></root>\n"
        );
        assert_eq!(
            xml_document(&json!("hello")).unwrap(),
            "<?xml version=\"1.0\"?>\n<root><content>hello</content></root>\n"
        );
        assert_eq!(
            xml_document(&Value::Null).unwrap(),
            "<?xml version=\"1.0\"?>\n<root><content/></root>\n"
        );
        assert_eq!(
            xml_document(&json!({"1st key": null})).unwrap(),
            "<?xml version=\"1.0\"?>\n<root><_1st_key/></root>\n"
        );
        assert_eq!(
            xml_document(&json!(["<b>", "x > y"])).unwrap(),
            "<?xml version=\"1.0\"?>\n<root><item>&lt;b&gt;</item><item>x &gt; y</item></root>\n"
        );
    }

    #[test]
    fn test_php_serialize() {
        assert_eq!(php_serialize(&Value::Null), "N;");
        assert_eq!(php_serialize(&json!(true)), "b:1;");
        assert_eq!(php_serialize(&json!(-3)), "i:-3;");
        assert_eq!(php_serialize(&json!(0.5)), "d:0.5;");
        assert_eq!(php_serialize(&json!("héllo")), "s:6:\"héllo\";");
        assert_eq!(
            php_serialize(&json!(["a", 1])),
            "a:2:{i:0;s:1:\"a\";i:1;i:1;}"
        );
        assert_eq!(
            php_serialize(&json!({"7": false, "name": "ada"})),
            "a:2:{i:7;b:0;s:4:\"name\";s:3:\"ada\";}"
        );
    }

    #[tokio::test]
    async fn test_builtin_views() {
        let views = BuiltinViews;
        for format in ["json", "xml", "html", "php"] {
            assert!(views.exists(&format!("webservice/default/{}", format)).await);
        }
        assert!(!views.exists("webservice/default/form").await);
        assert!(!views.exists("users/json").await);
        assert!(views.load("users/json").await.is_err());

        let data = ViewData {
            content: json!({"message": "<hi>"}),
            uri: "/users".into(),
            format: "html".into(),
        };
        let view = views.load("webservice/default/html").await.unwrap();
        let page = String::from_utf8(view.render(&data).unwrap()).unwrap();
        assert!(page.contains("&quot;message&quot;: &quot;&lt;hi&gt;&quot;"));
        assert_eq!(view.content_type(), Some("text/html; charset=utf-8"));

        let view = views.load("webservice/default/php").await.unwrap();
        assert!(view.content_type().is_none());
    }
}
