use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tera::{Context, Tera};

use super::{View, ViewData, ViewSource};
use crate::error::Error;
use crate::webservice::WebServiceError;

/// A tera template rendered with `content`, `uri` and `format` in its context.
///
/// Templates whose name ends in `.html`, `.htm` or `.xml` are autoescaped.
/// Structured content is best inserted with `{{ content | json_encode() }}`.
#[derive(Debug, Clone)]
pub struct TemplateView {
    tera: Tera,
    name: String,
    content_type: Option<String>,
}

impl TemplateView {
    pub fn new(name: impl Into<String>, source: &str) -> crate::Result<Self> {
        let name = name.into();
        let mut tera = Tera::default();
        tera.add_raw_template(&name, source).map_err(Error::other)?;
        Ok(TemplateView {
            tera,
            name,
            content_type: None,
        })
    }
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

impl View for TemplateView {
    fn render(&self, data: &ViewData) -> crate::Result<Vec<u8>> {
        let context = Context::from_serialize(data).map_err(Error::other)?;
        let rendered = self.tera.render(&self.name, &context).map_err(Error::other)?;
        Ok(rendered.into_bytes())
    }
    fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }
}

/// Template name for a view path, the trailing format becomes the extension so
/// `users/index/html` is escaped like `users/index.html`.
fn template_name(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, format)) => format!("{}.{}", dir, format),
        None => path.to_owned(),
    }
}

/// Templates stored as `{root}/{path}.{extension}`, cached after the first load.
pub struct DirViews {
    root: PathBuf,
    extension: String,
    cache: RwLock<HashMap<String, Arc<TemplateView>>>,
}

impl std::fmt::Debug for DirViews {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirViews")
            .field("root", &self.root)
            .field("extension", &self.extension)
            .finish()
    }
}

impl DirViews {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        DirViews {
            root: root.into(),
            extension: "tpl".into(),
            cache: RwLock::new(HashMap::new()),
        }
    }
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File for a view path, `None` when the path would leave the root.
    fn file_path(&self, path: &str) -> Option<PathBuf> {
        let relative = Path::new(path);
        if path.is_empty()
            || !relative
                .components()
                .all(|c| matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(format!("{}.{}", path, self.extension)))
    }
}

#[async_trait]
impl ViewSource for DirViews {
    async fn exists(&self, path: &str) -> bool {
        if self.cache.read().contains_key(path) {
            return true;
        }
        match self.file_path(path) {
            Some(file) => tokio::fs::metadata(&file)
                .await
                .map(|m| m.is_file())
                .unwrap_or(false),
            None => false,
        }
    }

    async fn load(&self, path: &str) -> crate::Result<Arc<dyn View>> {
        let cached = self.cache.read().get(path).cloned();
        if let Some(view) = cached {
            return Ok(view);
        }
        let file = self.file_path(path).ok_or(WebServiceError::ViewNotFound)?;
        let source = tokio::fs::read_to_string(&file).await.map_err(|e| {
            tracing::error!(file = ?file, error = ?e, "failed to read view template");
            Error::from(e)
        })?;
        let view = Arc::new(TemplateView::new(template_name(path), &source).map_err(|e| {
            tracing::error!(file = ?file, error = %e, "failed to parse view template");
            e
        })?);
        tracing::debug!(path, file = ?file, "view template loaded");
        self.cache
            .write()
            .entry(path.to_owned())
            .or_insert_with(|| view.clone());
        Ok(view)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_template_render() {
        let view = TemplateView::new(
            "users/txt",
            "{{ uri }} as {{format}}: {{ content.user.name }} {{ content.tags.1 }} {{ content.missing | default(value=\"\") }}",
        )
        .unwrap();
        let data = ViewData {
            content: json!({"user": {"name": "ada"}, "tags": ["a", "b"]}),
            uri: "/users/1".into(),
            format: "txt".into(),
        };
        let out = String::from_utf8(view.render(&data).unwrap()).unwrap();
        assert_eq!(out, "/users/1 as txt: ada b ");

        let view = TemplateView::new("users/json", "{{ content.user | json_encode() }}")
            .unwrap()
            .with_content_type("text/plain");
        assert_eq!(view.render(&data).unwrap(), br#"{"name":"ada"}"#);
        assert_eq!(view.content_type(), Some("text/plain"));

        assert!(TemplateView::new("users/txt", "{{ content").is_err());
        let view = TemplateView::new("users/txt", "{{ nothing }}").unwrap();
        assert!(view.render(&data).is_err());
    }

    #[test]
    fn test_template_escapes_markup_formats() {
        let data = ViewData {
            content: json!({"name": "<script>alert(1)</script>"}),
            ..ViewData::default()
        };
        let source = "<p>{{ content.name }}</p>";

        let view = TemplateView::new(template_name("users/show/html"), source).unwrap();
        let out = String::from_utf8(view.render(&data).unwrap()).unwrap();
        assert!(!out.contains("<script>"));
        assert!(out.starts_with("<p>&lt;script&gt;alert(1)&lt;"));

        let view = TemplateView::new(template_name("users/xml"), source).unwrap();
        let out = String::from_utf8(view.render(&data).unwrap()).unwrap();
        assert!(!out.contains("<script>"));

        let view = TemplateView::new(template_name("users/txt"), source).unwrap();
        let out = String::from_utf8(view.render(&data).unwrap()).unwrap();
        assert_eq!(out, "<p><script>alert(1)</script></p>");
    }

    #[tokio::test]
    async fn test_dir_views() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("users/index")).unwrap();
        std::fs::write(
            dir.path().join("users/index/json.tpl"),
            r#"{"items": {{ content | json_encode() }}}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("users/xml.html"), "<users/>").unwrap();
        std::fs::write(dir.path().join("users/html.html"), "<b>{{ content }}</b>").unwrap();
        std::fs::write(dir.path().join("users/txt.tpl"), "{% if %}").unwrap();

        let views = DirViews::new(dir.path());
        assert!(views.exists("users/index/json").await);
        assert!(!views.exists("users/xml").await);
        assert!(!views.exists("../users/index/json").await);
        assert!(!views.exists("/etc/passwd").await);
        assert!(views.exists("users/txt").await);
        assert!(views.load("users/txt").await.is_err());

        let view = views.load("users/index/json").await.unwrap();
        let data = ViewData {
            content: json!([1, 2]),
            ..ViewData::default()
        };
        assert_eq!(view.render(&data).unwrap(), br#"{"items": [1,2]}"#);

        std::fs::remove_file(dir.path().join("users/index/json.tpl")).unwrap();
        assert!(views.exists("users/index/json").await);
        assert!(views.load("users/index/json").await.is_ok());

        let views = DirViews::new(dir.path()).with_extension("html");
        assert!(views.exists("users/xml").await);
        assert!(views.load("users/json").await.is_err());

        let view = views.load("users/html").await.unwrap();
        let data = ViewData {
            content: json!("<i>&</i>"),
            ..ViewData::default()
        };
        assert_eq!(view.render(&data).unwrap(), b"<b>&lt;i&gt;&amp;&lt;&#x2F;i&gt;</b>");
    }
}
