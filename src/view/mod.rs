//! Views render the content an action produced in the negotiated format.
//!
//! A [`ViewSource`] answers whether a view path exists and loads it. Paths
//! have the form `{controller}/{action}/{format}`, `{controller}/{format}` or
//! `webservice/default/{format}`; [`find_view`] tries them in that order.

mod builtin;
mod dir;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

pub use builtin::{php_serialize, xml_document, BuiltinViews};
pub use dir::{DirViews, TemplateView};

use crate::webservice::WebServiceError;

/// Everything a view gets to see.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ViewData {
    pub content: Value,
    pub uri: String,
    pub format: String,
}

pub trait View: Send + Sync + 'static {
    fn render(&self, data: &ViewData) -> crate::Result<Vec<u8>>;
    /// Content type of the rendered body, `None` falls back to the first MIME
    /// type registered for the format.
    fn content_type(&self) -> Option<&str> {
        None
    }
}

#[async_trait]
pub trait ViewSource: Send + Sync + 'static {
    async fn exists(&self, path: &str) -> bool;
    async fn load(&self, path: &str) -> crate::Result<Arc<dyn View>>;
}

#[async_trait]
impl<T> ViewSource for Arc<T>
where
    T: ViewSource + ?Sized,
{
    async fn exists(&self, path: &str) -> bool {
        (**self).exists(path).await
    }
    async fn load(&self, path: &str) -> crate::Result<Arc<dyn View>> {
        (**self).load(path).await
    }
}

/// Consults several sources in order, the first one holding a path wins.
#[derive(Default, Clone)]
pub struct LayeredViews {
    layers: Vec<Arc<dyn ViewSource>>,
}

impl LayeredViews {
    pub fn new() -> Self {
        LayeredViews { layers: Vec::new() }
    }
    pub fn push(mut self, source: impl ViewSource) -> Self {
        self.layers.push(Arc::new(source));
        self
    }
    pub fn len(&self) -> usize {
        self.layers.len()
    }
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

#[async_trait]
impl ViewSource for LayeredViews {
    async fn exists(&self, path: &str) -> bool {
        for layer in &self.layers {
            if layer.exists(path).await {
                return true;
            }
        }
        false
    }
    async fn load(&self, path: &str) -> crate::Result<Arc<dyn View>> {
        for layer in &self.layers {
            if layer.exists(path).await {
                return layer.load(path).await;
            }
        }
        Err(WebServiceError::ViewNotFound.into())
    }
}

/// View paths to try for a request, most specific first.
pub fn candidate_paths(controller: &str, action: &str, format: &str) -> Vec<String> {
    let controller = controller.to_lowercase();
    let action = action.to_lowercase();
    vec![
        format!("{}/{}/{}", controller, action, format),
        format!("{}/{}", controller, format),
        format!("webservice/default/{}", format),
    ]
}

/// Loads the first candidate view the source holds.
pub async fn find_view(
    source: &dyn ViewSource,
    controller: &str,
    action: &str,
    format: &str,
) -> Result<(String, Arc<dyn View>), WebServiceError> {
    for path in candidate_paths(controller, action, format) {
        if !source.exists(&path).await {
            continue;
        }
        return match source.load(&path).await {
            Ok(view) => Ok((path, view)),
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to load view");
                Err(WebServiceError::ViewNotFound)
            }
        };
    }
    tracing::error!(controller, action, format, "no view found");
    Err(WebServiceError::ViewNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(&'static str);
    impl View for Fixed {
        fn render(&self, _data: &ViewData) -> crate::Result<Vec<u8>> {
            Ok(self.0.as_bytes().to_vec())
        }
    }

    struct OnePath(&'static str);
    #[async_trait]
    impl ViewSource for OnePath {
        async fn exists(&self, path: &str) -> bool {
            path == self.0
        }
        async fn load(&self, path: &str) -> crate::Result<Arc<dyn View>> {
            if path == self.0 {
                Ok(Arc::new(Fixed(self.0)))
            } else {
                Err(WebServiceError::ViewNotFound.into())
            }
        }
    }

    #[test]
    fn test_candidate_paths() {
        assert_eq!(
            candidate_paths("Users", "Index", "json"),
            vec!["users/index/json", "users/json", "webservice/default/json"]
        );
    }

    #[tokio::test]
    async fn test_find_view_order() {
        let views = LayeredViews::new()
            .push(OnePath("users/json"))
            .push(OnePath("users/index/json"))
            .push(BuiltinViews);
        let (path, view) = find_view(&views, "users", "index", "json").await.unwrap();
        assert_eq!(path, "users/index/json");
        assert_eq!(view.render(&ViewData::default()).unwrap(), b"users/index/json");

        let (path, _) = find_view(&views, "users", "create", "json").await.unwrap();
        assert_eq!(path, "users/json");

        let (path, _) = find_view(&views, "posts", "index", "xml").await.unwrap();
        assert_eq!(path, "webservice/default/xml");

        let err = find_view(&views, "posts", "index", "yaml").await.err().unwrap();
        assert_eq!(err, WebServiceError::ViewNotFound);
    }
}
