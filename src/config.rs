use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::negotiation::{AllowedFormats, FormatRegistry, FormatSpec, Negotiator};
use crate::view::{BuiltinViews, DirViews, LayeredViews};

/// Settings of a web service process, read from JSON.
///
/// Every field is optional, missing ones keep the built-in values:
///
/// ```json
/// {
///     "addr": "0.0.0.0:8080",
///     "allowed": { "input": ["json", "form"], "output": ["json", "xml"] },
///     "views_dir": "views"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebServiceConfig {
    pub addr: String,
    pub formats: Vec<FormatSpec>,
    pub allowed: AllowedFormats,
    /// Directory of application templates, consulted before the built-in views.
    pub views_dir: Option<PathBuf>,
    pub template_extension: String,
}

impl Default for WebServiceConfig {
    fn default() -> Self {
        WebServiceConfig {
            addr: "127.0.0.1:7878".into(),
            formats: FormatRegistry::default().formats().to_vec(),
            allowed: AllowedFormats::default(),
            views_dir: None,
            template_extension: "tpl".into(),
        }
    }
}

impl WebServiceConfig {
    pub fn from_json(json: &str) -> crate::Result<Self> {
        let config: WebServiceConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub async fn load(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let json = tokio::fs::read_to_string(path).await?;
        let config = WebServiceConfig::from_json(&json)?;
        tracing::info!(path = ?path, "config loaded");
        Ok(config)
    }

    /// Checks that the allowed formats are registered and output has a default.
    pub fn validate(&self) -> crate::Result<()> {
        let registry = FormatRegistry::new(self.formats.clone());
        let unknown = self.allowed.unknown_keys(&registry);
        if !unknown.is_empty() {
            return Err(Error::other(format!(
                "allowed formats not registered: {}",
                unknown.join(", ")
            )));
        }
        if self.allowed.output.is_empty() {
            return Err(Error::other("no output format allowed"));
        }
        Ok(())
    }

    pub fn negotiator(&self) -> Negotiator {
        Negotiator::new(
            FormatRegistry::new(self.formats.clone()),
            self.allowed.clone(),
        )
    }

    /// The configured template directory, if any, over the built-in views.
    pub fn views(&self) -> LayeredViews {
        let views = LayeredViews::new();
        let views = match &self.views_dir {
            Some(dir) => views.push(DirViews::new(dir).with_extension(self.template_extension.clone())),
            None => views,
        };
        views.push(BuiltinViews)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WebServiceConfig::from_json("{}").unwrap();
        assert_eq!(config, WebServiceConfig::default());
        assert_eq!(config.allowed.default_output(), Some("html"));
        assert_eq!(config.views().len(), 1);
        let negotiator = config.negotiator();
        assert_eq!(negotiator.registry().mime_types_for("php"), ["application/vnd.php.serialized"]);
    }

    #[test]
    fn test_partial_config() {
        let config = WebServiceConfig::from_json(
            r#"{"addr": "0.0.0.0:8080", "allowed": {"input": ["json"], "output": ["json", "xml"]}, "views_dir": "views"}"#,
        )
        .unwrap();
        assert_eq!(config.addr, "0.0.0.0:8080");
        assert_eq!(config.template_extension, "tpl");
        assert_eq!(config.views().len(), 2);
        let result = config
            .negotiator()
            .resolve_output_format::<&str>(None, &[])
            .unwrap();
        assert_eq!(result.format, "json");
    }

    #[test]
    fn test_invalid_config() {
        let err = WebServiceConfig::from_json(r#"{"allowed": {"input": ["json"], "output": ["yaml"]}}"#)
            .unwrap_err();
        assert!(err.to_string().contains("yaml"));
        assert!(WebServiceConfig::from_json(r#"{"allowed": {"input": [], "output": []}}"#).is_err());
        assert!(WebServiceConfig::from_json("[").is_err());
    }

    #[tokio::test]
    async fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("webservice.json");
        std::fs::write(&path, r#"{"formats": [{"key": "json", "mime_types": ["application/json"]}], "allowed": {"input": ["json"], "output": ["json"]}}"#).unwrap();
        let config = WebServiceConfig::load(&path).await.unwrap();
        assert_eq!(config.formats.len(), 1);
        assert!(WebServiceConfig::load(dir.path().join("missing.json")).await.is_err());
    }
}
