use std::collections::HashMap;

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

/// A format key together with the MIME types that select it, most
/// preferred first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatSpec {
    pub key: String,
    pub mime_types: Vec<String>,
}

impl FormatSpec {
    pub fn new<K, I, M>(key: K, mime_types: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = M>,
        M: Into<String>,
    {
        FormatSpec {
            key: key.into(),
            mime_types: mime_types.into_iter().map(Into::into).collect(),
        }
    }
}

/// Ordered table of known formats.
///
/// The reverse table used by [`FormatRegistry::format_for_mime`] is built on
/// first lookup. A MIME type listed under several keys resolves to the key
/// registered first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "Vec<FormatSpec>", into = "Vec<FormatSpec>")]
pub struct FormatRegistry {
    formats: Vec<FormatSpec>,
    mime_map: OnceCell<HashMap<String, String>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        FormatRegistry::new(vec![
            FormatSpec::new(
                "html",
                ["application/html", "application/xhtml", "text/html"],
            ),
            FormatSpec::new("json", ["application/json", "text/json"]),
            FormatSpec::new("xml", ["application/xml", "text/xml"]),
            FormatSpec::new("php", ["application/vnd.php.serialized"]),
            FormatSpec::new("form", ["application/x-www-form-urlencoded"]),
        ])
    }
}

impl From<Vec<FormatSpec>> for FormatRegistry {
    fn from(formats: Vec<FormatSpec>) -> Self {
        FormatRegistry::new(formats)
    }
}

impl From<FormatRegistry> for Vec<FormatSpec> {
    fn from(registry: FormatRegistry) -> Self {
        registry.formats
    }
}

impl FormatRegistry {
    pub fn new(formats: Vec<FormatSpec>) -> Self {
        FormatRegistry {
            formats,
            mime_map: OnceCell::new(),
        }
    }

    pub fn formats(&self) -> &[FormatSpec] {
        &self.formats
    }
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.formats.iter().map(|f| f.key.as_str())
    }
    pub fn contains(&self, key: &str) -> bool {
        self.formats.iter().any(|f| f.key == key)
    }

    /// MIME types registered for `key`, empty for an unknown key.
    pub fn mime_types_for(&self, key: &str) -> &[String] {
        self.formats
            .iter()
            .find(|f| f.key == key)
            .map(|f| f.mime_types.as_slice())
            .unwrap_or_default()
    }

    fn mime_map(&self) -> &HashMap<String, String> {
        self.mime_map.get_or_init(|| {
            let mut map = HashMap::new();
            for format in &self.formats {
                for mime in &format.mime_types {
                    map.entry(mime.clone()).or_insert_with(|| format.key.clone());
                }
            }
            map
        })
    }

    /// Format key of a single MIME type.
    ///
    /// Everything from the first comma on is ignored and the rest is matched
    /// exactly, so `application/json; charset=utf-8` does not resolve. With a
    /// whitelist the MIME string itself must be listed.
    pub fn format_for_mime<S>(&self, mime: &str, whitelist: Option<&[S]>) -> Option<&str>
    where
        S: AsRef<str>,
    {
        let mime = mime.split(',').next().unwrap_or_default();
        let key = self.mime_map().get(mime)?;
        match whitelist {
            Some(list) if !list.iter().any(|m| m.as_ref() == mime) => None,
            _ => Some(key.as_str()),
        }
    }

    /// Key of the first of `mimes` that resolves, in the given order.
    pub fn format_for_mimes<I, T, S>(&self, mimes: I, whitelist: Option<&[S]>) -> Option<&str>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
        S: AsRef<str>,
    {
        mimes
            .into_iter()
            .find_map(|mime| self.format_for_mime(mime.as_ref(), whitelist))
    }

    /// All MIME types of the given keys, in key order.
    pub fn mime_types_of<I, K>(&self, keys: I) -> Vec<String>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        keys.into_iter()
            .flat_map(|key| self.mime_types_for(key.as_ref()).to_vec())
            .collect()
    }
}

/// Formats a controller accepts as request bodies and produces as responses.
/// The first entry of each list is the fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllowedFormats {
    pub input: Vec<String>,
    pub output: Vec<String>,
}

impl Default for AllowedFormats {
    fn default() -> Self {
        AllowedFormats {
            input: vec!["json".into(), "form".into(), "xml".into()],
            output: vec!["html".into(), "json".into(), "xml".into(), "php".into()],
        }
    }
}

impl AllowedFormats {
    pub fn new<I, O, S>(input: I, output: O) -> Self
    where
        I: IntoIterator<Item = S>,
        O: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AllowedFormats {
            input: input.into_iter().map(Into::into).collect(),
            output: output.into_iter().map(Into::into).collect(),
        }
    }
    pub fn allows_input(&self, key: &str) -> bool {
        self.input.iter().any(|k| k == key)
    }
    pub fn allows_output(&self, key: &str) -> bool {
        self.output.iter().any(|k| k == key)
    }
    pub fn default_input(&self) -> Option<&str> {
        self.input.first().map(|s| s.as_str())
    }
    pub fn default_output(&self) -> Option<&str> {
        self.output.first().map(|s| s.as_str())
    }

    /// Names every allowed key the registry does not know.
    pub fn unknown_keys<'a>(&'a self, registry: &FormatRegistry) -> Vec<&'a str> {
        self.input
            .iter()
            .chain(self.output.iter())
            .map(|k| k.as_str())
            .filter(|k| !registry.contains(k))
            .collect()
    }
}
