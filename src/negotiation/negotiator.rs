use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use super::registry::{AllowedFormats, FormatRegistry};
use crate::webservice::WebServiceError;

/// Where a negotiated format came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatSource {
    /// Route parameter such as the `.json` extension.
    ExplicitParam,
    /// The `__input_format` query parameter.
    QueryOverride,
    ContentTypeHeader,
    AcceptHeader,
    Default,
}

impl fmt::Display for FormatSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FormatSource::ExplicitParam => "explicit_param",
            FormatSource::QueryOverride => "query_override",
            FormatSource::ContentTypeHeader => "content_type_header",
            FormatSource::AcceptHeader => "accept_header",
            FormatSource::Default => "default",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NegotiationResult {
    pub format: String,
    pub source: FormatSource,
}

impl NegotiationResult {
    pub fn new(format: impl Into<String>, source: FormatSource) -> Self {
        NegotiationResult {
            format: format.into(),
            source,
        }
    }
}

/// Picks request and response formats against a shared registry.
#[derive(Debug, Clone, Default)]
pub struct Negotiator {
    registry: Arc<FormatRegistry>,
    allowed: Arc<AllowedFormats>,
}

impl Negotiator {
    pub fn new(registry: impl Into<Arc<FormatRegistry>>, allowed: impl Into<Arc<AllowedFormats>>) -> Self {
        Negotiator {
            registry: registry.into(),
            allowed: allowed.into(),
        }
    }
    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }
    pub fn allowed(&self) -> &AllowedFormats {
        &self.allowed
    }

    /// Format of the request body.
    ///
    /// The first non-empty `explicit` value wins, then `query_override` when
    /// present at all (an empty override ends the search), then the format
    /// registered for `content_type`. A format that is not allowed for input
    /// is dropped and the first allowed input format is used instead.
    pub fn resolve_input_format(
        &self,
        explicit: Option<&str>,
        query_override: Option<&str>,
        content_type: Option<&str>,
    ) -> NegotiationResult {
        let candidate = match (explicit, query_override, content_type) {
            (Some(format), _, _) if !format.is_empty() => {
                Some((format, FormatSource::ExplicitParam))
            }
            (_, Some(format), _) => Some((format, FormatSource::QueryOverride)),
            (_, None, Some(ctype)) => self
                .registry
                .format_for_mime::<&str>(ctype, None)
                .map(|format| (format, FormatSource::ContentTypeHeader)),
            _ => None,
        };
        match candidate {
            Some((format, source)) if !format.is_empty() && self.allowed.allows_input(format) => {
                NegotiationResult::new(format, source)
            }
            _ => NegotiationResult::new(
                self.allowed.default_input().unwrap_or_default(),
                FormatSource::Default,
            ),
        }
    }

    /// Format of the response.
    ///
    /// A non-empty `explicit` value must be allowed for output. Otherwise the
    /// first accept type registered under an allowed output format wins. When
    /// nothing matches, an empty list or a `*/*` entry selects the first
    /// allowed output format and a `type/*` entry selects the first allowed
    /// output format with a MIME type of that top-level type. Anything else
    /// is not acceptable.
    pub fn resolve_output_format<S>(
        &self,
        explicit: Option<&str>,
        accept_types: &[S],
    ) -> Result<NegotiationResult, WebServiceError>
    where
        S: AsRef<str>,
    {
        if let Some(format) = explicit.filter(|f| !f.is_empty()) {
            return if self.allowed.allows_output(format) {
                Ok(NegotiationResult::new(format, FormatSource::ExplicitParam))
            } else {
                Err(WebServiceError::NotAcceptable)
            };
        }

        let whitelist = self.registry.mime_types_of(&self.allowed.output);
        if let Some(format) = self
            .registry
            .format_for_mimes(accept_types, Some(whitelist.as_slice()))
        {
            return Ok(NegotiationResult::new(format, FormatSource::AcceptHeader));
        }

        let default = self
            .allowed
            .default_output()
            .filter(|f| !f.is_empty())
            .ok_or(WebServiceError::NotAcceptable)?;
        if accept_types.is_empty() {
            return Ok(NegotiationResult::new(default, FormatSource::Default));
        }
        for accept in accept_types {
            let accept = accept.as_ref();
            if accept == "*/*" || accept == "*" {
                return Ok(NegotiationResult::new(default, FormatSource::Default));
            }
            if let Some(top) = accept.strip_suffix("/*") {
                if let Some(format) = self.first_output_of_type(top) {
                    return Ok(NegotiationResult::new(format, FormatSource::AcceptHeader));
                }
            }
        }
        Err(WebServiceError::NotAcceptable)
    }

    fn first_output_of_type(&self, top: &str) -> Option<&str> {
        self.allowed.output.iter().map(|k| k.as_str()).find(|key| {
            self.registry
                .mime_types_for(key)
                .iter()
                .any(|mime| mime.split('/').next() == Some(top))
        })
    }
}
