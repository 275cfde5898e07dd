//! Resource controllers with content negotiation.
//!
//! A [`WebService`] is a [`Handler`] that runs in three stages:
//!
//! 1. negotiate the response format from the `format` route parameter or the
//!    `Accept` header, and map the HTTP method to an action name,
//! 2. dispatch to the handler registered for that action,
//! 3. render the content the action left in the [`RequestContext`] with the
//!    first view found for the controller, action and format.
//!
//! ```no_run
//! use webservice_t::prelude::*;
//!
//! #[handler]
//! async fn index(depot: &mut Depot) {
//!     if let Some(ctx) = depot.ws_context_mut() {
//!         ctx.set_content_value(serde_json::json!({"users": []}));
//!     }
//! }
//!
//! let router = Router::with_path("users.<format>").handle(WebService::new("users").index(index));
//! ```

mod error;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::Method;
use multimap::MultiMap;
use serde::Serialize;
use serde_json::Value;

pub use error::WebServiceError;

use crate::depot::Depot;
use crate::handler::Handler;
use crate::http::errors::ParseError;
use crate::http::form::FormData;
use crate::http::{Request, Response, StatusCode, StatusError};
use crate::negotiation::{NegotiationResult, Negotiator, RequestData, VerbMap, INVALID_ACTION};
use crate::routing::FlowCtrl;
use crate::view::{find_view, BuiltinViews, ViewData, ViewSource};
use crate::writer::Writer;

/// Route parameter naming the response format, usually the path extension.
pub const FORMAT_PARAM: &str = "format";
/// Route parameter naming the request body format.
pub const INPUT_FORMAT_PARAM: &str = "input_format";
/// Route parameter holding the action the client asked for.
pub const ACTION_PARAM: &str = "action";
/// Query parameter overriding the request body format.
pub const INPUT_FORMAT_QUERY: &str = "__input_format";
/// Request parameter carrying the body in place of the payload.
pub const DATA_PARAM: &str = "__data";

/// Per-request negotiation state, stored in the [`Depot`].
#[derive(Debug)]
pub struct RequestContext {
    negotiator: Negotiator,
    controller: String,
    requested_action: Option<String>,
    method: Method,
    action: String,
    output: NegotiationResult,
    input: Option<NegotiationResult>,
    data: Option<RequestData>,
    content: Value,
}

impl RequestContext {
    pub fn new(
        negotiator: Negotiator,
        controller: impl Into<String>,
        method: Method,
        action: impl Into<String>,
        output: NegotiationResult,
    ) -> Self {
        RequestContext {
            negotiator,
            controller: controller.into(),
            requested_action: None,
            method,
            action: action.into(),
            output,
            input: None,
            data: None,
            content: Value::Null,
        }
    }

    pub fn controller(&self) -> &str {
        &self.controller
    }
    /// The `action` route parameter as routed, before verb mapping.
    pub fn requested_action(&self) -> Option<&str> {
        self.requested_action.as_deref()
    }
    pub fn method(&self) -> &Method {
        &self.method
    }
    pub fn action(&self) -> &str {
        &self.action
    }
    pub fn output(&self) -> &NegotiationResult {
        &self.output
    }
    pub fn output_format(&self) -> &str {
        &self.output.format
    }

    pub fn content(&self) -> &Value {
        &self.content
    }
    pub fn content_mut(&mut self) -> &mut Value {
        &mut self.content
    }
    pub fn set_content_value(&mut self, content: Value) {
        self.content = content;
    }
    pub fn set_content<T: Serialize>(&mut self, content: &T) -> crate::Result<()> {
        self.content = serde_json::to_value(content)?;
        Ok(())
    }

    /// Input format of the request, resolved on first use.
    pub fn input_format(&mut self, req: &Request) -> &NegotiationResult {
        let negotiator = &self.negotiator;
        self.input.get_or_insert_with(|| {
            let explicit = req.params().get(INPUT_FORMAT_PARAM).map(|s| s.as_str());
            let query = req.queries().get(INPUT_FORMAT_QUERY).map(|s| s.as_str());
            let content_type = req
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok());
            let result = negotiator.resolve_input_format(explicit, query, content_type);
            tracing::debug!(format = %result.format, source = %result.source, "input format resolved");
            result
        })
    }

    /// Request body decoded for the input format, read once per request.
    pub async fn request_data(&mut self, req: &mut Request) -> Result<&RequestData, WebServiceError> {
        if self.data.is_none() {
            let format = self.input_format(req).format.clone();
            let data = if format == "form" {
                self.read_form(req).await?
            } else {
                read_raw(req).await?
            };
            self.data = Some(data);
        }
        self.data.as_ref().ok_or(WebServiceError::InputReadFailure)
    }

    async fn read_form(&self, req: &mut Request) -> Result<RequestData, WebServiceError> {
        if self.action == "update" {
            let payload = req.payload().await.map_err(input_failure)?;
            return Ok(RequestData::Form(FormData::parse_urlencoded(payload).fields));
        }
        match req.form_data().await {
            Ok(form) => Ok(RequestData::Form(form.fields.clone())),
            Err(ParseError::InvalidContentType) => Ok(RequestData::Form(MultiMap::new())),
            Err(e) => Err(input_failure(e)),
        }
    }
}

fn input_failure(e: ParseError) -> WebServiceError {
    tracing::error!(error = ?e, "failed to read request body");
    WebServiceError::InputReadFailure
}

async fn read_raw(req: &mut Request) -> Result<RequestData, WebServiceError> {
    match req.form_data().await {
        Ok(form) => {
            if let Some(data) = form.fields.get(DATA_PARAM) {
                return Ok(RequestData::Raw(data.clone()));
            }
        }
        Err(e @ (ParseError::Hyper(_) | ParseError::BodyConsumed)) => return Err(input_failure(e)),
        Err(e) => tracing::debug!(error = ?e, "no form fields in request body"),
    }
    if let Some(data) = req.queries().get(DATA_PARAM) {
        return Ok(RequestData::Raw(data.clone()));
    }
    let encoding = req
        .content_type()
        .and_then(|m| m.get_param(mime::CHARSET).map(|c| c.as_str().to_owned()))
        .and_then(|charset| encoding_rs::Encoding::for_label(charset.as_bytes()))
        .unwrap_or(encoding_rs::UTF_8);
    let payload = req.payload().await.map_err(input_failure)?;
    let (text, _, _) = encoding.decode(payload);
    Ok(RequestData::Raw(text.into_owned()))
}

/// Access to the [`RequestContext`] a [`WebService`] stored for the request.
pub trait DepotExt {
    fn ws_context(&self) -> Option<&RequestContext>;
    fn ws_context_mut(&mut self) -> Option<&mut RequestContext>;
}

impl DepotExt for Depot {
    fn ws_context(&self) -> Option<&RequestContext> {
        self.obtain::<RequestContext>()
    }
    fn ws_context_mut(&mut self) -> Option<&mut RequestContext> {
        self.obtain_mut::<RequestContext>()
    }
}

/// A negotiating resource controller.
pub struct WebService {
    controller: String,
    negotiator: Negotiator,
    verbs: VerbMap,
    views: Arc<dyn ViewSource>,
    actions: HashMap<String, Arc<dyn Handler>>,
}

impl std::fmt::Debug for WebService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut actions: Vec<_> = self.actions.keys().collect();
        actions.sort();
        f.debug_struct("WebService")
            .field("controller", &self.controller)
            .field("negotiator", &self.negotiator)
            .field("verbs", &self.verbs)
            .field("actions", &actions)
            .finish()
    }
}

macro_rules! action_methods {
    ($($name:ident),+) => {
        $(
            pub fn $name<H: Handler>(self, handler: H) -> Self {
                self.action(stringify!($name), handler)
            }
        )+
    };
}

impl WebService {
    /// A controller with the default formats, verb map and built-in views.
    pub fn new(controller: impl Into<String>) -> Self {
        WebService {
            controller: controller.into(),
            negotiator: Negotiator::default(),
            verbs: VerbMap::default(),
            views: Arc::new(BuiltinViews),
            actions: HashMap::new(),
        }
    }
    pub fn controller(&self) -> &str {
        &self.controller
    }
    pub fn negotiator(mut self, negotiator: Negotiator) -> Self {
        self.negotiator = negotiator;
        self
    }
    pub fn verbs(mut self, verbs: VerbMap) -> Self {
        self.verbs = verbs;
        self
    }
    pub fn views(mut self, views: impl ViewSource) -> Self {
        self.views = Arc::new(views);
        self
    }
    /// Registers the handler of an action. Registering `invalid` replaces the
    /// built-in 405 response.
    pub fn action<H: Handler>(mut self, name: impl Into<String>, handler: H) -> Self {
        self.actions.insert(name.into(), Arc::new(handler));
        self
    }
    action_methods!(index, update, create, delete);

    async fn render(&self, req: &mut Request, depot: &mut Depot, res: &mut Response) {
        let (action, format, content) = match depot.ws_context() {
            Some(ctx) => (
                ctx.action().to_owned(),
                ctx.output_format().to_owned(),
                ctx.content().clone(),
            ),
            None => {
                tracing::error!("request context missing at render time");
                res.set_status_error(StatusError::internal_server_error());
                return;
            }
        };
        let (path, view) = match find_view(self.views.as_ref(), &self.controller, &action, &format).await {
            Ok(found) => found,
            Err(e) => {
                e.write(req, depot, res).await;
                return;
            }
        };
        let data = ViewData {
            content,
            uri: req.uri().to_string(),
            format,
        };
        let body = match view.render(&data) {
            Ok(body) => body,
            Err(e) => {
                tracing::error!(path = %path, error = %e, "failed to render view");
                WebServiceError::RenderFailure.write(req, depot, res).await;
                return;
            }
        };
        let content_type = view.content_type().map(|s| s.to_owned()).or_else(|| {
            self.negotiator
                .registry()
                .mime_types_for(&data.format)
                .first()
                .cloned()
        });
        if let Some(content_type) = content_type {
            match HeaderValue::from_str(&content_type) {
                Ok(value) => {
                    res.headers_mut().insert(CONTENT_TYPE, value);
                }
                Err(e) => tracing::error!(error = ?e, "invalid view content type"),
            }
        }
        tracing::debug!(path = %path, format = %data.format, "view rendered");
        if let Err(e) = res.write_body(body) {
            tracing::error!(error = %e, "failed to write view body");
        }
    }
}

#[async_trait]
impl Handler for WebService {
    async fn handle(&self, req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
        let output = {
            let explicit = req.params().get(FORMAT_PARAM).map(|s| s.as_str());
            self.negotiator
                .resolve_output_format(explicit, &req.accept_types())
        };
        let output = match output {
            Ok(output) => output,
            Err(e) => {
                tracing::warn!(controller = %self.controller, accept = ?req.accept_types(), "no acceptable output format");
                e.write(req, depot, res).await;
                return;
            }
        };

        let method = req.method().clone();
        let action = self.verbs.map_action(&method).to_owned();
        tracing::debug!(
            controller = %self.controller,
            method = %method,
            action = %action,
            format = %output.format,
            source = %output.source,
            "request negotiated"
        );
        let mut ctx = RequestContext::new(self.negotiator.clone(), &*self.controller, method, &*action, output);
        ctx.requested_action = req.param::<String>(ACTION_PARAM);
        depot.inject(ctx);

        match self.actions.get(&action) {
            Some(handler) => {
                handler.handle(req, depot, res, ctrl).await;
                if res.status_error().is_some() {
                    return;
                }
            }
            None if action == INVALID_ACTION => {
                let allow = self.verbs.allow_header();
                tracing::warn!(controller = %self.controller, allow = %allow, "method not allowed");
                WebServiceError::MethodNotAllowed { allow }.write(req, depot, res).await;
            }
            None => {
                tracing::warn!(controller = %self.controller, action = %action, "action not found");
                res.set_status_error(StatusError::not_found());
                return;
            }
        }
        if !res.body().is_none() {
            return;
        }
        self.render(req, depot, res).await;
    }
}
