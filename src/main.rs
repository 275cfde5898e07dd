use anyhow::Context;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use webservice_t::prelude::*;
use webservice_t::WebServiceConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Note {
    #[serde(default)]
    id: u64,
    text: String,
}

static NOTES: Lazy<RwLock<Vec<Note>>> = Lazy::new(|| RwLock::new(Vec::new()));

#[handler]
async fn index(depot: &mut Depot) -> Result<(), StatusError> {
    let ctx = depot.ws_context_mut().ok_or_else(StatusError::internal_server_error)?;
    let notes = NOTES.read().clone();
    ctx.set_content(&notes)
        .map_err(|_| StatusError::internal_server_error())
}

#[handler]
async fn create(req: &mut Request, depot: &mut Depot) -> Result<(), StatusError> {
    let ctx = depot.ws_context_mut().ok_or_else(StatusError::internal_server_error)?;
    let data = ctx.request_data(req).await?;
    let mut note: Note = match data {
        RequestData::Form(_) => data.parse_form(),
        RequestData::Raw(_) => data.parse_json(),
    }
    .map_err(|e| StatusError::bad_request().with_detail(e.to_string()))?;
    {
        let mut notes = NOTES.write();
        note.id = notes.iter().map(|n| n.id).max().unwrap_or_default() + 1;
        notes.push(note.clone());
    }
    tracing::info!(id = note.id, "note created");
    ctx.set_content(&note)
        .map_err(|_| StatusError::internal_server_error())
}

#[handler]
async fn delete(depot: &mut Depot) -> Result<(), StatusError> {
    let ctx = depot.ws_context_mut().ok_or_else(StatusError::internal_server_error)?;
    let removed = std::mem::take(&mut *NOTES.write()).len();
    ctx.set_content_value(serde_json::json!({ "removed": removed }));
    Ok(())
}

struct Home {
    formats: Vec<String>,
}

#[async_trait]
impl Handler for Home {
    async fn handle(&self, _req: &mut Request, _depot: &mut Depot, res: &mut Response, _ctrl: &mut FlowCtrl) {
        let links = self
            .formats
            .iter()
            .map(|f| format!(r#"<li><a href="/notes.{0}">notes.{0}</a></li>"#, f))
            .collect::<String>();
        res.render(Text::Html(format!("<h1>notes</h1><ul>{}</ul>", links)));
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match std::env::args()
        .nth(1)
        .or_else(|| std::env::var("WEBSERVICE_CONFIG").ok())
    {
        Some(path) => WebServiceConfig::load(&path)
            .await
            .with_context(|| format!("failed to load config from {}", path))?,
        None => WebServiceConfig::default(),
    };

    let notes = WebService::new("notes")
        .negotiator(config.negotiator())
        .views(config.views())
        .index(index)
        .create(create)
        .delete(delete);
    let home = Home {
        formats: config.allowed.output.clone(),
    };
    let router = Router::new()
        .get(home)
        .push(Router::with_path("notes.<format>").handle(notes));

    let listener = TcpListener::try_bind(config.addr.as_str())
        .with_context(|| format!("failed to bind {}", config.addr))?;
    tracing::info!(addr = %listener.local_addr(), "listening");
    Server::new(listener)
        .try_serve_with_graceful_shutdown(router, async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = ?e, "failed to listen for shutdown signal");
            }
        })
        .await?;
    Ok(())
}
