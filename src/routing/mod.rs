use std::{borrow::Cow, collections::HashMap, sync::Arc};

pub mod filter;
mod router;
pub use filter::*;
pub use router::{DetectMatched, Router};

use percent_encoding::percent_decode_str;

use crate::{
    depot::Depot,
    handler::Handler,
    http::{Request, Response},
};

pub type PathParams = HashMap<String, String>;

/// Cursor over the decoded segments of a request path while routers match it.
///
/// The cursor is a `(segment, byte offset)` pair, so a filter may consume
/// only the front of a segment.
#[derive(Debug)]
pub struct PathState {
    pub(crate) parts: Vec<String>,
    pub(crate) cursor: (usize, usize),
    pub(crate) params: PathParams,
    pub(crate) end_slash: bool,
}

impl PathState {
    pub fn new(url_path: &str) -> Self {
        let parts = url_path
            .split('/')
            .filter(|p| !p.is_empty())
            .map(|p| percent_decode_str(p).decode_utf8_lossy().into_owned())
            .collect();
        PathState {
            parts,
            cursor: (0, 0),
            params: PathParams::new(),
            end_slash: url_path.ends_with('/'),
        }
    }
    fn current(&self) -> (usize, usize) {
        match self.parts.get(self.cursor.0) {
            Some(part) if self.cursor.1 >= part.len() => (self.cursor.0 + 1, 0),
            _ => self.cursor,
        }
    }
    /// The unconsumed part of the current segment.
    pub fn pick(&self) -> Option<&str> {
        let (row, col) = self.current();
        self.parts.get(row).map(|part| &part[col..])
    }
    /// Everything not consumed yet, segments joined back with `/`.
    pub fn all_rest(&self) -> Option<Cow<'_, str>> {
        let picked = self.pick()?;
        let (row, _) = self.current();
        let rest = &self.parts[row + 1..];
        if rest.is_empty() && !self.end_slash {
            return Some(Cow::Borrowed(picked));
        }
        let mut all = picked.to_owned();
        for part in rest {
            all.push('/');
            all.push_str(part);
        }
        if self.end_slash {
            all.push('/');
        }
        Some(Cow::Owned(all))
    }
    pub fn forward(&mut self, steps: usize) {
        let mut remaining = self.cursor.1 + steps;
        while let Some(part) = self.parts.get(self.cursor.0) {
            if remaining < part.len() {
                self.cursor.1 = remaining;
                return;
            }
            remaining -= part.len();
            self.cursor = (self.cursor.0 + 1, 0);
        }
    }
    pub fn ended(&self) -> bool {
        self.cursor.0 >= self.parts.len()
    }
    pub fn params(&self) -> &PathParams {
        &self.params
    }
}

/// Drives the hoops and the handler matched for a request.
///
/// A hoop may call [`FlowCtrl::call_next`] to run the rest of the chain
/// before finishing its own work. Once the response carries an error or
/// redirection status nothing further runs.
pub struct FlowCtrl {
    cursor: usize,
    pub(crate) handlers: Vec<Arc<dyn Handler>>,
}

impl FlowCtrl {
    pub fn new(handlers: Vec<Arc<dyn Handler>>) -> Self {
        FlowCtrl {
            cursor: 0,
            handlers,
        }
    }
    pub async fn call_next(
        &mut self,
        req: &mut Request,
        depot: &mut Depot,
        res: &mut Response,
    ) -> bool {
        if res.is_stamped() {
            self.skip_rest();
            return false;
        }
        let mut called = false;
        while let Some(handler) = self.handlers.get(self.cursor).cloned() {
            self.cursor += 1;
            called = true;
            handler.handle(req, depot, res, self).await;
            if res.is_stamped() {
                self.skip_rest();
                break;
            }
        }
        called
    }
    pub fn skip_rest(&mut self) {
        self.cursor = self.handlers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::*;
    use crate::test::{ResponseExt, TestClient};

    #[test]
    fn test_path_state() {
        let mut state = PathState::new("/users/12.json/");
        assert!(state.end_slash);
        assert_eq!(state.pick(), Some("users"));
        state.forward(5);
        assert_eq!(state.pick(), Some("12.json"));
        assert_eq!(state.all_rest().unwrap(), "12.json/");
        state.forward(2);
        assert_eq!(state.pick(), Some(".json"));
        state.forward(5);
        assert!(state.ended());
        assert!(state.pick().is_none());
    }

    #[test]
    fn test_path_state_decodes() {
        let state = PathState::new("/a%20b/c");
        assert_eq!(state.parts, vec!["a b", "c"]);
        assert_eq!(state.all_rest().unwrap(), "a b/c");
    }

    #[tokio::test]
    async fn test_filter_fn() {
        #[handler(internal)]
        async fn local_only() -> &'static str {
            "local"
        }

        let router = Router::new()
            .filter_fn(|req, _| req.uri().host() == Some("localhost"))
            .get(local_only);
        let service = Service::new(router);

        let mut res = TestClient::get("http://localhost/").send(&service).await;
        assert_eq!(res.take_string().await.unwrap(), "local");
        let res = TestClient::get("http://127.0.0.1/").send(&service).await;
        assert_eq!(res.status_code(), Some(StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_hoops_stop_on_error() {
        #[handler(internal)]
        async fn trace(req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
            res.render("[");
            ctrl.call_next(req, depot, res).await;
            res.render("]");
        }
        #[handler(internal)]
        async fn guard(req: &mut Request, res: &mut Response) {
            if req.query::<String>("deny").is_some() {
                res.set_status_error(StatusError::forbidden());
            }
        }
        #[handler(internal)]
        async fn notes() -> &'static str {
            "notes"
        }

        let router = Router::with_hoop(trace).push(
            Router::with_path("api")
                .hoop(guard)
                .push(Router::with_path("notes").get(notes)),
        );
        let service = Service::new(router);

        let mut res = TestClient::get("http://127.0.0.1:7878/api/notes")
            .send(&service)
            .await;
        assert_eq!(res.take_string().await.unwrap(), "[notes]");

        let res = TestClient::get("http://127.0.0.1:7878/api/notes?deny=1")
            .send(&service)
            .await;
        assert_eq!(res.status_code(), Some(StatusCode::FORBIDDEN));
    }
}
