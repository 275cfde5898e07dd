use std::fmt;
use std::sync::Arc;

use crate::{handler::Handler, http::Request};

use super::{
    filter::{self, Filter, FnFilter, PathFilter},
    PathState,
};

/// A node of the routing tree.
///
/// A request enters a router when all its filters pass, then tries the child
/// routers in order. The router's own handler runs only once the whole path
/// has been consumed.
pub struct Router {
    pub(crate) routers: Vec<Router>,
    pub(crate) filters: Vec<Box<dyn Filter>>,
    pub(crate) hoops: Vec<Arc<dyn Handler>>,
    pub(crate) handler: Option<Arc<dyn Handler>>,
}

/// The handler found for a request, with the hoops collected on the way down.
pub struct DetectMatched {
    pub hoops: Vec<Arc<dyn Handler>>,
    pub handler: Arc<dyn Handler>,
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! method_routes {
    ($($name: ident),*) => {
        $(
            pub fn $name<H: Handler>(self, handler: H) -> Self {
                self.push(Router::with_filter(filter::$name()).handle(handler))
            }
        )*
    };
}

impl Router {
    pub fn new() -> Self {
        Self {
            routers: Vec::new(),
            filters: Vec::new(),
            hoops: Vec::new(),
            handler: None,
        }
    }

    pub fn routers(&self) -> &Vec<Router> {
        &self.routers
    }

    pub fn detect(&self, req: &mut Request, path_state: &mut PathState) -> Option<DetectMatched> {
        if !self.filters.iter().all(|f| f.filter(req, path_state)) {
            return None;
        }
        let original_cursor = path_state.cursor;
        for child in &self.routers {
            if let Some(dm) = child.detect(req, path_state) {
                return Some(DetectMatched {
                    hoops: [&self.hoops[..], &dm.hoops[..]].concat(),
                    handler: dm.handler,
                });
            }
            path_state.cursor = original_cursor;
        }
        match &self.handler {
            Some(handler) if path_state.ended() => Some(DetectMatched {
                hoops: self.hoops.clone(),
                handler: handler.clone(),
            }),
            _ => None,
        }
    }

    pub fn push(mut self, router: Router) -> Self {
        self.routers.push(router);
        self
    }

    pub fn with_hoop<H: Handler>(handler: H) -> Self {
        Router::new().hoop(handler)
    }
    pub fn hoop<H: Handler>(mut self, handler: H) -> Self {
        self.hoops.push(Arc::new(handler));
        self
    }

    /// Matches path segments, see [`PathFilter`] for the pattern syntax.
    pub fn with_path(path: impl Into<String>) -> Self {
        Router::with_filter(PathFilter::new(path))
    }
    pub fn path(self, path: impl Into<String>) -> Self {
        self.filter(PathFilter::new(path))
    }

    pub fn with_filter(filter: impl Filter + Sized) -> Self {
        Router::new().filter(filter)
    }
    pub fn filter(mut self, filter: impl Filter + Sized) -> Self {
        self.filters.push(Box::new(filter));
        self
    }
    pub fn filter_fn<T>(self, func: T) -> Self
    where
        T: Fn(&mut Request, &mut PathState) -> bool + Send + Sync + 'static,
    {
        self.filter(FnFilter(func))
    }

    pub fn handle<H: Handler>(mut self, handler: H) -> Self {
        self.handler = Some(Arc::new(handler));
        self
    }
    method_routes!(get, post, put, delete, patch, head, options);
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn print(f: &mut fmt::Formatter<'_>, depth: usize, router: &Router) -> fmt::Result {
            let filters = router
                .filters
                .iter()
                .map(|filter| format!("{:?}", filter))
                .collect::<Vec<_>>();
            write!(f, "{:indent$}[{}]", "", filters.join(" "), indent = depth * 2)?;
            if let Some(handler) = &router.handler {
                write!(f, " -> {}", handler.type_name())?;
            }
            writeln!(f)?;
            router.routers.iter().try_for_each(|child| print(f, depth + 1, child))
        }
        print(f, 0, self)
    }
}
