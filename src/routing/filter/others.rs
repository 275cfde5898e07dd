use std::fmt;

use hyper::Method;

use crate::{http::Request, routing::PathState};

use super::Filter;

/// Passes requests whose method equals the wrapped one.
#[derive(Clone, PartialEq, Eq)]
pub struct MethodFilter(pub Method);

impl Filter for MethodFilter {
    fn filter(&self, req: &mut Request, _path: &mut PathState) -> bool {
        req.method() == self.0
    }
}
impl fmt::Debug for MethodFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "method:{}", self.0)
    }
}

/// Passes requests accepted by a closure.
#[derive(Copy, Clone)]
pub struct FnFilter<F>(pub F);

impl<F> Filter for FnFilter<F>
where
    F: Fn(&mut Request, &mut PathState) -> bool + Send + Sync + 'static,
{
    fn filter(&self, req: &mut Request, path: &mut PathState) -> bool {
        self.0(req, path)
    }
}
impl<F> fmt::Debug for FnFilter<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "fn")
    }
}
