//! Conditions a [`Router`](super::Router) checks before descending.

mod others;
mod path;

use std::fmt;

use crate::http::{Method, Request};
use crate::routing::PathState;

pub use others::*;
pub use path::*;

pub trait Filter: fmt::Debug + Send + Sync + 'static {
    /// Returns `true` when the request may go on, consuming matched path
    /// segments from `path`.
    fn filter(&self, req: &mut Request, path: &mut PathState) -> bool;
}

macro_rules! method_filters {
    ($($name:ident => $method:ident),*) => {
        $(
            pub fn $name() -> MethodFilter {
                MethodFilter(Method::$method)
            }
        )*
    };
}

method_filters!(
    get => GET,
    head => HEAD,
    options => OPTIONS,
    post => POST,
    patch => PATCH,
    put => PUT,
    delete => DELETE
);
