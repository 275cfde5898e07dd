//! Format negotiation for web service controllers.
//!
//! The pieces here only work on plain values: the [`FormatRegistry`] maps
//! format keys to MIME types, the [`Negotiator`] picks input and output
//! formats from request parameters and headers, and the [`VerbMap`] turns
//! HTTP methods into action names. [`WebService`](crate::webservice::WebService)
//! wires them into the request lifecycle.

mod data;
mod negotiator;
mod registry;
mod verb;

pub use data::RequestData;
pub use negotiator::{FormatSource, NegotiationResult, Negotiator};
pub use registry::{AllowedFormats, FormatRegistry, FormatSpec};
pub use verb::{VerbMap, INVALID_ACTION};
