mod parse_error;
mod status_error;

pub use parse_error::ParseError;
pub use status_error::StatusError;
