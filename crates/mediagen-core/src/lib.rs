#![allow(clippy::must_use_candidate, clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod context;
mod error;

pub use context::RequestContext;
pub use error::HttpError;
