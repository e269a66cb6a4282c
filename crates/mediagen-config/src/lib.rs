#![allow(clippy::must_use_candidate)]

mod env;
pub mod generation;
mod loader;
pub mod server;

use serde::Deserialize;

pub use generation::*;
pub use server::*;

/// Top-level mediagen configuration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Generation provider configuration
    #[serde(default)]
    pub generation: GenerationConfig,
}
