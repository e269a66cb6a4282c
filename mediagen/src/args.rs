use std::path::PathBuf;

use clap::Parser;

/// Mediagen generation gateway
#[derive(Debug, Parser)]
#[command(name = "mediagen", about = "Async task gateway for image and video generation providers")]
pub struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "mediagen.toml", env = "MEDIAGEN_CONFIG")]
    pub config: PathBuf,

    /// Override the listen address
    #[arg(long, env = "MEDIAGEN_LISTEN")]
    pub listen: Option<std::net::SocketAddr>,
}
