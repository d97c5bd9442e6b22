//! # askides-server
//!
//! HTTP server for the askides blog: article pages, JSON API, newsletter
//! subscriptions, social images, sitemap and robots.txt.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;
pub mod image;
pub mod mailer;
pub mod pages;
pub mod ratelimit;
pub mod seo;
pub mod server;
pub mod session;
pub mod subscribe;

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    Ok(())
}

/// Run the server using CLI args (parsed by the caller).
pub async fn run_with_cli(cli: cli::Cli) -> Result<()> {
    init_tracing(cli.verbose)?;

    let cfg = AppConfig::from_cli(&cli);
    server::serve(cfg).await
}
