// ABOUTME: Server binary wiring configuration, storage, and the HTTP router
// ABOUTME: Builds resources once at startup and serves until interrupted
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! # Parley Auth Server Binary
//!
//! Starts the OAuth 2.0 authorization server with user authentication,
//! captcha storage, and database management.

use anyhow::Result;
use clap::Parser;
use parley_auth::{
    cache::{Cache, CacheConfig},
    config::ServerConfig,
    context::ServerResources,
    database::Database,
    logging, routes,
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "parley-auth-server")]
#[command(about = "Parley Auth - OAuth 2.0 authorization-code server")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;

    info!("Starting Parley Auth Server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    info!("Database initialized: {}", config.database.url);

    let cache = Cache::new(CacheConfig {
        redis_url: config.captcha.redis_url.clone(),
        max_entries: config.captcha.max_entries,
        ..CacheConfig::default()
    })
    .await?;

    let http_port = config.http_port;
    let resources = Arc::new(ServerResources::new(config, database, cache)?);
    let app = routes::router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port)).await?;
    info!("Listening on port {}", http_port);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install shutdown signal handler: {}", e);
    }
    info!("Shutdown signal received");
}
