//! The wall calendar web server.
//!
//! Serves a month view at `/` and the events of a month as JSON at
//! `/events/<year>/<month>`.

use std::{net::SocketAddr, sync::Arc};

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wc_core::feed_cache::FeedCache;

use crate::{config::ServerConfig, route::AppState};

mod config;
mod route;
mod theme;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let config = ServerConfig::from_env()?;
    init_tracing(config.debug);

    let cache = FeedCache::from_env().context("failed to build the feed client")?;
    let state = AppState {
        cache: Arc::new(cache),
        theme: config.theme,
    };
    let app = route::router(state, &config.static_dir);

    let addr = SocketAddr::new(config.host, config.port);
    info!("listening on {addr}");
    axum::Server::try_bind(&addr)
        .with_context(|| format!("failed to bind {addr}"))?
        .serve(app.into_make_service())
        .await
        .context("server stopped unexpectedly")?;
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_filter = if debug {
        "wc_server=debug,wc_core=debug,tower_http=debug"
    } else {
        "wc_server=info,wc_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
}
