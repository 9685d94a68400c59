//! facegated - facial recognition matching service.
//!
//! Keeps an in-memory roster of enrolled identities synced from the main
//! API and matches probe photos against it, scoped to a zone or an explicit
//! candidate list.

mod auth;
mod config;
mod routes;

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::info;

use facegate_faceprint::RemoteEmbedder;
use facegate_matcher::Matcher;
use facegate_roster::Roster;
use facegate_syncer::{HttpCatalogClient, SyncAgent};

use crate::config::Config;
use crate::routes::AppState;

/// Facial recognition matching service.
#[derive(Parser, Debug)]
#[command(name = "facegated")]
#[command(about = "Facial recognition matching service")]
struct Args {
    /// Listen address (overrides FACEGATE_LISTEN_ADDR)
    #[arg(short, long)]
    addr: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Setup logging
    if args.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
            )
            .init();
    }

    let mut config = Config::from_env()?;
    if let Some(addr) = args.addr {
        config.listen_addr = addr;
    }

    let roster = Arc::new(Roster::new());
    let matcher = Arc::new(Matcher::new(Arc::clone(&roster)));
    let embedder = Arc::new(RemoteEmbedder::with_dimension(
        &config.embedder_url,
        config.descriptor_dim,
    ));
    let catalog = Arc::new(HttpCatalogClient::new(&config.upstream_url, &config.api_key)?);
    let agent = Arc::new(SyncAgent::new(
        Arc::clone(&roster),
        catalog,
        config.descriptor_dim,
    ));

    let cancel = CancellationToken::new();
    let sync_task = tokio::spawn(Arc::clone(&agent).run(config.sync_interval, cancel.clone()));

    let state = AppState {
        config: Arc::new(config),
        roster,
        matcher,
        embedder,
        agent,
    };

    let app = routes::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.config.listen_addr.as_str()).await?;
    info!("facegated listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await?;

    cancel.cancel();
    sync_task.await?;
    Ok(())
}

async fn shutdown_signal(cancel: CancellationToken) {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutting down");
    }
    cancel.cancel();
}
