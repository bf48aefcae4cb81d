mod backend;
mod config;
mod error;
mod routes;

#[cfg(test)]
pub(crate) mod test_utils;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use backend::ProtocolBackend;
use config::ServerConfig;
use svngate_core::Gateway;
use svngate_dav::DavBackend;
use svngate_ra::RaBackend;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServerConfig::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "svngate_server=info,svngate_core=info,svngate_dav=info,svngate_ra=info,tower_http=info"
                    .into()
            }),
        )
        .init();

    // Scheme registration happens exactly once, here.
    let gateway = Arc::new(Gateway::new(ProtocolBackend::new(
        DavBackend::new(config.dav_options()),
        RaBackend::new(config.ra_options()),
    )));
    tracing::info!(
        "repository schemes: {}",
        gateway.registry().schemes().collect::<Vec<_>>().join(", ")
    );

    let mut app = routes::router(gateway).layer(TraceLayer::new_for_http());
    if config.cors {
        app = app.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    tracing::info!("listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await?;

    tracing::info!("svngate-server stopped");
    Ok(())
}

/// Resolve on SIGTERM or SIGINT.
async fn wait_for_shutdown() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        let (mut sigterm, mut sigint) =
            match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
                (Ok(term), Ok(int)) => (term, int),
                (Err(e), _) | (_, Err(e)) => {
                    tracing::warn!("can't install signal handlers: {e}");
                    return std::future::pending().await;
                }
            };
        tokio::select! {
            _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            _ = sigint.recv() => tracing::info!("received SIGINT"),
        }
    }
    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("can't listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
        tracing::info!("received Ctrl+C");
    }
}
