use crate::context::AppContext;
use crate::output::Output;
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use reelnotes_gateway::{build_router, AppState, MetadataSource, UpstreamStatus};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub async fn run_serve(ctx: &AppContext, bind: Option<String>, output: &Output) -> Result<()> {
    let addr: SocketAddr = match bind {
        Some(bind) => bind
            .parse()
            .wrap_err_with(|| format!("Invalid bind address: {}", bind))?,
        None => ctx.config.bind_addr()?,
    };

    let source = Arc::new(ctx.metadata_source()?);

    let listener = TcpListener::bind(addr)
        .await
        .wrap_err_with(|| format!("Failed to bind {}", addr))?;
    let local_addr = listener.local_addr()?;
    info!(operation = "server_started", address = %local_addr, "Server listening");
    output.success(format!("Server running on http://{}", local_addr));

    let upstream_status = probe_upstream(source.as_ref()).await;
    match upstream_status {
        UpstreamStatus::Connected => output.success("TMDB API connected"),
        UpstreamStatus::Disconnected => {
            output.warn("Server running but TMDB API not connected; check the API key configuration")
        }
    }

    let app = build_router(AppState::new(source, upstream_status));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .wrap_err("Server error")?;

    info!(operation = "server_stopped", "Server shut down");
    Ok(())
}

async fn probe_upstream(source: &dyn MetadataSource) -> UpstreamStatus {
    info!("Testing {} API connection", source.source_name());
    match source.probe().await {
        Ok(count) => {
            info!(operation = "upstream_probe", movies = count, "Upstream reachable");
            UpstreamStatus::Connected
        }
        Err(e) => {
            warn!(operation = "upstream_probe", error = %e, "Upstream connection failed");
            UpstreamStatus::Disconnected
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
