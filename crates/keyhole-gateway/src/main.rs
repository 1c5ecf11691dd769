use clap::Parser;
use keyhole_gateway::cli::Cli;
use keyhole_gateway::wiring::build_shortener;
use keyhole_gateway::{App, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    keyhole_telemetry::init(cli.log_format)?;

    info!(storage = %cli.storage, cache = %cli.cache, "Building shortener");
    let shortener = build_shortener(&cli).await?;
    let app = App::router(AppState::new(shortener));

    let listener = tokio::net::TcpListener::bind(cli.listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "starting gateway server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("gateway server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
