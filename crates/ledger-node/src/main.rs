use clap::Parser;
use ledger_core::Ledger;
use ledger_node::{
    api::{self, AppState},
    config::Args,
};
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Read `.env` before anything looks at the environment, RUST_LOG included.
    let dotenv = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    match dotenv {
        Ok(path) => info!(path = %path.display(), "loaded environment file"),
        Err(err) if err.not_found() => debug!("no .env file found"),
        Err(err) => warn!(%err, "ignoring unreadable .env file"),
    }

    let args = Args::parse();
    let ledger = Arc::new(Ledger::new(args.difficulty()?));
    info!(
        target_bits = ledger.difficulty().target_bits(),
        "ledger initialised with genesis block"
    );

    let app = api::router(AppState::new(ledger, args.mine_timeout()));

    let addr = args.listen_addr()?;
    info!("ledger-node listening on http://{addr}");
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("ledger-node stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(%err, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
}
