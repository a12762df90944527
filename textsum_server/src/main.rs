mod docs;
mod error;
mod health;
mod predict;
mod root;
mod router;
mod state;
mod train;
mod ui;

use anyhow::Result;
use dotenvy::dotenv;
use router::router;
use state::build_state;
use textsum_core::config::handler::ConfigurationManager;

#[tokio::main(flavor = "multi_thread", worker_threads = 4)]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    let manager = ConfigurationManager::new()?;
    let server_domain = manager.get_server_config().address;

    let state = build_state(manager).await;
    let app = router(state);

    let listener = tokio::net::TcpListener::bind(&server_domain).await?;
    log::info!("Listening on {}", server_domain);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    log::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                log::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    log::info!("Shutdown signal received");
}
