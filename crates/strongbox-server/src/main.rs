//! Strongbox server binary.
//!
//! Loads the secrets document and serves it until interrupted.

use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use strongbox_server::{run, source, StrongboxConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("strongbox_server=info".parse()?),
        )
        .init();

    info!("Strongbox server starting");

    let config = StrongboxConfig::load().inspect_err(|e| {
        error!(error = %e, "Failed to load configuration");
    })?;

    let secret_source = source::from_config(&config.source)?;

    info!(
        bind_address = %config.server.bind_address,
        source = %secret_source.describe(),
        "Configuration loaded"
    );

    let tree = secret_source.load().await.inspect_err(|e| {
        error!(error = %e, source = %secret_source.describe(), "Failed to load secrets");
    })?;

    let cancel = CancellationToken::new();

    let cancel_on_signal = cancel.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        info!("Shutdown signal received, initiating graceful shutdown");
        cancel_on_signal.cancel();
    });

    if let Err(e) = run(config, tree, cancel).await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received Ctrl+C");
        }
        () = terminate => {
            info!("Received SIGTERM");
        }
    }
}
