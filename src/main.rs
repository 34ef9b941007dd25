use std::env;
use std::path::Path;

use tokio::signal::unix::signal;
use tokio::signal::unix::SignalKind;
use tokio::sync::watch;
use tracing::error;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use watchkv::utils::file_io::open_file_for_append;
use watchkv::Error;
use watchkv::NodeBuilder;
use watchkv::Result;
use watchkv::SystemError;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    // Optional config file layered over CONFIG_PATH
    let override_path = env::args().nth(1);

    // Initializing Shutdown Signal
    let (graceful_tx, graceful_rx) = watch::channel(());

    let builder = NodeBuilder::new(override_path.as_deref(), graceful_rx.clone()).inspect_err(|e| {
        eprintln!("watchkv: {e}");
    })?;

    // Initializing Logs
    let _guard = init_observability(&builder.config().server.log_dir)?;

    // Build Node
    let node = builder
        .build()?
        .start_metrics_server(graceful_rx.clone())
        .ready()?;

    info!(config = ?node.config(), "node built. Waiting for SIGINT/SIGTERM...");
    // Listen on Shutdown Signal
    tokio::spawn(async {
        if let Err(e) = graceful_shutdown(graceful_tx).await {
            error!("Failed to shutdown: {:?}", e);
        }
    });

    // Start Node
    if let Err(e) = node.run().await {
        error!("node stops: {:?}", e);
        return Err(e);
    }

    info!("Exiting program.");
    Ok(())
}

async fn graceful_shutdown(graceful_tx: watch::Sender<()>) -> Result<()> {
    info!("Monitoring shutdown signal ...");
    let mut sigint = signal(SignalKind::interrupt()).map_err(SystemError::SignalHandler)?;
    let mut sigterm = signal(SignalKind::terminate()).map_err(SystemError::SignalHandler)?;
    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT detected.");
        },
        _ = sigterm.recv() => {
            info!("SIGTERM detected.");
        },
        _ = tokio::signal::ctrl_c() => {
            info!("Ctrl+C detected.");
        },
    }

    graceful_tx.send(()).map_err(|e| {
        error!("Failed to send shutdown signal: {}", e);
        Error::from(SystemError::SignalSenderClosed(e.to_string()))
    })?;

    info!("Shutdown signal sent");
    Ok(())
}

fn init_observability(log_dir: &Path) -> Result<WorkerGuard> {
    let log_file = open_file_for_append(log_dir.join("watchkv.log"))?;

    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let base_subscriber = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")));
    tracing_subscriber::registry().with(base_subscriber).init();

    Ok(guard)
}
