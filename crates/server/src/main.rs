use anyhow::Result;
use protect_core::config::AppConfig;
use server::GatewayServer;
use tokio::{signal, sync::broadcast};
use tracing::{debug, error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initializes the logging system based on the configuration.
///
/// `RUST_LOG=debug` and `RUST_LOG=trace` widen only the workspace crates;
/// any other `RUST_LOG` value is used as a filter directive as-is.
fn init_logging(config: &AppConfig) {
    let filter = if let Ok(env_filter) = std::env::var("RUST_LOG") {
        if env_filter == "debug" {
            EnvFilter::new("warn,protect_core=debug,server=debug,protect_rpc=debug")
        } else if env_filter == "trace" {
            EnvFilter::new("warn,protect_core=trace,server=trace,protect_rpc=trace")
        } else {
            EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| {
                EnvFilter::new("warn,protect_core=debug,server=debug,protect_rpc=debug")
            })
        }
    } else {
        EnvFilter::new(format!(
            "warn,protect_core={level},server={level},protect_rpc={level}",
            level = config.logging.level
        ))
    };

    let registry = tracing_subscriber::registry().with(filter);

    if config.logging.format.as_str() == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer().json();
        registry.with(fmt_layer).init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .pretty()
            .with_file(true)
            .with_line_number(true)
            .with_target(false);
        registry.with(fmt_layer).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().map_err(|e| anyhow::anyhow!("Configuration load failed: {e}"))?;

    init_logging(&config);
    info!(version = env!("CARGO_PKG_VERSION"), "Starting Protect RPC gateway");
    debug!(
        proxy_url = %config.relay.proxy_url,
        relay_url = %config.relay.relay_url,
        blacklist_entries = config.admission.blacklist.len(),
        retention_secs = config.dedup.retention_seconds,
        "Configuration loaded"
    );

    let server = GatewayServer::from_config(&config)
        .map_err(|e| anyhow::anyhow!("Gateway initialization failed: {e}"))?;
    info!(relay_signer = %server.state().signer.address(), "Relay signer loaded");

    let listener = match server.bind().await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "Failed to start gateway listener");
            std::process::exit(1);
        }
    };

    let (shutdown_tx, _) = broadcast::channel::<()>(1);
    let sweeper_handle = server.start_sweeper(shutdown_tx.subscribe());

    if let Err(e) = server.serve(listener, shutdown_signal()).await {
        error!(error = %e, "Server error occurred");
    }

    let _ = shutdown_tx.send(());
    if let Err(e) = sweeper_handle.await {
        error!(error = %e, "Dedup sweeper terminated abnormally");
    }
    info!("Server shutdown complete");

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
            Ok(mut s) => {
                s.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");

                () = std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutdown signal received, draining in-flight requests");
}
