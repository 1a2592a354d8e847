use std::process::ExitCode;

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use pkgverify::config::ValidatorConfig;
use pkgverify::server_name::validate_server_name;
use pkgverify::{OciValidator, PackageDescriptor, RegistryType};

/// Verify that a published package belongs to the server claiming it
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Package identifier, e.g. `namespace/repository`
    #[arg(long)]
    identifier: String,

    /// Tag to validate
    #[arg(long, default_value = "latest")]
    version: String,

    /// Server name the package must be labelled with
    #[arg(long)]
    server_name: String,

    /// Registry base URL; empty means the default public registry
    #[arg(long, default_value = "")]
    registry_base_url: String,

    /// Only `oci` is validated by this tool
    #[arg(long, default_value = "oci")]
    registry_type: RegistryType,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    Registry::default()
        .with(env_filter)
        .with(fmt::layer().with_target(true))
        .init();

    let cli = Cli::parse();

    let registry_type = cli.registry_type;
    if registry_type != RegistryType::Oci {
        anyhow::bail!("registry type '{}' is not validated by pkgverify", registry_type);
    }

    validate_server_name(&cli.server_name)?;

    let config = ValidatorConfig::load()?;
    let validator = OciValidator::new(&config);
    let package = PackageDescriptor {
        registry_type,
        registry_base_url: cli.registry_base_url,
        identifier: cli.identifier,
        version: cli.version,
    };

    let cancel = CancellationToken::new();
    let watcher = tokio::spawn(cancel_on_shutdown(cancel.clone()));

    let result = validator
        .validate_ownership_with_cancel(&package, &cli.server_name, &cancel)
        .await;
    watcher.abort();

    match result {
        Ok(()) => {
            info!("Ownership of '{}' verified", package.identifier);
            Ok(ExitCode::SUCCESS)
        }
        Err(err) => {
            error!(retryable = err.is_retryable(), "{}", err);
            eprintln!("{}", err);
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn cancel_on_shutdown(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
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

    info!("Shutdown signal received, cancelling validation");
    cancel.cancel();
}
