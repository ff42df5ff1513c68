//! Downloads Monitor - service entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use downloads_monitor::{
    cli::Args,
    config::{validate_config, Config},
    dedup::{DedupEngine, JsonFileStore},
    error::{exit_codes, Error, Result},
    fs::resolve_watch_dir,
    output::{
        print_banner, print_config_summary, print_error, print_info, print_shutdown,
        print_warning,
    },
    watch::WatchService,
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            ExitCode::from(e.exit_code() as u8)
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        print_info(&format!(
            "No configuration file at {}, using defaults",
            config_path.display()
        ));
        Config::default()
    };

    args.merge_into_config(&mut config);
    validate_config(&config)?;

    let store_path = config.store_path()?;
    let store = Arc::new(JsonFileStore::open(&store_path)?);
    let watch_dir = resolve_watch_dir(&config);

    print_config_summary(
        &watch_dir
            .as_ref()
            .map(|d| d.display().to_string())
            .unwrap_or_else(|| "(unresolved)".to_string()),
        &store_path.display().to_string(),
        config.monitor.workers,
    );

    if watch_dir.is_none() {
        print_warning(&Error::DirectoryUnresolved.to_string());
    }

    let token = CancellationToken::new();
    let shutdown = token.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Shutdown requested");
                shutdown.cancel();
            }
            Err(e) => tracing::error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    let service = WatchService::new(&config.monitor, DedupEngine::new(store));
    let summary = service.run_or_idle(watch_dir.as_deref(), token).await?;

    tracing::info!(
        "Resolved {} event(s): {} registered, {} removed, {} skipped",
        summary.total(),
        summary.registered,
        summary.removed,
        summary.skipped
    );
    print_shutdown(&summary);

    Ok(())
}
