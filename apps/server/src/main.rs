//! Apartment Notifier - Headless Server
//!
//! Polls the rental search API and posts listings it has not seen before to
//! Discord.

mod config;

use apartment_alerts::{Database, DiscordNotifier, Notifier};
use apartment_engine::{CycleOutcome, Poller};
use apartment_feeds::StreetEasyClient;
use clap::Parser;
use config::AppConfig;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Apartment Notifier CLI
#[derive(Parser, Debug)]
#[command(name = "apartment-notifier")]
#[command(about = "Discord alerts for new NYC rental listings", long_about = None)]
struct Args {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Run a single poll cycle and exit
    #[arg(long, default_value_t = false)]
    once: bool,
}

fn init_logging(level: &str) {
    let level = match level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

/// Resolves on Ctrl+C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    init_logging(&args.log_level);

    info!("Apartment Notifier starting...");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        database = %config.database_path.display(),
        interval_mins = config.poll_interval.as_secs() / 60,
        error_channel = config.error_webhook.is_some(),
        status_channel = config.status_webhook.is_some(),
        "Config loaded"
    );

    let db = match Database::connect(&config.database_path).await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to initialize storage: {}", e);
            std::process::exit(1);
        }
    };
    match db.seen_count().await {
        Ok(count) => info!(seen = count, "Database initialized"),
        Err(e) => warn!(error = %e, "Database initialized, seen count unavailable"),
    }

    let source = match StreetEasyClient::new() {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build search client: {}", e);
            std::process::exit(1);
        }
    };
    let notifier: Arc<dyn Notifier> = match DiscordNotifier::new(config.notifier_config()) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            error!("Failed to build Discord client: {}", e);
            std::process::exit(1);
        }
    };

    let poller = Poller::new(source, Arc::new(db.clone()), notifier);

    if args.once {
        if let CycleOutcome::FetchFailed(reason) = poller.run_cycle().await {
            warn!(%reason, "Single cycle aborted");
        }
    } else {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            shutdown_signal().await;
            warn!("Shutdown signal received, finishing current cycle");
            let _ = shutdown_tx.send(true);
        });

        apartment_engine::run(&poller, config.poll_interval, shutdown_rx).await;
    }

    db.close().await;
    info!("Goodbye!");
}
