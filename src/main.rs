//! taskbell - task tracking with push reminders.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use taskbell::{
    app::App,
    cli::{Cli, Command},
    commands,
    config::Config,
    notification::listener::forward_lines,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration by layering sources: defaults, file, environment, and CLI args.
    let config = match Config::load(&cli) {
        Ok(config) => config,
        Err(err) => {
            tracing_subscriber::fmt().init();
            error!("Failed to load configuration: {:#}", err);
            std::process::exit(1);
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let mut stdout = std::io::stdout();
    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Task { action } => commands::run_task_command(&config, action, &mut stdout).await,
        Command::Sync { action } => commands::run_sync_command(&config, action, &mut stdout).await,
        Command::Notify {
            kind,
            data,
            endpoints,
        } => {
            let report =
                commands::run_notify_command(&config, &kind, data.as_deref(), &endpoints).await?;
            println!(
                "Delivered to {} of {} subscribers ({} pruned)",
                report.delivered,
                report.attempted,
                report.pruned.len()
            );
            Ok(())
        }
    }
}

async fn serve(config: Config) -> Result<()> {
    info!("taskbell starting up...");
    info!("-------------------- Configuration --------------------");
    info!("Log Level: {}", config.log_level);
    info!("Data Directory: {}", config.storage.data_dir.display());
    info!("Delivery: {:?}", config.notifications.delivery);
    info!(
        "Scheduler: {}",
        if config.scheduler.enabled {
            format!(
                "every {}s, daily at {}",
                config.scheduler.overdue_interval_seconds, config.scheduler.daily_summary_time
            )
        } else {
            "Disabled".to_string()
        }
    );
    info!(
        "Cloud Sync: {}",
        if config.sync.enabled { "Enabled" } else { "Disabled" }
    );
    info!("-------------------------------------------------------");

    let app = App::builder(config).build().await?;

    // Standard input is read on its own thread so it never blocks runtime shutdown.
    let events_tx = app.events_tx();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let forwarded = forward_lines(stdin.lock(), events_tx);
        info!(forwarded, "Standard input closed.");
    });

    let registry = Arc::clone(app.registry());
    info!("Notification service ready. Reading events from stdin...");
    app.run_until(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    })
    .await?;

    info!(subscribers = registry.size(), "taskbell stopped.");
    Ok(())
}
