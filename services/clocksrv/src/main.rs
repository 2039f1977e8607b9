//! clocksrv - personal alarm clock service
//!
//! Serves the alarm CRUD API and runs the minute poller in the same process.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use clocksrv::config::{ClockConfig, SERVICE_NAME};
use common::bootstrap_args::ServiceArgs;
use common::logging::LogConfig;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = ServiceArgs::parse();

    let config_path = args.config_path(SERVICE_NAME);
    let mut config = ClockConfig::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    config.apply_args(&args)?;

    common::logging::init_with_config(LogConfig {
        service_name: config.service.name.clone(),
        log_dir: config.logging.dir.clone(),
        console_level: config.log_level(),
        enable_api_log: true,
    })?;

    config.validate()?;
    if args.validate {
        info!(
            "Configuration is valid:\n{}",
            serde_yaml::to_string(&config)?
        );
        return Ok(());
    }

    info!(
        "Starting {} v{}",
        SERVICE_NAME,
        env!("CARGO_PKG_VERSION")
    );

    let bind_address = config.bind_address();
    let state = clocksrv::bootstrap(config).await?;

    let poller = Arc::clone(&state.poller);
    let poller_task = tokio::spawn(async move { poller.start().await });

    let app = clocksrv::create_routes(Arc::clone(&state));
    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {}", bind_address))?;

    info!("{} listening on {}", SERVICE_NAME, bind_address);
    info!("API endpoints:");
    info!("  GET/POST /api/v1/alarms - Alarm management");
    info!("  GET/PUT/DELETE /api/v1/alarms/{{id}} - Single alarm");
    info!("  GET /api/v1/alarms/{{id}}/history - Trigger history");
    info!("  PUT /api/v1/history/{{history_id}} - Snooze or dismiss");
    info!("  GET /api-docs/openapi.json - OpenAPI document");

    axum::serve(listener, app)
        .with_graceful_shutdown(common::shutdown::wait_for_shutdown())
        .await
        .context("HTTP server error")?;

    state.poller.stop();
    if let Err(e) = poller_task.await {
        error!("Alarm poller task failed: {}", e);
    }

    info!("{} stopped", SERVICE_NAME);
    Ok(())
}
