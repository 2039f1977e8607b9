//! Application state and startup wiring

use std::sync::Arc;

use anyhow::Context;
use common::sqlite::{SqliteClient, SqlitePool};
use tracing::{info, warn};
use wakeup_alarms::platform::{select_platform, DesktopPlatform, SoundLibrary};
use wakeup_alarms::schema::init_schema;
use wakeup_alarms::{
    AlarmPoller, AlarmTriggerHandler, LocalClock, PollerConfig, SqliteAlarmStore,
};

use crate::config::ClockConfig;

/// Shared state for the HTTP handlers
pub struct AppState {
    pub pool: SqlitePool,
    pub poller: Arc<AlarmPoller>,
    pub platform: Arc<dyn DesktopPlatform>,
    pub config: Arc<ClockConfig>,
}

impl AppState {
    /// Wire the poller, trigger handler and platform around an open pool
    pub fn new(pool: SqlitePool, platform: Arc<dyn DesktopPlatform>, config: ClockConfig) -> Self {
        let handler = AlarmTriggerHandler::new(
            pool.clone(),
            Arc::clone(&platform),
            config.platform.notification_title.clone(),
        );
        let poller = AlarmPoller::new(
            Arc::new(SqliteAlarmStore::new(pool.clone())),
            Arc::new(handler),
            Arc::new(LocalClock),
            PollerConfig {
                interval: config.poller.interval(),
            },
        );

        Self {
            pool,
            poller: Arc::new(poller),
            platform,
            config: Arc::new(config),
        }
    }
}

/// Open the database, create the schema and prepare the desktop platform
///
/// Database failures abort startup; a sound directory that cannot be created
/// only disables playback.
pub async fn bootstrap(config: ClockConfig) -> anyhow::Result<Arc<AppState>> {
    let sqlite = SqliteClient::new(&config.database.path)
        .await
        .with_context(|| format!("failed to open database {}", config.database.path))?;
    init_schema(sqlite.pool())
        .await
        .context("failed to initialise alarm schema")?;
    info!("Alarm database ready: {}", sqlite.path());

    let sounds = SoundLibrary::new(&config.platform.sounds_dir);
    if let Err(e) = sounds.ensure_dir() {
        warn!(
            "Cannot prepare sounds directory {}: {}",
            sounds.dir().display(),
            e
        );
    }
    let platform = select_platform(config.platform.kind, sounds);

    Ok(Arc::new(AppState::new(
        sqlite.pool().clone(),
        platform,
        config,
    )))
}
