//! clocksrv configuration
//!
//! Layers, later wins: built-in defaults, YAML file, `CLOCKSRV_*` environment
//! (nested keys joined with `__`, e.g. `CLOCKSRV_SERVICE__PORT=9000`), then
//! command-line overrides.

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::bootstrap_args::ServiceArgs;
use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use wakeup_alarms::platform::PlatformKind;
use wakeup_alarms::trigger::DEFAULT_NOTIFICATION_TITLE;
use wakeup_alarms::DEFAULT_POLL_INTERVAL_SECS;

use crate::error::{ClockSrvError, Result};

pub const SERVICE_NAME: &str = "clocksrv";
pub const ENV_PREFIX: &str = "CLOCKSRV_";
pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    pub service: ServiceSection,
    pub database: DatabaseSection,
    pub poller: PollerSection,
    pub platform: PlatformSection,
    pub logging: LoggingSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSection {
    pub name: String,
    pub host: String,
    pub port: u16,
}

impl Default for ServiceSection {
    fn default() -> Self {
        Self {
            name: SERVICE_NAME.to_string(),
            host: common::DEFAULT_API_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    pub path: String,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            path: "data/alarms.db".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerSection {
    pub interval_secs: u64,
}

impl Default for PollerSection {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_POLL_INTERVAL_SECS,
        }
    }
}

impl PollerSection {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformSection {
    pub kind: PlatformKind,
    pub sounds_dir: PathBuf,
    pub notification_title: String,
}

impl Default for PlatformSection {
    fn default() -> Self {
        Self {
            kind: PlatformKind::Auto,
            sounds_dir: PathBuf::from("sounds"),
            notification_title: DEFAULT_NOTIFICATION_TITLE.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Level used when neither `RUST_LOG` nor `--log-level` is given
    pub level: String,
    /// Log file directory; null disables file logging
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: Some(PathBuf::from("logs")),
        }
    }
}

impl ClockConfig {
    /// Load defaults, the YAML file (if present) and the environment
    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::figment(path, ENV_PREFIX).extract()?)
    }

    fn figment(path: &Path, env_prefix: &str) -> Figment {
        Figment::from(Serialized::defaults(ClockConfig::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(env_prefix).split("__"))
    }

    /// Apply command-line overrides
    pub fn apply_args(&mut self, args: &ServiceArgs) -> Result<()> {
        if let Some(bind) = &args.bind_address {
            let (host, port) = bind.rsplit_once(':').ok_or_else(|| {
                ClockSrvError::Config(format!("bind address must be host:port, got {}", bind))
            })?;
            self.service.host = host.to_string();
            self.service.port = port
                .parse()
                .map_err(|_| ClockSrvError::Config(format!("invalid port in {}", bind)))?;
        }
        if let Some(db_path) = &args.db_path {
            self.database.path = db_path.clone();
        }
        if let Some(level) = &args.log_level {
            self.logging.level = level.clone();
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.port == 0 {
            return Err(ClockSrvError::Config("service.port must not be 0".into()));
        }
        if self.poller.interval_secs == 0 {
            return Err(ClockSrvError::Config(
                "poller.interval_secs must be at least 1".into(),
            ));
        }
        if self.database.path.trim().is_empty() {
            return Err(ClockSrvError::Config("database.path must not be empty".into()));
        }
        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.service.host, self.service.port)
    }

    pub fn log_level(&self) -> tracing::Level {
        ServiceArgs {
            log_level: Some(self.logging.level.clone()),
            ..Default::default()
        }
        .parse_log_level()
    }
}
