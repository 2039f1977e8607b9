//! Common command-line arguments for the service binaries
//!
//! Values given here override the configuration file and environment.

use clap::Parser;
use std::path::PathBuf;

/// Common service startup arguments
#[derive(Debug, Clone, Default, Parser)]
#[command(author, version, about)]
pub struct ServiceArgs {
    /// Configuration file (YAML); defaults to `config/<service>.yaml`
    #[arg(short = 'c', long, env = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Optional bind address override (e.g., 127.0.0.1:8000)
    #[arg(short = 'b', long, env = "BIND_ADDRESS")]
    pub bind_address: Option<String>,

    /// Custom database path override
    #[arg(long, env = "DB_PATH")]
    pub db_path: Option<String>,

    /// Only validate configuration without starting service
    #[arg(long)]
    pub validate: bool,
}

impl ServiceArgs {
    /// Parse log level string to tracing::Level
    pub fn parse_log_level(&self) -> tracing::Level {
        match self
            .log_level
            .as_deref()
            .map(str::to_lowercase)
            .as_deref()
        {
            Some("trace") => tracing::Level::TRACE,
            Some("debug") => tracing::Level::DEBUG,
            Some("warn") | Some("warning") => tracing::Level::WARN,
            Some("error") => tracing::Level::ERROR,
            _ => tracing::Level::INFO,
        }
    }

    /// Configuration file path with the per-service default
    pub fn config_path(&self, service_name: &str) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(|| PathBuf::from(format!("config/{}.yaml", service_name)))
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // unwrap is acceptable in tests
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let args = ServiceArgs::default();
        assert!(args.log_level.is_none());
        assert!(!args.validate);
        assert_eq!(
            args.config_path("clocksrv"),
            PathBuf::from("config/clocksrv.yaml")
        );
    }

    #[test]
    fn test_parse_log_level() {
        let args = ServiceArgs {
            log_level: Some("WARN".to_string()),
            ..Default::default()
        };
        assert_eq!(args.parse_log_level(), tracing::Level::WARN);

        let args = ServiceArgs {
            log_level: Some("invalid".to_string()),
            ..Default::default()
        };
        assert_eq!(args.parse_log_level(), tracing::Level::INFO);
    }

    #[test]
    fn test_parse_from_cli() {
        let args = ServiceArgs::try_parse_from([
            "clocksrv",
            "--config",
            "/etc/clocksrv.yaml",
            "--db-path",
            "/tmp/a.db",
            "--validate",
        ])
        .unwrap();
        assert_eq!(args.config_path("x"), PathBuf::from("/etc/clocksrv.yaml"));
        assert_eq!(args.db_path.as_deref(), Some("/tmp/a.db"));
        assert!(args.validate);
    }
}
