//! Alarm clock service (clocksrv)
//!
//! HTTP API over the `wakeup-alarms` core plus the background poller that fires
//! alarms on the desktop.

pub mod app;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

pub use app::{bootstrap, AppState};
pub use config::ClockConfig;
pub use error::{ClockSrvError, Result};
pub use routes::{create_routes, ApiDoc};
