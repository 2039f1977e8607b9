//! Wakeup Alarms - Alarm clock core library
//!
//! Everything the alarm clock does besides HTTP:
//! - Alarm and trigger-history records persisted in SQLite
//! - The minute matching rule (hour/minute match inside a 10 second window, weekday mask)
//! - A fixed-interval poller that scans active alarms and dispatches matches
//! - The trigger handler: history row, desktop notification, sound playback
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────────┐
//! │   Poller    │────▶│   Matcher    │────▶│ Trigger handler  │
//! │   (60s)     │     │ (pure rule)  │     │ (spawned task)   │
//! └─────────────┘     └──────────────┘     └──────────────────┘
//!        │                                     │          │
//!        ▼                                     ▼          ▼
//! ┌─────────────┐                     ┌──────────────┐ ┌──────────┐
//! │ Repository  │◀────────────────────│   History    │ │ Platform │
//! │  (SQLite)   │                     │   (SQLite)   │ │ (OS cmd) │
//! └─────────────┘                     └──────────────┘ └──────────┘
//! ```

mod error;
pub mod history;
pub mod matcher;
pub mod platform;
pub mod poller;
mod repository;
pub mod schema;
pub mod trigger;
pub mod types;

// Re-export public API
pub use error::{AlarmError, Result};
pub use matcher::{should_trigger, trigger_minute, TRIGGER_WINDOW_SECS};
pub use platform::{select_platform, DesktopPlatform, PlatformKind, SoundLibrary};
pub use poller::{
    AlarmPoller, AlarmSource, Clock, LocalClock, PollerConfig, PollerStatus, TriggerSink,
    DEFAULT_POLL_INTERVAL_SECS,
};
pub use repository::{
    create_alarm, delete_alarm, get_alarm, list_alarms, load_active_alarms, update_alarm,
    SqliteAlarmStore,
};
pub use trigger::AlarmTriggerHandler;
pub use types::{Alarm, AlarmHistory, AlarmPatch, HistoryStatus, NewAlarm, DEFAULT_SOUND};
