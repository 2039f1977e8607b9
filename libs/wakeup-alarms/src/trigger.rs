//! Trigger handler
//!
//! What happens when an alarm goes off: a `missed` history row is written,
//! then the notification and the sound are started together.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::SqlitePool;
use tracing::{debug, error, info, warn};

use crate::history;
use crate::platform::DesktopPlatform;
use crate::poller::TriggerSink;
use crate::types::Alarm;

/// Title used when none is configured
pub const DEFAULT_NOTIFICATION_TITLE: &str = "Alarm";

/// Trigger sink that records history and drives the desktop
pub struct AlarmTriggerHandler {
    pool: SqlitePool,
    platform: Arc<dyn DesktopPlatform>,
    notification_title: String,
}

impl AlarmTriggerHandler {
    pub fn new(
        pool: SqlitePool,
        platform: Arc<dyn DesktopPlatform>,
        notification_title: impl Into<String>,
    ) -> Self {
        Self {
            pool,
            platform,
            notification_title: notification_title.into(),
        }
    }
}

/// Notification body: the description, or the alarm time when there is none
pub fn notification_message(alarm: &Alarm) -> String {
    match alarm.description.as_deref().map(str::trim) {
        Some(text) if !text.is_empty() => text.to_string(),
        _ => format!("Alarm {}", alarm.time.format("%H:%M")),
    }
}

#[async_trait]
impl TriggerSink for AlarmTriggerHandler {
    async fn on_trigger(&self, alarm: Alarm, triggered_at: NaiveDateTime) {
        info!(
            "Alarm {} triggered at {} (user {}, sound '{}')",
            alarm.id,
            triggered_at.format("%Y-%m-%d %H:%M:%S"),
            alarm.user_id,
            alarm.sound
        );

        match history::record_trigger(&self.pool, alarm.id, triggered_at).await {
            Ok(entry) => debug!("History {} recorded for alarm {}", entry.id, alarm.id),
            Err(e) => error!("Failed to record history for alarm {}: {}", alarm.id, e),
        }

        let message = notification_message(&alarm);
        let (notified, played) = tokio::join!(
            self.platform.send(&self.notification_title, &message),
            self.platform.play(alarm.id, &alarm.sound)
        );

        if !notified {
            warn!("Notification for alarm {} was not shown", alarm.id);
        }
        if !played {
            warn!("Sound '{}' for alarm {} was not played", alarm.sound, alarm.id);
        }
    }
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // unwrap is acceptable in tests
mod tests {
    use super::*;

    fn alarm(description: Option<&str>) -> Alarm {
        Alarm {
            id: 1,
            time: "2024-01-01T06:45:00".parse().unwrap(),
            is_active: true,
            vibration: true,
            sound: "default".into(),
            repeat_days: vec![],
            description: description.map(String::from),
            user_id: 1,
        }
    }

    #[test]
    fn test_notification_message() {
        assert_eq!(notification_message(&alarm(Some("Gym"))), "Gym");
        assert_eq!(notification_message(&alarm(None)), "Alarm 06:45");
        assert_eq!(notification_message(&alarm(Some("  "))), "Alarm 06:45");
    }
}
