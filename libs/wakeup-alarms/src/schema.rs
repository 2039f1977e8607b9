//! SQLite schema for alarms and their trigger history

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::Result;

pub const ALARMS_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS alarms (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        time TIMESTAMP NOT NULL,
        is_active BOOLEAN NOT NULL DEFAULT TRUE,
        vibration BOOLEAN NOT NULL DEFAULT TRUE,
        sound TEXT NOT NULL DEFAULT 'default',
        repeat_days TEXT NOT NULL DEFAULT '[]',
        description TEXT,
        user_id INTEGER NOT NULL,
        created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP,
        updated_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
    )
"#;

pub const ALARM_HISTORY_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS alarm_history (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        alarm_id INTEGER NOT NULL,
        triggered_at TIMESTAMP NOT NULL,
        responded_at TIMESTAMP,
        status TEXT NOT NULL CHECK (status IN ('missed', 'snoozed', 'dismissed')),
        created_at TIMESTAMP NOT NULL,
        FOREIGN KEY (alarm_id) REFERENCES alarms(id) ON DELETE CASCADE
    )
"#;

const INDEXES: [&str; 2] = [
    "CREATE INDEX IF NOT EXISTS idx_alarms_active ON alarms(is_active)",
    "CREATE INDEX IF NOT EXISTS idx_alarm_history_alarm ON alarm_history(alarm_id)",
];

/// Create tables and indexes if they do not exist yet
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query(ALARMS_TABLE).execute(pool).await?;
    sqlx::query(ALARM_HISTORY_TABLE).execute(pool).await?;
    for index in INDEXES {
        sqlx::query(index).execute(pool).await?;
    }

    debug!("Alarm schema ready");
    Ok(())
}
