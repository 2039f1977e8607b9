//! Alarm Repository - SQLite persistence for alarms
//!
//! `repeat_days` is stored as a JSON array of booleans.

use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::error::{AlarmError, Result};
use crate::poller::AlarmSource;
use crate::types::{Alarm, AlarmPatch, NewAlarm};

const ALARM_COLUMNS: &str =
    "id, time, is_active, vibration, sound, repeat_days, description, user_id";

/// Create an alarm; `is_active` starts as true
pub async fn create_alarm(pool: &SqlitePool, new: &NewAlarm) -> Result<Alarm> {
    new.validate()?;
    let repeat_days = serde_json::to_string(&new.repeat_days)?;

    let result = sqlx::query(
        r#"
        INSERT INTO alarms (time, is_active, vibration, sound, repeat_days, description, user_id)
        VALUES (?, TRUE, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(new.time)
    .bind(new.vibration)
    .bind(&new.sound)
    .bind(&repeat_days)
    .bind(&new.description)
    .bind(new.user_id)
    .execute(pool)
    .await?;

    get_alarm(pool, result.last_insert_rowid()).await
}

/// Get a single alarm by ID
pub async fn get_alarm(pool: &SqlitePool, id: i64) -> Result<Alarm> {
    let row = sqlx::query(&format!("SELECT {} FROM alarms WHERE id = ?", ALARM_COLUMNS))
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match row {
        Some(row) => hydrate_alarm(row),
        None => Err(AlarmError::AlarmNotFound(id)),
    }
}

/// List alarms ordered by ID
pub async fn list_alarms(pool: &SqlitePool, offset: i64, limit: i64) -> Result<Vec<Alarm>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM alarms ORDER BY id ASC LIMIT ? OFFSET ?",
        ALARM_COLUMNS
    ))
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let mut alarms = Vec::with_capacity(rows.len());
    for row in rows {
        alarms.push(hydrate_alarm(row)?);
    }
    Ok(alarms)
}

/// Load every active alarm for the poller
pub async fn load_active_alarms(pool: &SqlitePool) -> Result<Vec<Alarm>> {
    let rows = sqlx::query(&format!(
        "SELECT {} FROM alarms WHERE is_active = 1 ORDER BY id ASC",
        ALARM_COLUMNS
    ))
    .fetch_all(pool)
    .await?;

    let mut alarms = Vec::with_capacity(rows.len());
    for row in rows {
        alarms.push(hydrate_alarm(row)?);
    }
    Ok(alarms)
}

/// Apply a partial update and return the stored result
///
/// One `UPDATE .. RETURNING` statement: absent fields keep their stored value
/// through `COALESCE`, and the write lock is taken before the row is read, so
/// concurrent patches queue on the busy timeout instead of failing.
pub async fn update_alarm(pool: &SqlitePool, id: i64, patch: AlarmPatch) -> Result<Alarm> {
    patch.validate()?;
    if patch.is_empty() {
        return get_alarm(pool, id).await;
    }

    let repeat_days = patch
        .repeat_days
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;
    let (set_description, description) = match patch.description {
        Some(description) => (true, description),
        None => (false, None),
    };

    let row = sqlx::query(&format!(
        r#"
        UPDATE alarms
        SET time = COALESCE(?, time),
            is_active = COALESCE(?, is_active),
            vibration = COALESCE(?, vibration),
            sound = COALESCE(?, sound),
            repeat_days = COALESCE(?, repeat_days),
            description = CASE WHEN ? THEN ? ELSE description END,
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        RETURNING {}
        "#,
        ALARM_COLUMNS
    ))
    .bind(patch.time)
    .bind(patch.is_active)
    .bind(patch.vibration)
    .bind(patch.sound)
    .bind(repeat_days)
    .bind(set_description)
    .bind(description)
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => hydrate_alarm(row),
        None => Err(AlarmError::AlarmNotFound(id)),
    }
}

/// Delete an alarm; its history rows go with it
pub async fn delete_alarm(pool: &SqlitePool, id: i64) -> Result<()> {
    let result = sqlx::query("DELETE FROM alarms WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AlarmError::AlarmNotFound(id));
    }
    Ok(())
}

fn hydrate_alarm(row: SqliteRow) -> Result<Alarm> {
    let repeat_days: String = row.try_get("repeat_days")?;

    Ok(Alarm {
        id: row.try_get("id")?,
        time: row.try_get("time")?,
        is_active: row.try_get("is_active")?,
        vibration: row.try_get("vibration")?,
        sound: row.try_get("sound")?,
        repeat_days: serde_json::from_str(&repeat_days)?,
        description: row.try_get("description")?,
        user_id: row.try_get("user_id")?,
    })
}

/// Alarm source backed by the SQLite pool
#[derive(Clone)]
pub struct SqliteAlarmStore {
    pool: SqlitePool,
}

impl SqliteAlarmStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AlarmSource for SqliteAlarmStore {
    async fn list_active_alarms(&self) -> Result<Vec<Alarm>> {
        load_active_alarms(&self.pool).await
    }

    async fn get_alarm(&self, id: i64) -> Result<Alarm> {
        get_alarm(&self.pool, id).await
    }
}
