//! Trigger history
//!
//! Every trigger appends a `missed` row; a later response through the API moves
//! it to `snoozed` or `dismissed` and stamps `responded_at`.

use chrono::{Local, NaiveDateTime};
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};

use crate::error::{AlarmError, Result};
use crate::types::{AlarmHistory, HistoryStatus};

const HISTORY_COLUMNS: &str = "id, alarm_id, triggered_at, responded_at, status, created_at";

/// Append a trigger record with status `missed`
pub async fn record_trigger(
    pool: &SqlitePool,
    alarm_id: i64,
    triggered_at: NaiveDateTime,
) -> Result<AlarmHistory> {
    let created_at = Local::now().naive_local();

    let result = sqlx::query(
        r#"
        INSERT INTO alarm_history (alarm_id, triggered_at, responded_at, status, created_at)
        VALUES (?, ?, NULL, ?, ?)
        "#,
    )
    .bind(alarm_id)
    .bind(triggered_at)
    .bind(HistoryStatus::Missed.as_str())
    .bind(created_at)
    .execute(pool)
    .await?;

    get_history(pool, result.last_insert_rowid()).await
}

/// Get a single history row
pub async fn get_history(pool: &SqlitePool, id: i64) -> Result<AlarmHistory> {
    let row = sqlx::query(&format!(
        "SELECT {} FROM alarm_history WHERE id = ?",
        HISTORY_COLUMNS
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => hydrate_history(row),
        None => Err(AlarmError::HistoryNotFound(id)),
    }
}

/// History of one alarm, newest first
pub async fn list_history(pool: &SqlitePool, alarm_id: i64) -> Result<Vec<AlarmHistory>> {
    let exists = sqlx::query("SELECT 1 FROM alarms WHERE id = ?")
        .bind(alarm_id)
        .fetch_optional(pool)
        .await?;
    if exists.is_none() {
        return Err(AlarmError::AlarmNotFound(alarm_id));
    }

    let rows = sqlx::query(&format!(
        "SELECT {} FROM alarm_history WHERE alarm_id = ? ORDER BY triggered_at DESC, id DESC",
        HISTORY_COLUMNS
    ))
    .bind(alarm_id)
    .fetch_all(pool)
    .await?;

    let mut entries = Vec::with_capacity(rows.len());
    for row in rows {
        entries.push(hydrate_history(row)?);
    }
    Ok(entries)
}

/// Record the user's response to a trigger
///
/// Only `snoozed` and `dismissed` are responses.
pub async fn respond(
    pool: &SqlitePool,
    history_id: i64,
    status: HistoryStatus,
    responded_at: NaiveDateTime,
) -> Result<AlarmHistory> {
    if status == HistoryStatus::Missed {
        return Err(AlarmError::InvalidInput(
            "status must be snoozed or dismissed".to_string(),
        ));
    }

    let result = sqlx::query(
        r#"
        UPDATE alarm_history
        SET status = ?, responded_at = ?
        WHERE id = ?
        "#,
    )
    .bind(status.as_str())
    .bind(responded_at)
    .bind(history_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AlarmError::HistoryNotFound(history_id));
    }

    get_history(pool, history_id).await
}

fn hydrate_history(row: SqliteRow) -> Result<AlarmHistory> {
    let status: String = row.try_get("status")?;

    Ok(AlarmHistory {
        id: row.try_get("id")?,
        alarm_id: row.try_get("alarm_id")?,
        triggered_at: row.try_get("triggered_at")?,
        responded_at: row.try_get("responded_at")?,
        status: status.parse()?,
        created_at: row.try_get("created_at")?,
    })
}
