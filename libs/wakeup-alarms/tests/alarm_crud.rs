//! Integration tests for alarm and history persistence
//!
//! Runs the repository against an in-memory SQLite database.

#![allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable

use chrono::NaiveDateTime;
use common::sqlite::SqliteClient;
use sqlx::SqlitePool;
use wakeup_alarms::history::{list_history, record_trigger, respond};
use wakeup_alarms::schema::init_schema;
use wakeup_alarms::{
    create_alarm, delete_alarm, get_alarm, list_alarms, load_active_alarms, update_alarm,
    AlarmError, AlarmPatch, AlarmSource, HistoryStatus, NewAlarm, SqliteAlarmStore,
};

async fn setup_test_db() -> SqlitePool {
    let client = SqliteClient::in_memory()
        .await
        .expect("Failed to create in-memory database");
    init_schema(client.pool())
        .await
        .expect("Failed to create alarm tables");
    client.pool().clone()
}

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
}

#[tokio::test]
async fn test_create_and_get() {
    let pool = setup_test_db().await;

    let mut new = NewAlarm::at(at("2026-10-17 07:00:00"), 1);
    new.description = Some("Morning run".into());
    let created = create_alarm(&pool, &new).await.unwrap();

    assert!(created.id > 0);
    assert!(created.is_active);
    assert!(created.vibration);
    assert_eq!(created.sound, "default");
    assert!(created.repeat_days.is_empty());

    let fetched = get_alarm(&pool, created.id).await.unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.time, at("2026-10-17 07:00:00"));
}

#[tokio::test]
async fn test_get_unknown_alarm() {
    let pool = setup_test_db().await;
    let err = get_alarm(&pool, 999).await.unwrap_err();
    assert!(matches!(err, AlarmError::AlarmNotFound(999)));
}

#[tokio::test]
async fn test_create_rejects_bad_repeat_days() {
    let pool = setup_test_db().await;

    let mut new = NewAlarm::at(at("2026-10-17 07:00:00"), 1);
    new.repeat_days = vec![true, false, true];
    let err = create_alarm(&pool, &new).await.unwrap_err();
    assert!(matches!(err, AlarmError::InvalidInput(_)));

    assert!(list_alarms(&pool, 0, 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_repeat_days_round_trip() {
    let pool = setup_test_db().await;

    let mut new = NewAlarm::at(at("2026-10-17 06:30:00"), 2);
    new.repeat_days = vec![true, true, true, true, true, false, false];
    let created = create_alarm(&pool, &new).await.unwrap();

    let fetched = get_alarm(&pool, created.id).await.unwrap();
    assert_eq!(fetched.repeat_days, new.repeat_days);
}

#[tokio::test]
async fn test_list_pagination() {
    let pool = setup_test_db().await;
    for minute in 0..5 {
        let time = at(&format!("2026-10-17 07:{:02}:00", minute));
        create_alarm(&pool, &NewAlarm::at(time, 1)).await.unwrap();
    }

    let all = list_alarms(&pool, 0, 100).await.unwrap();
    assert_eq!(all.len(), 5);
    assert!(all.windows(2).all(|w| w[0].id < w[1].id));

    let page = list_alarms(&pool, 1, 2).await.unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page[0].id, all[1].id);
    assert_eq!(page[1].id, all[2].id);

    assert!(list_alarms(&pool, 10, 100).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_partial_update() {
    let pool = setup_test_db().await;
    let mut new = NewAlarm::at(at("2026-10-17 07:00:00"), 1);
    new.description = Some("Gym".into());
    let created = create_alarm(&pool, &new).await.unwrap();

    let updated = update_alarm(
        &pool,
        created.id,
        AlarmPatch {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    assert!(!updated.is_active);
    assert_eq!(updated.description.as_deref(), Some("Gym"));
    assert_eq!(updated.time, created.time);
    assert_eq!(get_alarm(&pool, created.id).await.unwrap(), updated);

    let cleared = update_alarm(
        &pool,
        created.id,
        AlarmPatch {
            description: Some(None),
            sound: Some("gentle".into()),
            ..Default::default()
        },
    )
    .await
    .unwrap();
    assert!(cleared.description.is_none());
    assert_eq!(cleared.sound, "gentle");
    assert!(!cleared.is_active);
}

#[tokio::test]
async fn test_update_unknown_alarm() {
    let pool = setup_test_db().await;
    let err = update_alarm(&pool, 42, AlarmPatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, AlarmError::AlarmNotFound(42)));
}

#[tokio::test]
async fn test_update_rejects_bad_repeat_days() {
    let pool = setup_test_db().await;
    let created = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 07:00:00"), 1))
        .await
        .unwrap();

    let err = update_alarm(
        &pool,
        created.id,
        AlarmPatch {
            repeat_days: Some(vec![true; 6]),
            ..Default::default()
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AlarmError::InvalidInput(_)));
}

#[tokio::test]
async fn test_delete_and_delete_again() {
    let pool = setup_test_db().await;
    let created = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 07:00:00"), 1))
        .await
        .unwrap();

    delete_alarm(&pool, created.id).await.unwrap();
    assert!(matches!(
        get_alarm(&pool, created.id).await.unwrap_err(),
        AlarmError::AlarmNotFound(_)
    ));
    assert!(matches!(
        delete_alarm(&pool, created.id).await.unwrap_err(),
        AlarmError::AlarmNotFound(_)
    ));
}

#[tokio::test]
async fn test_active_alarms_only() {
    let pool = setup_test_db().await;
    let on = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 07:00:00"), 1))
        .await
        .unwrap();
    let off = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 08:00:00"), 1))
        .await
        .unwrap();
    update_alarm(
        &pool,
        off.id,
        AlarmPatch {
            is_active: Some(false),
            ..Default::default()
        },
    )
    .await
    .unwrap();

    let active = load_active_alarms(&pool).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, on.id);

    let store = SqliteAlarmStore::new(pool.clone());
    let from_store = store.list_active_alarms().await.unwrap();
    assert_eq!(from_store, active);
    assert_eq!(store.get_alarm(off.id).await.unwrap().id, off.id);
    assert!(matches!(
        store.get_alarm(999).await.unwrap_err(),
        AlarmError::AlarmNotFound(999)
    ));
}

#[tokio::test]
async fn test_history_lifecycle() {
    let pool = setup_test_db().await;
    let alarm = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 07:00:00"), 1))
        .await
        .unwrap();

    let first = record_trigger(&pool, alarm.id, at("2026-10-17 07:00:03"))
        .await
        .unwrap();
    let second = record_trigger(&pool, alarm.id, at("2026-10-18 07:00:02"))
        .await
        .unwrap();
    assert_eq!(first.status, HistoryStatus::Missed);
    assert!(first.responded_at.is_none());

    let entries = list_history(&pool, alarm.id).await.unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, second.id);

    let answered = respond(
        &pool,
        first.id,
        HistoryStatus::Dismissed,
        at("2026-10-17 07:01:00"),
    )
    .await
    .unwrap();
    assert_eq!(answered.status, HistoryStatus::Dismissed);
    assert_eq!(answered.responded_at, Some(at("2026-10-17 07:01:00")));
}

#[tokio::test]
async fn test_history_errors() {
    let pool = setup_test_db().await;

    assert!(matches!(
        list_history(&pool, 5).await.unwrap_err(),
        AlarmError::AlarmNotFound(5)
    ));
    assert!(matches!(
        respond(&pool, 7, HistoryStatus::Snoozed, at("2026-10-17 07:01:00"))
            .await
            .unwrap_err(),
        AlarmError::HistoryNotFound(7)
    ));
    assert!(matches!(
        respond(&pool, 7, HistoryStatus::Missed, at("2026-10-17 07:01:00"))
            .await
            .unwrap_err(),
        AlarmError::InvalidInput(_)
    ));
}

#[tokio::test]
async fn test_delete_cascades_history() {
    let pool = setup_test_db().await;
    let alarm = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 07:00:00"), 1))
        .await
        .unwrap();
    let entry = record_trigger(&pool, alarm.id, at("2026-10-17 07:00:03"))
        .await
        .unwrap();

    delete_alarm(&pool, alarm.id).await.unwrap();

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM alarm_history WHERE id = ?")
        .bind(entry.id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(remaining, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_on_file_database() {
    let dir = tempfile::tempdir().unwrap();
    let client = SqliteClient::new(dir.path().join("alarms.db")).await.unwrap();
    init_schema(client.pool()).await.unwrap();
    let pool = client.pool().clone();

    let alarm = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 07:00:00"), 1))
        .await
        .unwrap();
    let alarm_id = alarm.id;

    let mut handles = Vec::new();
    for i in 0..40 {
        let pool = pool.clone();
        handles.push(tokio::spawn(async move {
            if i % 4 == 0 {
                record_trigger(&pool, alarm_id, at("2026-10-17 07:00:01"))
                    .await
                    .map(|_| ())
            } else {
                let patch = AlarmPatch {
                    vibration: Some(i % 2 == 0),
                    description: Some(Some(format!("update {}", i))),
                    ..Default::default()
                };
                update_alarm(&pool, alarm_id, patch).await.map(|_| ())
            }
        }));
    }

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = get_alarm(&pool, alarm.id).await.unwrap();
    assert!(stored.description.unwrap().starts_with("update "));
    assert_eq!(stored.time, alarm.time);
    assert_eq!(list_history(&pool, alarm.id).await.unwrap().len(), 10);
}

#[tokio::test]
async fn test_empty_update_returns_stored_alarm() {
    let pool = setup_test_db().await;
    let created = create_alarm(&pool, &NewAlarm::at(at("2026-10-17 07:00:00"), 1))
        .await
        .unwrap();

    let same = update_alarm(&pool, created.id, AlarmPatch::default())
        .await
        .unwrap();
    assert_eq!(same, created);
}
