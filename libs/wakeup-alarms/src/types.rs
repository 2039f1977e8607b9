//! Alarm data types
//!
//! `Alarm` and `AlarmHistory` mirror the two SQLite tables. `NewAlarm` and
//! `AlarmPatch` are the create/update payloads accepted by the HTTP layer.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::{AlarmError, Result};

/// Sound used when a create request names none
pub const DEFAULT_SOUND: &str = "default";

/// Number of slots in a weekday mask (Monday..Sunday)
pub const DAYS_PER_WEEK: usize = 7;

fn default_sound() -> String {
    DEFAULT_SOUND.to_string()
}

/// A scheduled alarm
///
/// Only the hour and minute of `time` take part in matching; the date part is
/// whatever the client sent on create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Alarm {
    pub id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2026-10-17T07:00:00"))]
    pub time: NaiveDateTime,
    pub is_active: bool,
    pub vibration: bool,
    pub sound: String,
    /// Weekday mask, index 0 = Monday. Empty means every day.
    pub repeat_days: Vec<bool>,
    pub description: Option<String>,
    pub user_id: i64,
}

/// Create payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct NewAlarm {
    #[cfg_attr(feature = "openapi", schema(value_type = String, example = "2026-10-17T07:00:00"))]
    pub time: NaiveDateTime,
    #[serde(default = "common::serde_helpers::bool_true")]
    pub vibration: bool,
    #[serde(default = "default_sound")]
    pub sound: String,
    #[serde(default)]
    pub repeat_days: Vec<bool>,
    #[serde(default)]
    pub description: Option<String>,
    pub user_id: i64,
}

impl NewAlarm {
    /// Minimal payload with every optional field at its default
    pub fn at(time: NaiveDateTime, user_id: i64) -> Self {
        Self {
            time,
            vibration: true,
            sound: default_sound(),
            repeat_days: Vec::new(),
            description: None,
            user_id,
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_repeat_days(&self.repeat_days)?;
        validate_sound(&self.sound)
    }
}

/// Partial update payload
///
/// `description` distinguishes "absent" (`None`) from "set to null"
/// (`Some(None)`), so a client can clear it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlarmPatch {
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub time: Option<NaiveDateTime>,
    pub is_active: Option<bool>,
    pub vibration: Option<bool>,
    pub sound: Option<String>,
    pub repeat_days: Option<Vec<bool>>,
    #[serde(
        default,
        deserialize_with = "common::serde_helpers::deserialize_nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub description: Option<Option<String>>,
}

impl AlarmPatch {
    pub fn validate(&self) -> Result<()> {
        if let Some(days) = &self.repeat_days {
            validate_repeat_days(days)?;
        }
        if let Some(sound) = &self.sound {
            validate_sound(sound)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A weekday mask is either empty (daily) or exactly seven slots
pub fn validate_repeat_days(days: &[bool]) -> Result<()> {
    if days.is_empty() || days.len() == DAYS_PER_WEEK {
        Ok(())
    } else {
        Err(AlarmError::InvalidInput(format!(
            "repeat_days must be empty or have {} entries, got {}",
            DAYS_PER_WEEK,
            days.len()
        )))
    }
}

fn validate_sound(sound: &str) -> Result<()> {
    if sound.trim().is_empty() {
        return Err(AlarmError::InvalidInput(
            "sound must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Outcome recorded for a trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum HistoryStatus {
    /// No response yet
    Missed,
    Snoozed,
    Dismissed,
}

impl HistoryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryStatus::Missed => "missed",
            HistoryStatus::Snoozed => "snoozed",
            HistoryStatus::Dismissed => "dismissed",
        }
    }
}

impl fmt::Display for HistoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HistoryStatus {
    type Err = AlarmError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "missed" => Ok(HistoryStatus::Missed),
            "snoozed" => Ok(HistoryStatus::Snoozed),
            "dismissed" => Ok(HistoryStatus::Dismissed),
            other => Err(AlarmError::InvalidInput(format!(
                "unknown history status: {}",
                other
            ))),
        }
    }
}

/// One trigger of an alarm
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AlarmHistory {
    pub id: i64,
    pub alarm_id: i64,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub triggered_at: NaiveDateTime,
    #[cfg_attr(feature = "openapi", schema(value_type = Option<String>))]
    pub responded_at: Option<NaiveDateTime>,
    pub status: HistoryStatus,
    #[cfg_attr(feature = "openapi", schema(value_type = String))]
    pub created_at: NaiveDateTime,
}
