//! Database row types. These map directly to SQLite rows and are converted
//! into `peakstreak-types` models at the gateway boundary.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;

use peakstreak_types::models::{Habit, HabitLog, PublicUser, User};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

pub struct PublicUserRow {
    pub id: String,
    pub username: String,
    pub avatar_url: Option<String>,
}

pub struct HabitRow {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub color_hue: i32,
    pub is_boolean: bool,
    pub created_at: String,
}

pub struct HabitLogRow {
    pub id: String,
    pub habit_id: String,
    pub log_date: String,
    pub value: i64,
    pub created_at: String,
    pub updated_at: String,
}

pub const USER_COLUMNS: &str = "id, username, email, password_hash, avatar_url, created_at";
pub const HABIT_COLUMNS: &str = "id, user_id, name, color_hue, is_boolean, created_at";
pub const LOG_COLUMNS: &str = "id, habit_id, log_date, value, created_at, updated_at";

impl UserRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            password_hash: row.get(3)?,
            avatar_url: row.get(4)?,
            created_at: row.get(5)?,
        })
    }
}

impl PublicUserRow {
    /// Reads `id, username, avatar_url` starting at column `offset`.
    pub fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            username: row.get(offset + 1)?,
            avatar_url: row.get(offset + 2)?,
        })
    }
}

impl HabitRow {
    /// Reads the `HABIT_COLUMNS` starting at column `offset`.
    pub fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(offset)?,
            user_id: row.get(offset + 1)?,
            name: row.get(offset + 2)?,
            color_hue: row.get(offset + 3)?,
            is_boolean: row.get(offset + 4)?,
            created_at: row.get(offset + 5)?,
        })
    }
}

impl HabitLogRow {
    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            habit_id: row.get(1)?,
            log_date: row.get(2)?,
            value: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

fn parse_id(raw: &str) -> Result<Uuid> {
    raw.parse().with_context(|| format!("Corrupt id '{}'", raw))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .with_context(|| format!("Corrupt timestamp '{}'", raw))
}

fn parse_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, DATE_FORMAT).with_context(|| format!("Corrupt date '{}'", raw))
}

impl TryFrom<UserRow> for User {
    type Error = anyhow::Error;

    fn try_from(row: UserRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(&row.id)?,
            username: row.username,
            email: row.email,
            password_hash: row.password_hash,
            avatar_url: row.avatar_url,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<PublicUserRow> for PublicUser {
    type Error = anyhow::Error;

    fn try_from(row: PublicUserRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(&row.id)?,
            username: row.username,
            avatar_url: row.avatar_url,
        })
    }
}

impl TryFrom<HabitRow> for Habit {
    type Error = anyhow::Error;

    fn try_from(row: HabitRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(&row.id)?,
            user_id: parse_id(&row.user_id)?,
            name: row.name,
            color_hue: row.color_hue,
            is_boolean: row.is_boolean,
            created_at: parse_timestamp(&row.created_at)?,
        })
    }
}

impl TryFrom<HabitLogRow> for HabitLog {
    type Error = anyhow::Error;

    fn try_from(row: HabitLogRow) -> Result<Self> {
        Ok(Self {
            id: parse_id(&row.id)?,
            habit_id: parse_id(&row.habit_id)?,
            log_date: parse_date(&row.log_date)?,
            value: row.value,
            created_at: parse_timestamp(&row.created_at)?,
            updated_at: parse_timestamp(&row.updated_at)?,
        })
    }
}

/// Converts a batch of rows, failing on the first corrupt one.
pub fn convert_all<R, T>(rows: Vec<R>) -> Result<Vec<T>>
where
    T: TryFrom<R, Error = anyhow::Error>,
{
    rows.into_iter().map(T::try_from).collect()
}
