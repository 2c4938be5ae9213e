use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string. Never leaves the server: skipped by serde and
    /// cleared by [`User::sanitized`] before the core hands a user out.
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn sanitized(mut self) -> Self {
        self.password_hash.clear();
        self
    }
}

/// The slice of a user that is safe to show to anyone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub color_hue: i32,
    /// `true`: done / not done, logged as 0 or 1. `false`: counted habit.
    pub is_boolean: bool,
    pub created_at: DateTime<Utc>,
}

/// One entry per (habit, calendar date).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HabitLog {
    pub id: Uuid,
    pub habit_id: Uuid,
    #[serde(rename = "date")]
    pub log_date: NaiveDate,
    pub value: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl HabitLog {
    pub fn is_done(&self) -> bool {
        self.value > 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HabitWithLogs {
    #[serde(flatten)]
    pub habit: Habit,
    pub logs: Vec<HabitLog>,
}

/// Everything the profile page shows, assembled per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileData {
    pub user: User,
    pub habits: Vec<HabitWithLogs>,
    pub is_owner: bool,
    pub followers_count: i64,
    pub following_count: i64,
    pub is_following: bool,
}

/// Row returned by the gateway's leaderboard ranking, before habits are attached.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedUser {
    pub user: PublicUser,
    pub total_logged_days: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user: PublicUser,
    pub total_logged_days: i64,
    pub habits: Vec<HabitWithLogs>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExploreEntry {
    pub user: PublicUser,
    pub habit: HabitWithLogs,
}
