//! Persistence contract the service reads and writes through.

use async_trait::async_trait;
use chrono::NaiveDate;
use uuid::Uuid;

use peakstreak_types::models::{Habit, HabitLog, PublicUser, RankedUser, User};

use crate::error::Result;

/// A user's most recently logged habit, as surfaced on the explore feed.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentActivity {
    pub user: PublicUser,
    pub habit: Habit,
}

/// An abstract store for users, habits, logs and the follow graph.
///
/// Implementations must be safe to call concurrently: the profile
/// aggregator issues several reads at once against the same gateway.
///
/// # Error contract
///
/// - Lookups of a single row return [`Error::NotFound`](crate::Error::NotFound)
///   when the row does not exist.
/// - `create_user` reports a uniqueness violation as
///   [`Error::DuplicateUsername`](crate::Error::DuplicateUsername) or
///   [`Error::DuplicateEmail`](crate::Error::DuplicateEmail), decided by which
///   constraint fired.
/// - `update_habit` and `delete_habit` return `NotFound` when no row was
///   affected. For `delete_habit` that includes "exists but owned by someone
///   else", since the owner is part of the same statement.
/// - Everything else is wrapped as [`Error::Internal`](crate::Error::Internal).
#[async_trait]
pub trait Gateway: Send + Sync {
    // -- Users --

    async fn create_user(&self, user: &User) -> Result<()>;

    async fn get_user_by_username(&self, username: &str) -> Result<User>;

    /// Looks up a user whose username OR email equals `identifier`.
    async fn get_user_by_identifier(&self, identifier: &str) -> Result<User>;

    async fn get_user_by_id(&self, id: Uuid) -> Result<User>;

    async fn get_user_avatar(&self, user_id: Uuid) -> Result<Option<String>>;

    async fn update_user_avatar(&self, user_id: Uuid, avatar_url: Option<&str>) -> Result<()>;

    /// Case-insensitive substring match on username, ordered by username.
    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<PublicUser>>;

    // -- Habits --

    async fn create_habit(&self, habit: &Habit) -> Result<()>;

    /// Newest-created first.
    async fn get_habits_by_user_id(&self, user_id: Uuid) -> Result<Vec<Habit>>;

    async fn get_habit_by_id(&self, habit_id: Uuid) -> Result<Habit>;

    async fn update_habit(&self, habit: &Habit) -> Result<()>;

    /// Deletes the habit only if it belongs to `owner_id`. Logs go with it.
    async fn delete_habit(&self, habit_id: Uuid, owner_id: Uuid) -> Result<()>;

    /// Insert-or-update keyed by `(habit_id, log_date)`.
    ///
    /// Returns the stored row: on conflict the existing id and `created_at`
    /// are kept while `value` and `updated_at` change.
    async fn upsert_habit_log(&self, log: &HabitLog) -> Result<HabitLog>;

    /// All logs of the given habits with `start <= log_date <= end`,
    /// oldest date first within each habit.
    async fn get_logs_for_habits(
        &self,
        habit_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HabitLog>>;

    // -- Follow graph --

    /// Idempotent: following twice leaves one edge.
    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()>;

    /// Idempotent: removing a missing edge succeeds.
    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()>;

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool>;

    async fn get_follower_count(&self, user_id: Uuid) -> Result<i64>;

    async fn get_following_count(&self, user_id: Uuid) -> Result<i64>;

    /// Newest edge first.
    async fn get_followers(&self, user_id: Uuid) -> Result<Vec<PublicUser>>;

    /// Newest edge first.
    async fn get_following(&self, user_id: Uuid) -> Result<Vec<PublicUser>>;

    // -- Feeds --

    /// Users ranked by how many logs with a positive value they have.
    async fn get_leaderboard(&self, limit: u32) -> Result<Vec<RankedUser>>;

    /// For each user, the habit whose log was touched last; most recent first.
    async fn get_recent_activity(&self, limit: u32) -> Result<Vec<RecentActivity>>;
}
