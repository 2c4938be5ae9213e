//! [`Gateway`] over the SQLite [`Database`]. Every call runs on the blocking
//! pool so connection locks never stall the async runtime.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use rusqlite::ErrorCode;
use uuid::Uuid;

use peakstreak_core::gateway::{Gateway, RecentActivity};
use peakstreak_core::{Error, Result};
use peakstreak_types::models::{Habit, HabitLog, PublicUser, RankedUser, User};

use crate::Database;
use crate::models::convert_all;

#[derive(Clone)]
pub struct SqliteGateway {
    db: Arc<Database>,
}

impl SqliteGateway {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    async fn run<F, T>(&self, f: F) -> anyhow::Result<T>
    where
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        tokio::task::spawn_blocking(move || f(db.as_ref())).await?
    }
}

/// Maps a UNIQUE violation on the users table to the matching domain error.
fn classify_user_insert(err: anyhow::Error) -> Error {
    if let Some(rusqlite::Error::SqliteFailure(code, Some(msg))) = err.downcast_ref::<rusqlite::Error>() {
        if code.code == ErrorCode::ConstraintViolation {
            if msg.contains("users.username") {
                return Error::DuplicateUsername;
            }
            if msg.contains("users.email") {
                return Error::DuplicateEmail;
            }
        }
    }
    Error::internal(err)
}

fn found<T>(row: Option<T>, what: &'static str) -> Result<T> {
    row.ok_or(Error::NotFound(what))
}

#[async_trait]
impl Gateway for SqliteGateway {
    async fn create_user(&self, user: &User) -> Result<()> {
        let user = user.clone();
        self.run(move |db| db.create_user(&user)).await.map_err(classify_user_insert)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        let username = username.to_string();
        let row = self
            .run(move |db| db.get_user_by_username(&username))
            .await
            .map_err(Error::internal)?;
        User::try_from(found(row, "user")?).map_err(Error::internal)
    }

    async fn get_user_by_identifier(&self, identifier: &str) -> Result<User> {
        let identifier = identifier.to_string();
        let row = self
            .run(move |db| db.get_user_by_identifier(&identifier))
            .await
            .map_err(Error::internal)?;
        User::try_from(found(row, "user")?).map_err(Error::internal)
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<User> {
        let row = self.run(move |db| db.get_user_by_id(id)).await.map_err(Error::internal)?;
        User::try_from(found(row, "user")?).map_err(Error::internal)
    }

    async fn get_user_avatar(&self, user_id: Uuid) -> Result<Option<String>> {
        let avatar = self
            .run(move |db| db.get_user_avatar(user_id))
            .await
            .map_err(Error::internal)?;
        found(avatar, "user")
    }

    async fn update_user_avatar(&self, user_id: Uuid, avatar_url: Option<&str>) -> Result<()> {
        let avatar_url = avatar_url.map(str::to_string);
        let changed = self
            .run(move |db| db.update_user_avatar(user_id, avatar_url.as_deref()))
            .await
            .map_err(Error::internal)?;
        if changed == 0 {
            return Err(Error::NotFound("user"));
        }
        Ok(())
    }

    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<PublicUser>> {
        let query = query.to_string();
        let rows = self
            .run(move |db| db.search_users(&query, limit))
            .await
            .map_err(Error::internal)?;
        convert_all(rows).map_err(Error::internal)
    }

    async fn create_habit(&self, habit: &Habit) -> Result<()> {
        let habit = habit.clone();
        self.run(move |db| db.create_habit(&habit)).await.map_err(Error::internal)
    }

    async fn get_habits_by_user_id(&self, user_id: Uuid) -> Result<Vec<Habit>> {
        let rows = self
            .run(move |db| db.get_habits_by_user_id(user_id))
            .await
            .map_err(Error::internal)?;
        convert_all(rows).map_err(Error::internal)
    }

    async fn get_habit_by_id(&self, habit_id: Uuid) -> Result<Habit> {
        let row = self
            .run(move |db| db.get_habit_by_id(habit_id))
            .await
            .map_err(Error::internal)?;
        Habit::try_from(found(row, "habit")?).map_err(Error::internal)
    }

    async fn update_habit(&self, habit: &Habit) -> Result<()> {
        let habit = habit.clone();
        let changed = self.run(move |db| db.update_habit(&habit)).await.map_err(Error::internal)?;
        if changed == 0 {
            return Err(Error::NotFound("habit"));
        }
        Ok(())
    }

    async fn delete_habit(&self, habit_id: Uuid, owner_id: Uuid) -> Result<()> {
        let removed = self
            .run(move |db| db.delete_habit(habit_id, owner_id))
            .await
            .map_err(Error::internal)?;
        if removed == 0 {
            return Err(Error::NotFound("habit"));
        }
        Ok(())
    }

    async fn upsert_habit_log(&self, log: &HabitLog) -> Result<HabitLog> {
        let log = log.clone();
        let row = self.run(move |db| db.upsert_habit_log(&log)).await.map_err(Error::internal)?;
        HabitLog::try_from(row).map_err(Error::internal)
    }

    async fn get_logs_for_habits(&self, habit_ids: &[Uuid], start: NaiveDate, end: NaiveDate) -> Result<Vec<HabitLog>> {
        let habit_ids = habit_ids.to_vec();
        let rows = self
            .run(move |db| db.get_logs_for_habits(&habit_ids, start, end))
            .await
            .map_err(Error::internal)?;
        convert_all(rows).map_err(Error::internal)
    }

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        let at = Utc::now();
        self.run(move |db| db.follow(follower_id, followee_id, at))
            .await
            .map_err(Error::internal)
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.run(move |db| db.unfollow(follower_id, followee_id))
            .await
            .map_err(Error::internal)
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        self.run(move |db| db.is_following(follower_id, followee_id))
            .await
            .map_err(Error::internal)
    }

    async fn get_follower_count(&self, user_id: Uuid) -> Result<i64> {
        self.run(move |db| db.get_follower_count(user_id))
            .await
            .map_err(Error::internal)
    }

    async fn get_following_count(&self, user_id: Uuid) -> Result<i64> {
        self.run(move |db| db.get_following_count(user_id))
            .await
            .map_err(Error::internal)
    }

    async fn get_followers(&self, user_id: Uuid) -> Result<Vec<PublicUser>> {
        let rows = self.run(move |db| db.get_followers(user_id)).await.map_err(Error::internal)?;
        convert_all(rows).map_err(Error::internal)
    }

    async fn get_following(&self, user_id: Uuid) -> Result<Vec<PublicUser>> {
        let rows = self.run(move |db| db.get_following(user_id)).await.map_err(Error::internal)?;
        convert_all(rows).map_err(Error::internal)
    }

    async fn get_leaderboard(&self, limit: u32) -> Result<Vec<RankedUser>> {
        let rows = self.run(move |db| db.get_leaderboard(limit)).await.map_err(Error::internal)?;
        rows.into_iter()
            .map(|r| {
                Ok(RankedUser {
                    user: PublicUser::try_from(r.user)?,
                    total_logged_days: r.total,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(Error::internal)
    }

    async fn get_recent_activity(&self, limit: u32) -> Result<Vec<RecentActivity>> {
        let rows = self
            .run(move |db| db.get_recent_activity(limit))
            .await
            .map_err(Error::internal)?;
        rows.into_iter()
            .map(|r| {
                Ok(RecentActivity {
                    user: PublicUser::try_from(r.user)?,
                    habit: Habit::try_from(r.habit)?,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .map_err(Error::internal)
    }
}
