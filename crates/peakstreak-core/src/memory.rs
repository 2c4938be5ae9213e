//! In-memory gateway and blob store for unit tests.
//!
//! Records how often each method is called, can be told to fail a given
//! method, and can add artificial latency to every call or to one method.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use peakstreak_types::models::{Habit, HabitLog, PublicUser, RankedUser, User};

use crate::error::{Error, Result};
use crate::gateway::{Gateway, RecentActivity};
use crate::storage::BlobStore;

#[derive(Default)]
struct State {
    users: Vec<User>,
    habits: Vec<Habit>,
    logs: Vec<HabitLog>,
    /// (follower, followee, created_at)
    follows: Vec<(Uuid, Uuid, DateTime<Utc>)>,
}

#[derive(Default)]
pub(crate) struct MemoryGateway {
    state: Mutex<State>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: Mutex<HashSet<&'static str>>,
    latency: Mutex<Option<Duration>>,
    delays: Mutex<HashMap<&'static str, Duration>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(&self, method: &'static str) {
        self.failing.lock().unwrap().insert(method);
    }

    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = Some(latency);
    }

    /// Holds every call to `method` for `delay`, overriding the global latency.
    pub fn delay_on(&self, method: &'static str, delay: Duration) {
        self.delays.lock().unwrap().insert(method, delay);
    }

    pub fn calls(&self, method: &str) -> usize {
        self.calls.lock().unwrap().get(method).copied().unwrap_or(0)
    }

    pub fn seed_user(&self, username: &str) -> User {
        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "seeded-hash".to_string(),
            avatar_url: None,
            created_at: Utc::now(),
        };
        self.state.lock().unwrap().users.push(user.clone());
        user
    }

    pub fn seed_habit(&self, owner: Uuid, name: &str, is_boolean: bool, created_at: DateTime<Utc>) -> Habit {
        let habit = Habit {
            id: Uuid::new_v4(),
            user_id: owner,
            name: name.to_string(),
            color_hue: 0,
            is_boolean,
            created_at,
        };
        self.state.lock().unwrap().habits.push(habit.clone());
        habit
    }

    pub fn seed_log(&self, habit_id: Uuid, date: NaiveDate, value: i64) -> HabitLog {
        let now = Utc::now();
        let log = HabitLog {
            id: Uuid::new_v4(),
            habit_id,
            log_date: date,
            value,
            created_at: now,
            updated_at: now,
        };
        self.state.lock().unwrap().logs.push(log.clone());
        log
    }

    pub fn seed_follow(&self, follower: Uuid, followee: Uuid) {
        self.state.lock().unwrap().follows.push((follower, followee, Utc::now()));
    }

    pub fn habit(&self, id: Uuid) -> Option<Habit> {
        self.state.lock().unwrap().habits.iter().find(|h| h.id == id).cloned()
    }

    pub fn logs_of(&self, habit_id: Uuid) -> Vec<HabitLog> {
        self.state
            .lock()
            .unwrap()
            .logs
            .iter()
            .filter(|l| l.habit_id == habit_id)
            .cloned()
            .collect()
    }

    pub fn edge_count(&self, follower: Uuid, followee: Uuid) -> usize {
        self.state
            .lock()
            .unwrap()
            .follows
            .iter()
            .filter(|(f, t, _)| *f == follower && *t == followee)
            .count()
    }

    async fn enter(&self, method: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(method).or_default() += 1;
        let delay = self.delays.lock().unwrap().get(method).copied();
        let latency = delay.or(*self.latency.lock().unwrap());
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.lock().unwrap().contains(method) {
            return Err(Error::internal(anyhow!("injected failure in {method}")));
        }
        Ok(())
    }

    fn public(user: &User) -> PublicUser {
        PublicUser {
            id: user.id,
            username: user.username.clone(),
            avatar_url: user.avatar_url.clone(),
        }
    }
}

#[async_trait]
impl Gateway for MemoryGateway {
    async fn create_user(&self, user: &User) -> Result<()> {
        self.enter("create_user").await?;
        let mut state = self.state.lock().unwrap();
        if state.users.iter().any(|u| u.username == user.username) {
            return Err(Error::DuplicateUsername);
        }
        if state.users.iter().any(|u| u.email == user.email) {
            return Err(Error::DuplicateEmail);
        }
        state.users.push(user.clone());
        Ok(())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<User> {
        self.enter("get_user_by_username").await?;
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.username == username)
            .cloned()
            .ok_or(Error::NotFound("user"))
    }

    async fn get_user_by_identifier(&self, identifier: &str) -> Result<User> {
        self.enter("get_user_by_identifier").await?;
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.username == identifier || u.email == identifier)
            .cloned()
            .ok_or(Error::NotFound("user"))
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<User> {
        self.enter("get_user_by_id").await?;
        let state = self.state.lock().unwrap();
        state.users.iter().find(|u| u.id == id).cloned().ok_or(Error::NotFound("user"))
    }

    async fn get_user_avatar(&self, user_id: Uuid) -> Result<Option<String>> {
        self.enter("get_user_avatar").await?;
        let state = self.state.lock().unwrap();
        state
            .users
            .iter()
            .find(|u| u.id == user_id)
            .map(|u| u.avatar_url.clone())
            .ok_or(Error::NotFound("user"))
    }

    async fn update_user_avatar(&self, user_id: Uuid, avatar_url: Option<&str>) -> Result<()> {
        self.enter("update_user_avatar").await?;
        let mut state = self.state.lock().unwrap();
        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or(Error::NotFound("user"))?;
        user.avatar_url = avatar_url.map(str::to_string);
        Ok(())
    }

    async fn search_users(&self, query: &str, limit: u32) -> Result<Vec<PublicUser>> {
        self.enter("search_users").await?;
        let needle = query.to_lowercase();
        let state = self.state.lock().unwrap();
        let mut found: Vec<PublicUser> = state
            .users
            .iter()
            .filter(|u| u.username.to_lowercase().contains(&needle))
            .map(Self::public)
            .collect();
        found.sort_by(|a, b| a.username.cmp(&b.username));
        found.truncate(limit as usize);
        Ok(found)
    }

    async fn create_habit(&self, habit: &Habit) -> Result<()> {
        self.enter("create_habit").await?;
        self.state.lock().unwrap().habits.push(habit.clone());
        Ok(())
    }

    async fn get_habits_by_user_id(&self, user_id: Uuid) -> Result<Vec<Habit>> {
        self.enter("get_habits_by_user_id").await?;
        let state = self.state.lock().unwrap();
        let mut habits: Vec<Habit> = state.habits.iter().filter(|h| h.user_id == user_id).cloned().collect();
        habits.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(habits)
    }

    async fn get_habit_by_id(&self, habit_id: Uuid) -> Result<Habit> {
        self.enter("get_habit_by_id").await?;
        let state = self.state.lock().unwrap();
        state.habits.iter().find(|h| h.id == habit_id).cloned().ok_or(Error::NotFound("habit"))
    }

    async fn update_habit(&self, habit: &Habit) -> Result<()> {
        self.enter("update_habit").await?;
        let mut state = self.state.lock().unwrap();
        let stored = state
            .habits
            .iter_mut()
            .find(|h| h.id == habit.id)
            .ok_or(Error::NotFound("habit"))?;
        stored.name = habit.name.clone();
        stored.color_hue = habit.color_hue;
        Ok(())
    }

    async fn delete_habit(&self, habit_id: Uuid, owner_id: Uuid) -> Result<()> {
        self.enter("delete_habit").await?;
        let mut state = self.state.lock().unwrap();
        let before = state.habits.len();
        state.habits.retain(|h| !(h.id == habit_id && h.user_id == owner_id));
        if state.habits.len() == before {
            return Err(Error::NotFound("habit"));
        }
        state.logs.retain(|l| l.habit_id != habit_id);
        Ok(())
    }

    async fn upsert_habit_log(&self, log: &HabitLog) -> Result<HabitLog> {
        self.enter("upsert_habit_log").await?;
        let mut state = self.state.lock().unwrap();
        if let Some(existing) = state
            .logs
            .iter_mut()
            .find(|l| l.habit_id == log.habit_id && l.log_date == log.log_date)
        {
            existing.value = log.value;
            existing.updated_at = log.updated_at;
            return Ok(existing.clone());
        }
        state.logs.push(log.clone());
        Ok(log.clone())
    }

    async fn get_logs_for_habits(
        &self,
        habit_ids: &[Uuid],
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HabitLog>> {
        self.enter("get_logs_for_habits").await?;
        let state = self.state.lock().unwrap();
        let mut logs: Vec<HabitLog> = state
            .logs
            .iter()
            .filter(|l| habit_ids.contains(&l.habit_id) && l.log_date >= start && l.log_date <= end)
            .cloned()
            .collect();
        logs.sort_by(|a, b| a.habit_id.cmp(&b.habit_id).then(a.log_date.cmp(&b.log_date)));
        Ok(logs)
    }

    async fn follow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.enter("follow").await?;
        let mut state = self.state.lock().unwrap();
        if !state.follows.iter().any(|(f, t, _)| *f == follower_id && *t == followee_id) {
            state.follows.push((follower_id, followee_id, Utc::now()));
        }
        Ok(())
    }

    async fn unfollow(&self, follower_id: Uuid, followee_id: Uuid) -> Result<()> {
        self.enter("unfollow").await?;
        let mut state = self.state.lock().unwrap();
        state.follows.retain(|(f, t, _)| !(*f == follower_id && *t == followee_id));
        Ok(())
    }

    async fn is_following(&self, follower_id: Uuid, followee_id: Uuid) -> Result<bool> {
        self.enter("is_following").await?;
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().any(|(f, t, _)| *f == follower_id && *t == followee_id))
    }

    async fn get_follower_count(&self, user_id: Uuid) -> Result<i64> {
        self.enter("get_follower_count").await?;
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().filter(|(_, t, _)| *t == user_id).count() as i64)
    }

    async fn get_following_count(&self, user_id: Uuid) -> Result<i64> {
        self.enter("get_following_count").await?;
        let state = self.state.lock().unwrap();
        Ok(state.follows.iter().filter(|(f, _, _)| *f == user_id).count() as i64)
    }

    async fn get_followers(&self, user_id: Uuid) -> Result<Vec<PublicUser>> {
        self.enter("get_followers").await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(_, t, _)| *t == user_id)
            .filter_map(|(f, _, _)| state.users.iter().find(|u| u.id == *f))
            .map(Self::public)
            .collect())
    }

    async fn get_following(&self, user_id: Uuid) -> Result<Vec<PublicUser>> {
        self.enter("get_following").await?;
        let state = self.state.lock().unwrap();
        Ok(state
            .follows
            .iter()
            .rev()
            .filter(|(f, _, _)| *f == user_id)
            .filter_map(|(_, t, _)| state.users.iter().find(|u| u.id == *t))
            .map(Self::public)
            .collect())
    }

    async fn get_leaderboard(&self, limit: u32) -> Result<Vec<RankedUser>> {
        self.enter("get_leaderboard").await?;
        let state = self.state.lock().unwrap();
        let mut ranked: Vec<RankedUser> = state
            .users
            .iter()
            .map(|u| {
                let total = state
                    .logs
                    .iter()
                    .filter(|l| l.is_done())
                    .filter(|l| state.habits.iter().any(|h| h.id == l.habit_id && h.user_id == u.id))
                    .count() as i64;
                RankedUser {
                    user: Self::public(u),
                    total_logged_days: total,
                }
            })
            .filter(|r| r.total_logged_days > 0)
            .collect();
        ranked.sort_by(|a, b| b.total_logged_days.cmp(&a.total_logged_days));
        ranked.truncate(limit as usize);
        Ok(ranked)
    }

    async fn get_recent_activity(&self, limit: u32) -> Result<Vec<RecentActivity>> {
        self.enter("get_recent_activity").await?;
        let state = self.state.lock().unwrap();
        let mut latest: HashMap<Uuid, (&HabitLog, &Habit)> = HashMap::new();
        for log in state.logs.iter().filter(|l| l.is_done()) {
            let Some(habit) = state.habits.iter().find(|h| h.id == log.habit_id) else {
                continue;
            };
            let slot = latest.entry(habit.user_id).or_insert((log, habit));
            if log.updated_at > slot.0.updated_at {
                *slot = (log, habit);
            }
        }
        let mut entries: Vec<(DateTime<Utc>, RecentActivity)> = latest
            .into_iter()
            .filter_map(|(user_id, (log, habit))| {
                let user = state.users.iter().find(|u| u.id == user_id)?;
                Some((
                    log.updated_at,
                    RecentActivity {
                        user: Self::public(user),
                        habit: habit.clone(),
                    },
                ))
            })
            .collect();
        entries.sort_by(|a, b| b.0.cmp(&a.0));
        Ok(entries.into_iter().take(limit as usize).map(|(_, e)| e).collect())
    }
}

/// Blob store that keeps bytes in a map and hands out `/blobs/{key}` locators.
#[derive(Default)]
pub(crate) struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_deletes: Mutex<bool>,
}

impl MemoryBlobStore {
    pub fn contains(&self, locator: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(locator)
    }

    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn fail_deletes(&self) {
        *self.fail_deletes.lock().unwrap() = true;
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save(&self, key: &str, data: &[u8]) -> anyhow::Result<String> {
        let locator = format!("/blobs/{key}");
        self.blobs.lock().unwrap().insert(locator.clone(), data.to_vec());
        Ok(locator)
    }

    async fn delete(&self, locator: &str) -> anyhow::Result<()> {
        if *self.fail_deletes.lock().unwrap() {
            anyhow::bail!("delete refused for {locator}");
        }
        self.blobs.lock().unwrap().remove(locator);
        Ok(())
    }
}

/// 2024-03-15T12:00:00Z, advancing one second per reading so successive
/// timestamps are strictly ordered.
pub(crate) fn ticking_clock() -> impl Fn() -> DateTime<Utc> + Send + Sync + 'static {
    use std::sync::atomic::{AtomicI64, Ordering};

    let start = DateTime::parse_from_rfc3339("2024-03-15T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc);
    let ticks = AtomicI64::new(0);
    move || start + chrono::Duration::seconds(ticks.fetch_add(1, Ordering::Relaxed))
}

pub(crate) fn test_service() -> (
    crate::Service,
    std::sync::Arc<MemoryGateway>,
    std::sync::Arc<MemoryBlobStore>,
) {
    let gateway = std::sync::Arc::new(MemoryGateway::new());
    let blobs = std::sync::Arc::new(MemoryBlobStore::default());
    let service = crate::Service::new(gateway.clone(), blobs.clone(), crate::ServiceConfig::default())
        .with_clock(ticking_clock());
    (service, gateway, blobs)
}

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}
