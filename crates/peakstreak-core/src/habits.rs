use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::debug;
use uuid::Uuid;

use peakstreak_types::models::{Habit, HabitLog, HabitWithLogs};

use crate::context::RequestContext;
use crate::error::{Error, ErrorKind, Result};
use crate::service::Service;

impl Service {
    pub async fn create_habit(
        &self,
        ctx: &RequestContext,
        name: &str,
        color_hue: i32,
        is_boolean: bool,
        owner_id: Uuid,
    ) -> Result<Habit> {
        let habit = Habit {
            id: Uuid::new_v4(),
            user_id: owner_id,
            name: name.to_string(),
            color_hue,
            is_boolean,
            created_at: self.now(),
        };

        ctx.guard(self.gateway.create_habit(&habit)).await?;
        debug!("Habit {} created for user {}", habit.id, owner_id);
        Ok(habit)
    }

    pub async fn update_habit(
        &self,
        ctx: &RequestContext,
        habit_id: Uuid,
        name: &str,
        color_hue: i32,
        requester_id: Uuid,
    ) -> Result<Habit> {
        let mut habit = self.owned_habit(ctx, habit_id, requester_id).await?;
        habit.name = name.to_string();
        habit.color_hue = color_hue;

        ctx.guard(self.gateway.update_habit(&habit)).await?;
        Ok(habit)
    }

    /// Ownership is checked by the gateway in the same statement as the
    /// delete. Nothing deleted means the requester may not delete it, which
    /// also covers a habit that does not exist.
    pub async fn delete_habit(&self, ctx: &RequestContext, habit_id: Uuid, requester_id: Uuid) -> Result<()> {
        match ctx.guard(self.gateway.delete_habit(habit_id, requester_id)).await {
            Ok(()) => {
                debug!("Habit {} deleted by {}", habit_id, requester_id);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(Error::AccessDenied),
            Err(e) => Err(e),
        }
    }

    /// Records `value` for `date`, replacing any earlier value for that day.
    ///
    /// The value is stored as given; whether it suits a boolean or a counted
    /// habit is for the caller to check.
    pub async fn log_habit(
        &self,
        ctx: &RequestContext,
        habit_id: Uuid,
        date: NaiveDate,
        value: i64,
        requester_id: Uuid,
    ) -> Result<HabitLog> {
        self.owned_habit(ctx, habit_id, requester_id).await?;

        let now = self.now();
        let log = HabitLog {
            id: Uuid::new_v4(),
            habit_id,
            log_date: date,
            value,
            created_at: now,
            updated_at: now,
        };

        let stored = ctx.guard(self.gateway.upsert_habit_log(&log)).await?;
        debug!("Habit {} logged {} on {}", habit_id, value, date);
        Ok(stored)
    }

    /// One owned habit with its logs from the detail window.
    pub async fn get_habit_details(
        &self,
        ctx: &RequestContext,
        habit_id: Uuid,
        requester_id: Uuid,
    ) -> Result<HabitWithLogs> {
        let habit = self.owned_habit(ctx, habit_id, requester_id).await?;
        let (start, end) = self.window(self.config.detail_window_days);
        let logs = ctx
            .guard(self.gateway.get_logs_for_habits(&[habit_id], start, end))
            .await?;
        Ok(HabitWithLogs { habit, logs })
    }

    /// Every habit of `user_id`, newest first, each with its logs in
    /// `[start, end]` oldest first. Logs for all habits come from a single
    /// gateway call; no call is made when the user has no habits.
    pub async fn all_habits_with_logs(
        &self,
        ctx: &RequestContext,
        user_id: Uuid,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<HabitWithLogs>> {
        let habits = ctx.guard(self.gateway.get_habits_by_user_id(user_id)).await?;
        if habits.is_empty() {
            return Ok(Vec::new());
        }

        let habit_ids: Vec<Uuid> = habits.iter().map(|h| h.id).collect();
        let logs = ctx
            .guard(self.gateway.get_logs_for_habits(&habit_ids, start, end))
            .await?;

        Ok(attach_logs(habits, logs))
    }

    async fn owned_habit(&self, ctx: &RequestContext, habit_id: Uuid, requester_id: Uuid) -> Result<Habit> {
        let habit = ctx.guard(self.gateway.get_habit_by_id(habit_id)).await?;
        if habit.user_id != requester_id {
            return Err(Error::AccessDenied);
        }
        Ok(habit)
    }
}

/// Groups `logs` by habit and pairs them with `habits`, keeping the order of
/// both. Habits without logs get an empty list.
pub(crate) fn attach_logs(habits: Vec<Habit>, logs: Vec<HabitLog>) -> Vec<HabitWithLogs> {
    let mut by_habit: HashMap<Uuid, Vec<HabitLog>> = HashMap::new();
    for log in logs {
        by_habit.entry(log.habit_id).or_default().push(log);
    }

    habits
        .into_iter()
        .map(|habit| {
            let logs = by_habit.remove(&habit.id).unwrap_or_default();
            HabitWithLogs { habit, logs }
        })
        .collect()
}
