use futures_util::future::join_all;
use uuid::Uuid;

use peakstreak_types::models::{ExploreEntry, LeaderboardEntry};

use crate::context::RequestContext;
use crate::error::Result;
use crate::habits::attach_logs;
use crate::service::Service;

impl Service {
    /// Top `limit` users by logged days, each with their habits and the
    /// logs inside the profile window. Habit loads for all ranked users run
    /// concurrently and are all awaited before the first error is returned.
    pub async fn leaderboard(&self, ctx: &RequestContext, limit: u32) -> Result<Vec<LeaderboardEntry>> {
        let ranked = ctx.guard(self.gateway.get_leaderboard(limit)).await?;
        let (start, end) = self.window(self.config.profile_window_days);

        let loads = ranked
            .iter()
            .map(|r| self.all_habits_with_logs(ctx, r.user.id, start, end));
        let habits = join_all(loads).await.into_iter().collect::<Result<Vec<_>>>()?;

        Ok(ranked
            .into_iter()
            .zip(habits)
            .map(|(r, habits)| LeaderboardEntry {
                user: r.user,
                total_logged_days: r.total_logged_days,
                habits,
            })
            .collect())
    }

    /// Each recently active user with the habit they last logged.
    pub async fn explore(&self, ctx: &RequestContext, limit: u32) -> Result<Vec<ExploreEntry>> {
        let activity = ctx.guard(self.gateway.get_recent_activity(limit)).await?;
        if activity.is_empty() {
            return Ok(Vec::new());
        }

        let (start, end) = self.window(self.config.profile_window_days);
        let habit_ids: Vec<Uuid> = activity.iter().map(|a| a.habit.id).collect();
        let logs = ctx
            .guard(self.gateway.get_logs_for_habits(&habit_ids, start, end))
            .await?;

        let (users, habits): (Vec<_>, Vec<_>) = activity.into_iter().map(|a| (a.user, a.habit)).unzip();
        Ok(users
            .into_iter()
            .zip(attach_logs(habits, logs))
            .map(|(user, habit)| ExploreEntry { user, habit })
            .collect())
    }
}
