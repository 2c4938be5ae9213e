use tracing::debug;
use uuid::Uuid;

use peakstreak_types::models::ProfileData;

use crate::context::RequestContext;
use crate::error::Result;
use crate::service::Service;

impl Service {
    /// Assembles the profile page for `username` as seen by `viewer_id`
    /// (`None` for anonymous visitors).
    ///
    /// After the user is resolved, four reads run concurrently: habits with
    /// logs, follower count, following count and the viewer's follow edge.
    /// All four are awaited even if one fails; the first failure in that
    /// order is returned, tagged with the read it came from. The reads are
    /// not transactionally linked, so counts may be skewed by writes that
    /// land in between.
    pub async fn get_profile_data(
        &self,
        ctx: &RequestContext,
        username: &str,
        viewer_id: Option<Uuid>,
    ) -> Result<ProfileData> {
        let user = ctx.guard(self.gateway.get_user_by_username(username)).await?.sanitized();
        let user_id = user.id;
        let is_owner = viewer_id == Some(user_id);
        let (start, end) = self.window(self.config.profile_window_days);

        let habits = self.all_habits_with_logs(ctx, user_id, start, end);
        let followers = ctx.guard(self.gateway.get_follower_count(user_id));
        let following = ctx.guard(self.gateway.get_following_count(user_id));
        let is_following = async {
            match viewer_id {
                Some(viewer) if viewer != user_id => ctx.guard(self.gateway.is_following(viewer, user_id)).await,
                _ => Ok(false),
            }
        };

        let (habits, followers, following, is_following) = tokio::join!(habits, followers, following, is_following);

        let habits = habits.map_err(|e| e.in_stage("get habits"))?;
        let followers_count = followers.map_err(|e| e.in_stage("get followers count"))?;
        let following_count = following.map_err(|e| e.in_stage("get following count"))?;
        let is_following = is_following.map_err(|e| e.in_stage("check following status"))?;

        debug!(
            "Profile {} assembled: {} habits, viewer {:?}, owner={}",
            user.username,
            habits.len(),
            viewer_id,
            is_owner
        );

        Ok(ProfileData {
            user,
            habits,
            is_owner,
            followers_count,
            following_count,
            is_following,
        })
    }
}
