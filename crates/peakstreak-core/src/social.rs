use tracing::debug;
use uuid::Uuid;

use peakstreak_types::models::PublicUser;

use crate::context::RequestContext;
use crate::error::{Error, Result};
use crate::service::Service;

const SEARCH_LIMIT: u32 = 40;

impl Service {
    pub async fn follow_user(&self, ctx: &RequestContext, follower_id: Uuid, target_username: &str) -> Result<()> {
        let target = ctx.guard(self.gateway.get_user_by_username(target_username)).await?;
        if target.id == follower_id {
            return Err(Error::CannotFollowSelf);
        }

        ctx.guard(self.gateway.follow(follower_id, target.id)).await?;
        debug!("{} now follows {}", follower_id, target.id);
        Ok(())
    }

    pub async fn unfollow_user(&self, ctx: &RequestContext, follower_id: Uuid, target_username: &str) -> Result<()> {
        let target = ctx.guard(self.gateway.get_user_by_username(target_username)).await?;
        ctx.guard(self.gateway.unfollow(follower_id, target.id)).await?;
        debug!("{} unfollowed {}", follower_id, target.id);
        Ok(())
    }

    pub async fn get_followers(&self, ctx: &RequestContext, username: &str) -> Result<Vec<PublicUser>> {
        let user = ctx.guard(self.gateway.get_user_by_username(username)).await?;
        ctx.guard(self.gateway.get_followers(user.id)).await
    }

    pub async fn get_following(&self, ctx: &RequestContext, username: &str) -> Result<Vec<PublicUser>> {
        let user = ctx.guard(self.gateway.get_user_by_username(username)).await?;
        ctx.guard(self.gateway.get_following(user.id)).await
    }

    pub async fn search_users(&self, ctx: &RequestContext, query: &str) -> Result<Vec<PublicUser>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        ctx.guard(self.gateway.search_users(query, SEARCH_LIMIT)).await
    }
}
