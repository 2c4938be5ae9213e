use std::sync::LazyLock;

use anyhow::anyhow;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::SaltString,
};
use rand_core::OsRng;
use tracing::{debug, info, warn};
use uuid::Uuid;

use peakstreak_types::models::User;

use crate::context::RequestContext;
use crate::error::{Error, ErrorKind, Result};
use crate::service::Service;

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";
const JPEG_MAGIC: &[u8] = &[0xFF, 0xD8, 0xFF];

/// Hash verified against when the identifier matches nobody, so a miss costs
/// the same as a wrong password.
static TIMING_PAD_HASH: LazyLock<Option<String>> = LazyLock::new(|| {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(b"peakstreak-timing-pad", &salt)
        .map(|h| h.to_string())
        .ok()
});

impl Service {
    /// Registers a new account. Uniqueness of username and email is left to
    /// the gateway's constraints; there is no lookup beforehand.
    pub async fn create_user(
        &self,
        ctx: &RequestContext,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User> {
        let password = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(Error::internal)??;

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            email: email.to_string(),
            password_hash,
            avatar_url: None,
            created_at: self.now(),
        };

        ctx.guard(self.gateway.create_user(&user)).await?;
        info!("User {} registered ({})", user.username, user.id);
        Ok(user.sanitized())
    }

    /// Checks a username-or-email and password pair. Unknown identifier and
    /// wrong password are indistinguishable to the caller.
    pub async fn login_user(&self, ctx: &RequestContext, identifier: &str, password: &str) -> Result<User> {
        let found = match ctx.guard(self.gateway.get_user_by_identifier(identifier)).await {
            Ok(user) => Some(user),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        let stored_hash = match &found {
            Some(user) => Some(user.password_hash.clone()),
            None => TIMING_PAD_HASH.clone(),
        };
        let password = password.to_string();
        let verified = tokio::task::spawn_blocking(move || {
            stored_hash.is_some_and(|hash| verify_password(&password, &hash))
        })
        .await
        .map_err(Error::internal)?;

        match found {
            Some(user) if verified => Ok(user.sanitized()),
            _ => {
                debug!("Rejected login for identifier {}", identifier);
                Err(Error::InvalidCredentials)
            }
        }
    }

    pub async fn get_user_by_username(&self, ctx: &RequestContext, username: &str) -> Result<User> {
        let user = ctx.guard(self.gateway.get_user_by_username(username)).await?;
        Ok(user.sanitized())
    }

    /// Replaces the avatar of `user_id` with `data` (PNG or JPEG) and returns
    /// its public locator.
    ///
    /// The new blob is written before the user row changes. If the row
    /// update fails the new blob is removed again; if it succeeds the old
    /// blob is removed, and a failure there is only logged.
    pub async fn update_avatar(&self, ctx: &RequestContext, user_id: Uuid, data: &[u8]) -> Result<String> {
        if data.len() > self.config.max_avatar_bytes {
            return Err(Error::InvalidInput(format!(
                "file size exceeds the {} byte limit",
                self.config.max_avatar_bytes
            )));
        }
        let ext = image_extension(data)
            .ok_or_else(|| Error::InvalidInput("only jpeg and png images are allowed".into()))?;

        let previous = match ctx.guard(self.gateway.get_user_avatar(user_id)).await {
            Ok(previous) => previous,
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => return Err(e),
        };

        // Writes below are not raced against ctx; an abandoned UPDATE can
        // still commit on the blocking pool.
        ctx.check()?;

        let key = format!("{}.{}", Uuid::new_v4(), ext);
        let locator = self.blobs.save(&key, data).await.map_err(Error::Internal)?;

        if let Err(e) = self.gateway.update_user_avatar(user_id, Some(&locator)).await {
            if let Err(cleanup) = self.blobs.delete(&locator).await {
                warn!("Failed to remove orphaned avatar {}: {}", locator, cleanup);
            }
            return Err(e);
        }

        if let Some(old) = previous.filter(|old| !old.is_empty()) {
            if let Err(e) = self.blobs.delete(&old).await {
                warn!("Failed to delete old avatar {}: {}", old, e);
            }
        }

        info!("User {} avatar set to {}", user_id, locator);
        Ok(locator)
    }
}

fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| Error::internal(anyhow!("failed to hash password: {e}")))
}

fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok()
}

fn image_extension(data: &[u8]) -> Option<&'static str> {
    if data.starts_with(PNG_MAGIC) {
        Some("png")
    } else if data.starts_with(JPEG_MAGIC) {
        Some("jpg")
    } else {
        None
    }
}
