use anyhow::Result;
use async_trait::async_trait;

/// Opaque byte storage for user uploads.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores `data` under `key` and returns the public locator (URL path)
    /// clients use to fetch it.
    async fn save(&self, key: &str, data: &[u8]) -> Result<String>;

    /// Removes the blob behind a locator previously returned by `save`.
    /// A blob that is already gone is not an error.
    async fn delete(&self, locator: &str) -> Result<()>;
}
