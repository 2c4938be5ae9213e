use std::io::ErrorKind;
use std::path::PathBuf;

use anyhow::{Result, bail};
use async_trait::async_trait;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use peakstreak_core::storage::BlobStore;

/// Avatar storage on local disk.
///
/// Each blob is a flat file at `{dir}/{key}` and is published as
/// `{url_prefix}/{key}`; the server mounts `dir` under that prefix.
pub struct LocalStorage {
    dir: PathBuf,
    url_prefix: String,
}

impl LocalStorage {
    pub async fn new(dir: PathBuf, url_prefix: &str) -> Result<Self> {
        fs::create_dir_all(&dir).await?;
        info!("Avatar storage directory: {}", dir.display());
        Ok(Self {
            dir,
            url_prefix: url_prefix.trim_end_matches('/').to_string(),
        })
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn file_path(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            bail!("Invalid blob key '{}'", key);
        }
        Ok(self.dir.join(key))
    }

    fn key_of<'a>(&self, locator: &'a str) -> Result<&'a str> {
        match locator
            .strip_prefix(self.url_prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
        {
            Some(key) => Ok(key),
            None => bail!("Locator '{}' is not under {}", locator, self.url_prefix),
        }
    }
}

#[async_trait]
impl BlobStore for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> Result<String> {
        let path = self.file_path(key)?;
        let mut file = fs::File::create(&path).await?;
        file.write_all(data).await?;
        file.flush().await?;

        debug!("Stored {} bytes at {}", data.len(), path.display());
        Ok(format!("{}/{}", self.url_prefix, key))
    }

    async fn delete(&self, locator: &str) -> Result<()> {
        let path = self.file_path(self.key_of(locator)?)?;
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
