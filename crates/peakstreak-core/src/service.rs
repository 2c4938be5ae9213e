use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, Utc};

use crate::gateway::Gateway;
use crate::storage::BlobStore;

/// Tunables that shape reads but carry no correctness weight.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// How many days of logs the profile, leaderboard and explore views load.
    pub profile_window_days: u64,
    /// Window used by the single-habit detail view.
    pub detail_window_days: u64,
    /// Largest accepted avatar upload.
    pub max_avatar_bytes: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            profile_window_days: 90,
            detail_window_days: 30,
            max_avatar_bytes: 2 * 1024 * 1024,
        }
    }
}

type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Entry point for every operation the HTTP layer exposes.
///
/// Cheap to clone; all collaborators are shared.
#[derive(Clone)]
pub struct Service {
    pub(crate) gateway: Arc<dyn Gateway>,
    pub(crate) blobs: Arc<dyn BlobStore>,
    pub(crate) config: ServiceConfig,
    clock: Clock,
}

impl Service {
    pub fn new(gateway: Arc<dyn Gateway>, blobs: Arc<dyn BlobStore>, config: ServiceConfig) -> Self {
        Self {
            gateway,
            blobs,
            config,
            clock: Arc::new(Utc::now),
        }
    }

    /// Replaces the wall clock used for new timestamps and read windows.
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub(crate) fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Inclusive `[today - days, today]`.
    pub(crate) fn window(&self, days: u64) -> (NaiveDate, NaiveDate) {
        let today = self.now().date_naive();
        let start = today.checked_sub_days(Days::new(days)).unwrap_or(NaiveDate::MIN);
        (start, today)
    }
}
