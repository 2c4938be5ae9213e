use std::sync::Arc;
use std::time::Duration;

use peakstreak_core::{RequestContext, Service};

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub service: Service,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub request_timeout: Duration,
}

impl AppStateInner {
    /// A fresh context for one request, bounded by the configured timeout.
    pub fn ctx(&self) -> RequestContext {
        RequestContext::with_timeout(self.request_timeout)
    }
}
