use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};

/// Per-request cancellation scope.
///
/// The HTTP layer creates one of these per request. Reads the service makes
/// go through [`RequestContext::guard`], so once the token is cancelled or
/// the deadline passes, in-flight calls stop being awaited and the
/// operation returns `Cancelled` / `DeadlineExceeded`. Multi-step writes
/// call [`RequestContext::check`] before they start instead.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    cancel: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            cancel: CancellationToken::new(),
            deadline: Some(Instant::now() + timeout),
        }
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Fails if the request is already cancelled or past its deadline.
    pub fn check(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        match self.deadline {
            Some(at) if Instant::now() >= at => Err(Error::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Await `fut`, giving up early if the request is cancelled or its
    /// deadline fires. Cancellation wins over the deadline, which wins over
    /// a result that happens to be ready at the same time.
    pub async fn guard<T, F>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;

        let deadline = async {
            match self.deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Error::Cancelled),
            _ = deadline => Err(Error::DeadlineExceeded),
            res = fut => res,
        }
    }
}
