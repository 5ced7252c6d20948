use std::future::Future;
use std::time::Duration;

use storage::repository::StorageError;

/// Upper bound on how long any single backend call may take.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    timeout: Duration,
}

impl CallPolicy {
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Await `fut`, turning an elapsed deadline into a connection error.
    ///
    /// # Errors
    ///
    /// Returns the call's own `StorageError`, or
    /// `StorageError::Connection("timed out")` when the deadline passes.
    pub async fn run<T, F>(&self, call: &'static str, fut: F) -> Result<T, StorageError>
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        if let Ok(result) = tokio::time::timeout(self.timeout, fut).await {
            result
        } else {
            tracing::warn!(
                call,
                timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
                "backend call timed out"
            );
            Err(StorageError::Connection("timed out".into()))
        }
    }

    /// Like [`CallPolicy::run`] but yields `fallback` on any failure.
    pub async fn run_or<T, F>(&self, call: &'static str, fut: F, fallback: T) -> T
    where
        F: Future<Output = Result<T, StorageError>>,
    {
        match self.run(call, fut).await {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(call, error = %err, "backend call failed, using fallback");
                fallback
            }
        }
    }
}

impl Default for CallPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_TIMEOUT)
    }
}
