use serde::Deserialize;
use std::{fmt::Display, future::Future, time::Duration};
use tokio::time::sleep;
use tracing::warn;

/// Indicates whether an error should be retried or treated as fatal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDisposition {
    Retry,
    Stop,
}

/// Result of running an operation under the retry policy.
#[derive(Debug)]
pub enum RetryError<E> {
    /// The error was considered fatal and should bubble up immediately.
    Fatal(E),
    /// The error was retryable, but the configured attempts were exhausted.
    AttemptsExceeded(E),
}

impl<E> RetryError<E> {
    /// The last error the operation produced.
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Fatal(err) | RetryError::AttemptsExceeded(err) => err,
        }
    }

    pub fn inner(&self) -> &E {
        match self {
            RetryError::Fatal(err) | RetryError::AttemptsExceeded(err) => err,
        }
    }
}

impl<E: Display> Display for RetryError<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RetryError::Fatal(err) => write!(f, "{err}"),
            RetryError::AttemptsExceeded(err) => write!(f, "{err} (retries exhausted)"),
        }
    }
}

impl<E: std::error::Error + 'static> std::error::Error for RetryError<E> {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner())
    }
}

/// Fixed-interval retry: up to `max_attempts` tries with the same pause
/// between consecutive tries and no pause after the last one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(3),
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Executes the operation with the configured retry policy. Every call
    /// gets its own attempt budget.
    pub async fn run<F, Fut, T, E, Classifier>(
        &self,
        mut op: F,
        classify: Classifier,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        Classifier: Fn(&E) -> RetryDisposition,
    {
        let mut attempt = 0;

        loop {
            match op().await {
                Ok(result) => return Ok(result),
                Err(err) => match classify(&err) {
                    RetryDisposition::Stop => return Err(RetryError::Fatal(err)),
                    RetryDisposition::Retry => {
                        attempt += 1;
                        if attempt >= self.max_attempts {
                            return Err(RetryError::AttemptsExceeded(err));
                        }

                        warn!(
                            attempt,
                            max_attempts = self.max_attempts,
                            error = %err,
                            "Attempt failed, retrying in {:?}",
                            self.delay
                        );
                        sleep(self.delay).await;
                    }
                },
            }
        }
    }
}

/// On-disk form of a retry policy: `{ "attempts": 5, "delayMs": 3000 }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RetrySettings {
    pub attempts: usize,
    pub delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        RetrySettings {
            attempts: 5,
            delay_ms: 3000,
        }
    }
}

impl From<RetrySettings> for RetryPolicy {
    fn from(settings: RetrySettings) -> Self {
        RetryPolicy::new(settings.attempts, Duration::from_millis(settings.delay_ms))
    }
}
