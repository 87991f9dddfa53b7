use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use observability::{AttemptOutcome, MetricsSink, NoopSink};
use tracing::{debug, error, info, warn};

use super::classify::{Classification, DatabaseErrorClassifier, ErrorClassifier};
use super::error::DatabaseError;

#[cfg(feature = "config")]
use core_config::{env_parse, invalid_value, ConfigError, FromEnv};

/// Backoff policy for persistence operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of attempts, the first one included (at least 1)
    pub max_attempts: u32,

    /// Delay after the first failed attempt
    pub base_delay: Duration,

    /// Upper bound for any single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Create a policy with the defaults (3 attempts, 100ms base, 2s cap)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Delay to wait after failed attempt number `attempt` (1-based):
    /// `min(base_delay * 2^(attempt - 1), max_delay)`.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1);
        2u32.checked_pow(exponent)
            .and_then(|factor| self.base_delay.checked_mul(factor))
            .map_or(self.max_delay, |delay| delay.min(self.max_delay))
    }

    fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(2),
        }
    }
}

/// Load RetryPolicy from environment variables
///
/// - `DB_RETRY_MAX_ATTEMPTS` (default: 3, must be at least 1)
/// - `DB_RETRY_BASE_DELAY_MS` (default: 100)
/// - `DB_RETRY_MAX_DELAY_MS` (default: 2000)
#[cfg(feature = "config")]
impl FromEnv for RetryPolicy {
    fn from_env() -> Result<Self, ConfigError> {
        let max_attempts: u32 = env_parse("DB_RETRY_MAX_ATTEMPTS", "3")?;
        if max_attempts == 0 {
            return Err(invalid_value("DB_RETRY_MAX_ATTEMPTS", "must be at least 1"));
        }

        let base_delay_ms: u64 = env_parse("DB_RETRY_BASE_DELAY_MS", "100")?;
        let max_delay_ms: u64 = env_parse("DB_RETRY_MAX_DELAY_MS", "2000")?;

        Ok(Self {
            max_attempts,
            base_delay: Duration::from_millis(base_delay_ms),
            max_delay: Duration::from_millis(max_delay_ms),
        })
    }
}

/// Failure returned by [`RetryExecutor::execute`]
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The classifier marked the failure terminal; no further attempts were made
    #[error("{0}")]
    Terminal(E),

    /// Every attempt failed with a retryable error
    #[error("operation '{operation}' failed after {attempts} attempts: {last_error}")]
    Exhausted {
        operation: String,
        attempts: u32,
        last_error: E,
    },
}

impl<E> RetryError<E> {
    /// The underlying failure, discarding retry context
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Terminal(err) => err,
            RetryError::Exhausted { last_error, .. } => last_error,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RetryError::Terminal(_))
    }
}

impl From<RetryError<DatabaseError>> for DatabaseError {
    fn from(err: RetryError<DatabaseError>) -> Self {
        match err {
            RetryError::Terminal(err) => err,
            RetryError::Exhausted {
                operation,
                attempts,
                last_error,
            } => DatabaseError::RetriesExhausted {
                operation,
                attempts,
                last_error: Box::new(last_error),
            },
        }
    }
}

/// Runs operations under a [`RetryPolicy`], short-circuiting on terminal errors.
///
/// Backoff uses `tokio::time::sleep`, which suspends only the calling task.
/// A retry sequence is not cancelled by the caller; dropping the returned
/// future is the only way to stop it early.
///
/// # Example
/// ```ignore
/// use database::common::{RetryExecutor, RetryPolicy};
///
/// let executor = RetryExecutor::default();
/// let user = executor
///     .execute("find_user_by_id", &RetryPolicy::default(), || store.find(id))
///     .await?;
/// ```
#[derive(Clone)]
pub struct RetryExecutor<C = DatabaseErrorClassifier> {
    classifier: C,
    sink: Arc<dyn MetricsSink>,
}

impl<C> RetryExecutor<C> {
    pub fn new(classifier: C, sink: Arc<dyn MetricsSink>) -> Self {
        Self { classifier, sink }
    }

    pub fn sink(&self) -> &Arc<dyn MetricsSink> {
        &self.sink
    }

    pub async fn execute<T, E, F, Fut>(
        &self,
        operation: &str,
        policy: &RetryPolicy,
        mut operation_fn: F,
    ) -> Result<T, RetryError<E>>
    where
        C: ErrorClassifier<E>,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: fmt::Display,
    {
        let max_attempts = policy.attempts();
        let started = Instant::now();
        let mut attempt = 1;

        loop {
            match operation_fn().await {
                Ok(value) => {
                    self.sink
                        .record_attempt(operation, attempt, AttemptOutcome::Success);
                    if attempt > 1 {
                        info!(
                            operation,
                            attempt,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(err) => match self.classifier.classify(&err) {
                    Classification::Terminal => {
                        self.sink
                            .record_attempt(operation, attempt, AttemptOutcome::Terminal);
                        debug!(operation, attempt, error = %err, "Terminal failure, not retrying");
                        return Err(RetryError::Terminal(err));
                    }
                    Classification::Retryable => {
                        self.sink
                            .record_attempt(operation, attempt, AttemptOutcome::Retryable);

                        if attempt >= max_attempts {
                            error!(
                                operation,
                                attempts = attempt,
                                error = %err,
                                "Operation failed after exhausting retries"
                            );
                            return Err(RetryError::Exhausted {
                                operation: operation.to_string(),
                                attempts: attempt,
                                last_error: err,
                            });
                        }

                        let delay = policy.backoff_delay(attempt);
                        warn!(
                            operation,
                            attempt,
                            max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Operation failed, retrying"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }
}

impl Default for RetryExecutor<DatabaseErrorClassifier> {
    fn default() -> Self {
        Self::new(DatabaseErrorClassifier, Arc::new(NoopSink))
    }
}

impl<C: fmt::Debug> fmt::Debug for RetryExecutor<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Default)]
    struct RecordingSink {
        attempts: Mutex<Vec<(String, u32, AttemptOutcome)>>,
    }

    impl MetricsSink for RecordingSink {
        fn record_attempt(&self, operation: &str, attempt: u32, outcome: AttemptOutcome) {
            self.attempts
                .lock()
                .unwrap()
                .push((operation.to_string(), attempt, outcome));
        }

        fn record_latency(&self, _operation: &str, _duration: Duration) {}

        fn record_health_status(&self, _component: &str, _healthy: bool) {}
    }

    fn transient() -> DatabaseError {
        DatabaseError::ConnectionFailed("connection reset".to_string())
    }

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy::new()
            .with_max_attempts(max_attempts)
            .with_base_delay(Duration::from_millis(1))
            .with_max_delay(Duration::from_millis(5))
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_backoff_schedule_doubles_then_caps() {
        let policy = RetryPolicy::default();
        let delays: Vec<u64> = (1..=7)
            .map(|attempt| policy.backoff_delay(attempt).as_millis() as u64)
            .collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1600, 2000, 2000]);
    }

    #[test]
    fn test_backoff_does_not_overflow() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(64), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(u32::MAX), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_success_first_attempt() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let sink = Arc::new(RecordingSink::default());
        let executor = RetryExecutor::new(DatabaseErrorClassifier, sink.clone());

        let result = executor
            .execute("get_all_users", &fast_policy(3), || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, DatabaseError>("ok")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(
            *sink.attempts.lock().unwrap(),
            vec![("get_all_users".to_string(), 1, AttemptOutcome::Success)]
        );
    }

    #[tokio::test]
    async fn test_success_after_transient_failures() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let sink = Arc::new(RecordingSink::default());
        let executor = RetryExecutor::new(DatabaseErrorClassifier, sink.clone());

        let result = executor
            .execute("update_user", &fast_policy(3), || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(transient())
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        let outcomes: Vec<AttemptOutcome> =
            sink.attempts.lock().unwrap().iter().map(|(_, _, o)| *o).collect();
        assert_eq!(
            outcomes,
            vec![
                AttemptOutcome::Retryable,
                AttemptOutcome::Retryable,
                AttemptOutcome::Success
            ]
        );
    }

    #[tokio::test]
    async fn test_terminal_error_invokes_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let executor = RetryExecutor::default();

        let result: Result<(), _> = executor
            .execute("find_user_by_id", &fast_policy(10), || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(DatabaseError::NotFound("user 9".to_string()))
                }
            })
            .await;

        let err = result.unwrap_err();
        assert!(err.is_terminal());
        assert!(matches!(err.into_inner(), DatabaseError::NotFound(_)));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_exhaustion_invokes_max_attempts_times() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let executor = RetryExecutor::default();

        let result: Result<(), _> = executor
            .execute("create_user", &fast_policy(4), || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(transient())
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 4);
        let err = result.unwrap_err();
        assert!(!err.is_terminal());
        let message = err.to_string();
        assert!(message.contains("'create_user'"));
        assert!(message.contains("4 attempts"));
        assert!(message.contains("connection reset"));
    }

    #[tokio::test]
    async fn test_zero_max_attempts_still_runs_once() {
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();
        let executor = RetryExecutor::default();

        let _ = executor
            .execute("delete_user", &fast_policy(0), || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(transient())
                }
            })
            .await;

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_follow_backoff_schedule() {
        let executor = RetryExecutor::default();
        let started = tokio::time::Instant::now();

        let result: Result<(), _> = executor
            .execute("get_all_users", &RetryPolicy::default(), || async {
                Err(transient())
            })
            .await;

        assert!(result.is_err());
        // 100ms after attempt 1, 200ms after attempt 2, nothing after the last.
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(310), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_error_does_not_sleep() {
        let executor = RetryExecutor::default();
        let started = tokio::time::Instant::now();

        let _: Result<(), _> = executor
            .execute("create_user", &RetryPolicy::default(), || async {
                Err(DatabaseError::UniqueViolation("users_email_key".to_string()))
            })
            .await;

        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[test]
    fn test_retry_error_messages() {
        let exhausted: Box<dyn std::error::Error> = Box::new(RetryError::Exhausted {
            operation: "get_all_users".to_string(),
            attempts: 3,
            last_error: transient(),
        });
        let message = exhausted.to_string();
        assert!(message.starts_with("operation 'get_all_users' failed after 3 attempts: "));
        assert!(message.ends_with(&transient().to_string()));

        let terminal = RetryError::Terminal(DatabaseError::NotFound("user id=9".into()));
        assert_eq!(
            terminal.to_string(),
            DatabaseError::NotFound("user id=9".into()).to_string()
        );
    }

    #[test]
    fn test_exhausted_converts_to_database_error() {
        let err: DatabaseError = RetryError::Exhausted {
            operation: "find_user_by_email".to_string(),
            attempts: 3,
            last_error: transient(),
        }
        .into();

        assert!(matches!(
            err,
            DatabaseError::RetriesExhausted { attempts: 3, .. }
        ));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_policy_from_env_defaults() {
        temp_env::with_vars(
            [
                ("DB_RETRY_MAX_ATTEMPTS", None::<&str>),
                ("DB_RETRY_BASE_DELAY_MS", None),
                ("DB_RETRY_MAX_DELAY_MS", None),
            ],
            || {
                let policy = RetryPolicy::from_env().unwrap();
                assert_eq!(policy, RetryPolicy::default());
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_policy_from_env_rejects_zero_attempts() {
        temp_env::with_var("DB_RETRY_MAX_ATTEMPTS", Some("0"), || {
            let err = RetryPolicy::from_env().unwrap_err();
            assert!(err.to_string().contains("DB_RETRY_MAX_ATTEMPTS"));
        });
    }
}
