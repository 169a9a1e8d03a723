use crate::repository::RepositoryError;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// リトライ設定
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// 最大試行回数（初回を含む）
    pub max_attempts: u32,
    /// 初期待機時間（ミリ秒）
    pub initial_delay_ms: u64,
    /// 指数バックオフの倍率
    pub backoff_multiplier: f64,
    /// 最大待機時間（ミリ秒）
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay_ms: 100,
            backoff_multiplier: 2.0,
            max_delay_ms: 5000,
        }
    }
}

impl RetryConfig {
    /// `attempt` 回目の失敗後に待つ時間
    fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self.backoff_multiplier.powi(attempt.saturating_sub(1) as i32);
        let delay_ms = (self.initial_delay_ms as f64 * factor).min(self.max_delay_ms as f64);
        Duration::from_millis(delay_ms as u64)
    }
}

/// ストア呼び出しを再試行付きで実行する
///
/// `RepositoryError::Transient` だけを再試行し、それ以外は即座に返す。
pub async fn retry_store_operation<F, Fut, T>(
    operation: F,
    config: &RetryConfig,
) -> Result<T, RepositoryError>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, RepositoryError>>,
{
    let mut attempt = 1;
    loop {
        let error = match operation().await {
            Ok(value) => return Ok(value),
            Err(error) => error,
        };

        if !error.is_retryable() || attempt >= config.max_attempts {
            debug!(attempt, %error, "store operation failed");
            return Err(error);
        }

        let delay = config.delay_after(attempt);
        warn!(attempt, delay_ms = delay.as_millis() as u64, %error, "retrying store operation");
        sleep(delay).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay_ms: 1,
            backoff_multiplier: 2.0,
            max_delay_ms: 4,
        }
    }

    #[test]
    fn test_delay_grows_and_is_capped() {
        let config = fast();
        assert_eq!(config.delay_after(1), Duration::from_millis(1));
        assert_eq!(config.delay_after(2), Duration::from_millis(2));
        assert_eq!(config.delay_after(3), Duration::from_millis(4));
        assert_eq!(config.delay_after(10), Duration::from_millis(4));
    }

    #[tokio::test]
    async fn test_transient_error_is_retried() {
        let counter = Arc::new(AtomicU32::new(0));

        let result = retry_store_operation(
            || {
                let counter = counter.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(RepositoryError::Transient("throttled".to_string()))
                    } else {
                        Ok(42)
                    }
                }
            },
            &fast(),
        )
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_attempts() {
        let counter = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry_store_operation(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RepositoryError::Transient("still throttled".to_string()))
                }
            },
            &fast(),
        )
        .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let counter = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = retry_store_operation(
            || {
                let counter = counter.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(RepositoryError::DynamoDb("ResourceNotFoundException".to_string()))
                }
            },
            &fast(),
        )
        .await;

        assert_eq!(
            result,
            Err(RepositoryError::DynamoDb("ResourceNotFoundException".to_string()))
        );
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
