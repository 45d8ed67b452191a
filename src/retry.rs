use crate::config::RetrySettings;
use anyhow::Result;
use std::time::Duration;
use tokio::time::sleep;
use tracing::warn;

/// Backoff for establishing node connections. Queries and broadcasts are never retried.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryConfig {
    fn from(settings: &RetrySettings) -> Self {
        Self::new(
            settings.max_attempts,
            Duration::from_secs(settings.base_delay_seconds),
            Duration::from_secs(settings.max_delay_seconds),
            settings.backoff_multiplier,
        )
    }
}

impl RetryConfig {
    pub fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration, backoff_multiplier: f64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            backoff_multiplier,
        }
    }
}

pub async fn execute_with_retry<F, Fut, T, E>(
    operation: F,
    retry_config: &RetryConfig,
    operation_name: &str,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: std::future::Future<Output = Result<T, E>> + Send,
    E: std::fmt::Display + Send + Sync + 'static,
{
    let mut last_error = String::new();

    for attempt in 1..=retry_config.max_attempts {
        match operation().await {
            Ok(result) => {
                if attempt > 1 {
                    println!("✅ {} succeeded on attempt {}", operation_name, attempt);
                }
                return Ok(result);
            }
            Err(e) => {
                last_error = e.to_string();
                warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts = retry_config.max_attempts,
                    error = %last_error,
                    "attempt failed"
                );

                if attempt < retry_config.max_attempts {
                    let delay = calculate_delay(attempt, retry_config);
                    println!("⏳ {} failed, retrying in {:?}...", operation_name, delay);
                    sleep(delay).await;
                }
            }
        }
    }

    Err(anyhow::anyhow!(
        "{} failed after {} attempts. Last error: {}",
        operation_name,
        retry_config.max_attempts,
        last_error
    ))
}

fn calculate_delay(attempt: u32, config: &RetryConfig) -> Duration {
    let exponential_delay =
        config.base_delay.as_secs_f64() * config.backoff_multiplier.powi((attempt - 1) as i32);

    let delay_seconds = exponential_delay.min(config.max_delay.as_secs_f64());
    Duration::from_secs_f64(delay_seconds.max(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn test_retry_success_on_first_attempt() {
        let config = RetryConfig::default();
        let call_count = AtomicU32::new(0);

        let result = execute_with_retry(
            || {
                let count = call_count.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count == 0 {
                        Ok("connected")
                    } else {
                        Err("unexpected call")
                    }
                }
            },
            &config,
            "gRPC connection",
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retry_success_on_second_attempt() {
        let config = RetryConfig::new(3, Duration::from_millis(10), Duration::from_secs(1), 2.0);
        let call_count = AtomicU32::new(0);

        let result = execute_with_retry(
            || {
                let count = call_count.fetch_add(1, Ordering::SeqCst);
                async move {
                    if count == 0 {
                        Err("connection refused")
                    } else {
                        Ok("connected")
                    }
                }
            },
            &config,
            "gRPC connection",
        )
        .await;

        assert_eq!(result.unwrap(), "connected");
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_failure_after_max_attempts() {
        let config = RetryConfig::new(2, Duration::from_millis(10), Duration::from_secs(1), 2.0);
        let call_count = AtomicU32::new(0);

        let result = execute_with_retry(
            || {
                call_count.fetch_add(1, Ordering::SeqCst);
                async move { Err::<&str, anyhow::Error>(anyhow::anyhow!("connection refused")) }
            },
            &config,
            "gRPC connection",
        )
        .await;

        let err = result.unwrap_err().to_string();
        assert!(err.contains("after 2 attempts"));
        assert!(err.contains("connection refused"));
        assert_eq!(call_count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_delay_is_capped() {
        let config = RetryConfig::new(5, Duration::from_secs(2), Duration::from_secs(5), 2.0);
        assert_eq!(calculate_delay(1, &config), Duration::from_secs(2));
        assert_eq!(calculate_delay(2, &config), Duration::from_secs(4));
        assert_eq!(calculate_delay(3, &config), Duration::from_secs(5));
    }
}
