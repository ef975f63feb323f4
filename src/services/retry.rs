//! 有限次数重试
//!
//! 重试规则：
//! - 连接失败和超时都会消耗一次尝试机会，等待固定时间后重试
//! - 其他错误（如响应无法解析）不重试，直接返回
//! - 用完所有尝试后返回 [`RemoteCallError::Exhausted`]

use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, timeout};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::RemoteCallError;

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// 最多尝试次数（至少 1 次）
    pub max_attempts: u32,
    /// 两次尝试之间的等待时间
    pub delay: Duration,
    /// 单次尝试的超时时间
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            attempt_timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.retry_attempts, config.retry_delay(), config.llm_timeout())
    }

    /// 执行 `call`，按策略重试
    ///
    /// `label` 只用于日志。
    pub async fn run<T, F, Fut>(&self, label: &str, mut call: F) -> Result<T, RemoteCallError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteCallError>>,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = match timeout(self.attempt_timeout, call()).await {
                Ok(result) => result,
                Err(_) => Err(RemoteCallError::TimedOut {
                    timeout: self.attempt_timeout,
                }),
            };

            let err = match result {
                Ok(value) => {
                    if attempt > 1 {
                        info!("[{}] ✓ 第 {} 次尝试成功", label, attempt);
                    }
                    return Ok(value);
                }
                Err(e) if e.is_retryable() => e,
                Err(e) => {
                    error!("[{}] ❌ 调用失败，不再重试: {}", label, e);
                    return Err(e);
                }
            };

            warn!(
                "[{}] ⚠️ 第 {}/{} 次尝试失败: {}",
                label, attempt, self.max_attempts, err
            );

            if attempt >= self.max_attempts {
                error!("[{}] ❌ 已尝试 {} 次，放弃", label, attempt);
                return Err(RemoteCallError::Exhausted {
                    attempts: attempt,
                    last: Box::new(err),
                });
            }

            info!("[{}] {:?} 后重试...", label, self.delay);
            sleep(self.delay).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_secs(5), Duration::from_secs(60))
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_attempt() {
        let calls = AtomicU32::new(0);

        let result = policy()
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(RemoteCallError::Connection("refused".into()))
                    } else {
                        Ok("notes")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "notes");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausts_after_max_attempts_with_delay_between() {
        let calls = AtomicU32::new(0);
        let stamps = Mutex::new(Vec::new());

        let result: Result<(), _> = policy()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                stamps.lock().unwrap().push(Instant::now());
                async { Err(RemoteCallError::Connection("refused".into())) }
            })
            .await;

        match result {
            Err(RemoteCallError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(matches!(*last, RemoteCallError::Connection(_)));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        let stamps = stamps.lock().unwrap();
        for pair in stamps.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(5));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn rejected_is_not_retried() {
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = policy()
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(RemoteCallError::Rejected("malformed".into())) }
            })
            .await;

        assert!(matches!(result, Err(RemoteCallError::Rejected(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_consumes_an_attempt() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(2, Duration::from_secs(1), Duration::from_secs(10));

        let result: Result<(), _> = policy
            .run("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    sleep(Duration::from_secs(3600)).await;
                    Ok(())
                }
            })
            .await;

        match result {
            Err(RemoteCallError::Exhausted { attempts, last }) => {
                assert_eq!(attempts, 2);
                assert!(matches!(*last, RemoteCallError::TimedOut { .. }));
            }
            other => panic!("expected Exhausted, got {:?}", other),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_then_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_secs(1), Duration::from_secs(10));

        let result = policy
            .run("test", || {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n == 1 {
                        sleep(Duration::from_secs(60)).await;
                    }
                    Ok(n)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[test]
    fn zero_attempts_means_one() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }
}
