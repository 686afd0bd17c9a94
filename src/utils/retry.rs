//! 有界重试组合子
//!
//! 所有"失败就等一会儿再试"的地方都走这里：字段修改校验、登录、菜单点击

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::debug;

/// 退避方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// 每次等待 `base_delay`
    Fixed,
    /// 第 n 次失败后等待 `base_delay * n`
    Linear,
}

/// 重试策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn linear(max_attempts: usize, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay,
            backoff: Backoff::Linear,
        }
    }

    /// 第 `attempt` 次（从 1 开始）失败后的等待时长
    pub fn delay_after(&self, attempt: usize) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.base_delay,
            Backoff::Linear => self.base_delay * attempt.max(1) as u32,
        }
    }
}

/// 重试耗尽
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub attempts: usize,
    pub last_error: Option<E>,
}

impl<E: std::fmt::Display> RetryExhausted<E> {
    /// 最后一次错误的文本，没有则为空串
    pub fn last_error_text(&self) -> String {
        self.last_error
            .as_ref()
            .map(|e| e.to_string())
            .unwrap_or_default()
    }
}

/// 按策略执行 `op`，直到成功或次数用尽
///
/// `op` 收到当前尝试序号（从 1 开始）。最后一次失败后不再等待。
///
/// # 参数
/// - `policy`: 次数和退避方式
/// - `op`: 单次尝试
///
/// # 返回
/// 第一次成功的结果；全部失败时返回次数和最后一次错误
pub async fn retry<T, E, F, Fut>(policy: &RetryPolicy, mut op: F) -> Result<T, RetryExhausted<E>>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut last_error = None;

    for attempt in 1..=policy.max_attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(e) => {
                debug!("第 {}/{} 次尝试失败: {}", attempt, policy.max_attempts, e);
                last_error = Some(e);
            }
        }

        if attempt < policy.max_attempts {
            sleep(policy.delay_after(attempt)).await;
        }
    }

    Err(RetryExhausted {
        attempts: policy.max_attempts,
        last_error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use tokio::time::Instant;

    #[test]
    fn test_delay_schedule() {
        let linear = RetryPolicy::linear(5, Duration::from_millis(500));
        assert_eq!(linear.delay_after(1), Duration::from_millis(500));
        assert_eq!(linear.delay_after(3), Duration::from_millis(1500));

        let fixed = RetryPolicy::fixed(5, Duration::from_millis(600));
        assert_eq!(fixed.delay_after(4), Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::linear(5, Duration::from_millis(1));

        let result: Result<usize, RetryExhausted<String>> = retry(&policy, |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt < 3 {
                    Err(format!("attempt {}", attempt))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 3);
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhaustion_keeps_last_error() {
        let calls = Cell::new(0);
        let policy = RetryPolicy::fixed(4, Duration::from_millis(1));

        let result: Result<(), RetryExhausted<String>> = retry(&policy, |attempt| {
            calls.set(calls.get() + 1);
            async move { Err(format!("boom {}", attempt)) }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.attempts, 4);
        assert_eq!(err.last_error_text(), "boom 4");
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn test_no_sleep_after_last_attempt() {
        let policy = RetryPolicy::fixed(1, Duration::from_secs(30));
        let started = Instant::now();

        let result: Result<(), RetryExhausted<&str>> =
            retry(&policy, |_| async { Err("nope") }).await;

        assert!(result.is_err());
        assert!(started.elapsed() < Duration::from_secs(1));
    }
}
