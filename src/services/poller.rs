//! 条件轮询 - 业务能力层
//!
//! 系统里所有等待的基础：固定间隔检查条件，直到成立或超时

use std::fmt::{self, Display};
use std::future::Future;
use std::time::Duration;

use tokio::time::{sleep, Instant};

use crate::infrastructure::{Locator, PageDriver};

/// 等待超时
#[derive(Debug, Clone)]
pub struct WaitTimeout {
    pub what: String,
    pub waited: Duration,
    pub last_error: Option<String>,
}

impl fmt::Display for WaitTimeout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "等待超时 ({}ms): {}", self.waited.as_millis(), self.what)?;
        if let Some(e) = &self.last_error {
            write!(f, " (最后错误: {})", e)?;
        }
        Ok(())
    }
}

impl std::error::Error for WaitTimeout {}

/// 条件轮询器
#[derive(Debug, Clone, Copy)]
pub struct ConditionPoller {
    interval: Duration,
}

impl ConditionPoller {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// 等待 `predicate` 返回 `Ok(true)`
    ///
    /// 条件至少检查一次。`predicate` 返回错误视为"尚未成立"，继续轮询；
    /// 超时后返回 `WaitTimeout`，附带最后一次错误。
    pub async fn wait_until<F, Fut, E>(
        &self,
        what: &str,
        timeout: Duration,
        mut predicate: F,
    ) -> Result<(), WaitTimeout>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<bool, E>>,
        E: Display,
    {
        let started = Instant::now();
        let deadline = started + timeout;
        let mut last_error = None;

        loop {
            match predicate().await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => last_error = Some(e.to_string()),
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(WaitTimeout {
                    what: what.to_string(),
                    waited: now - started,
                    last_error,
                });
            }
            sleep(self.interval.min(deadline - now)).await;
        }
    }

    /// 等待元素出现
    pub async fn wait_present(
        &self,
        driver: &dyn PageDriver,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), WaitTimeout> {
        self.wait_until(&format!("元素出现 {}", locator), timeout, move || {
            driver.is_present(locator)
        })
        .await
    }

    /// 等待元素不可见（不存在也算）
    pub async fn wait_invisible(
        &self,
        driver: &dyn PageDriver,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), WaitTimeout> {
        self.wait_until(&format!("元素消失 {}", locator), timeout, move || async move {
            driver.is_visible(locator).await.map(|visible| !visible)
        })
        .await
    }

    /// 等待元素可点击（存在且可见）
    pub async fn wait_clickable(
        &self,
        driver: &dyn PageDriver,
        locator: &Locator,
        timeout: Duration,
    ) -> Result<(), WaitTimeout> {
        self.wait_until(&format!("元素可点击 {}", locator), timeout, move || {
            driver.is_visible(locator)
        })
        .await
    }
}
