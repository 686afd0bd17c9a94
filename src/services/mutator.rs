//! 校验式字段修改 - 业务能力层
//!
//! 修改下拉框后重新读取，确认页面真的采纳了新值才算成功。
//! 每次尝试都重新定位元素：postback 可能已经把整块 DOM 换掉。

use std::fmt;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, warn};

use crate::infrastructure::{Locator, PageDriver};
use crate::models::ScopedField;
use crate::services::poller::ConditionPoller;
use crate::services::quiescence::QuiescenceDetector;
use crate::utils::{retry, RetryPolicy};

/// 修改策略
#[derive(Debug, Clone)]
pub struct MutatorPolicy {
    pub retry: RetryPolicy,
    /// 定位元素的等待时长
    pub locate_timeout: Duration,
    /// 修改后等待页面静默的时长
    pub idle_timeout: Duration,
    /// 进度指示器（出现后等它消失）
    pub busy_indicator: Option<Locator>,
    pub busy_appear: Duration,
    pub busy_vanish: Duration,
}

/// 单次尝试未成功的原因
#[derive(Debug, Clone)]
pub enum AttemptMiss {
    /// 元素没找到 / 读取失败
    Unreachable(String),
    /// 修改后读回的值不是目标值
    Mismatch { observed: String },
}

impl fmt::Display for AttemptMiss {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptMiss::Unreachable(reason) => write!(f, "{}", reason),
            AttemptMiss::Mismatch { observed } => write!(f, "读回的值为 '{}'", observed),
        }
    }
}

/// 修改失败
#[derive(Debug, Clone, Error)]
#[error("字段 {locator} 未能设置为 '{target}' (已尝试 {attempts} 次): {last_error}")]
pub struct MutationFailed {
    pub locator: String,
    pub target: String,
    pub attempts: usize,
    pub last_error: String,
    /// 最后一次读回的值
    pub last_observed: Option<String>,
}

/// 校验式修改器
#[derive(Debug, Clone)]
pub struct VerifiedMutator {
    poller: ConditionPoller,
    quiescence: QuiescenceDetector,
    policy: MutatorPolicy,
}

impl VerifiedMutator {
    pub fn new(poller: ConditionPoller, policy: MutatorPolicy) -> Self {
        Self {
            poller,
            quiescence: QuiescenceDetector::new(poller),
            policy,
        }
    }

    /// 把 `locator` 指向的下拉框设置为 `target`，成功时返回读回的值
    pub async fn set_field(
        &self,
        driver: &dyn PageDriver,
        locator: &Locator,
        target: &str,
    ) -> Result<String, MutationFailed> {
        self.set_field_with_postback(driver, locator, target, None)
            .await
    }

    /// 在标签所在面板内查找下拉框后设置，协议与 `set_field` 相同
    pub async fn set_field_scoped(
        &self,
        driver: &dyn PageDriver,
        field: &ScopedField,
        target: &str,
    ) -> Result<String, MutationFailed> {
        self.set_field(driver, &field.locator(), target).await
    }

    /// 同 `set_field`，修改后额外触发 `__doPostBack(postback_target)`
    pub async fn set_field_with_postback(
        &self,
        driver: &dyn PageDriver,
        locator: &Locator,
        target: &str,
        postback_target: Option<&str>,
    ) -> Result<String, MutationFailed> {
        let outcome = retry(&self.policy.retry, move |attempt| {
            self.attempt(driver, locator, target, postback_target, attempt)
        })
        .await;

        outcome.map_err(|exhausted| {
            let last_observed = match &exhausted.last_error {
                Some(AttemptMiss::Mismatch { observed }) => Some(observed.clone()),
                _ => None,
            };
            let failure = MutationFailed {
                locator: locator.to_string(),
                target: target.to_string(),
                attempts: exhausted.attempts,
                last_error: exhausted.last_error_text(),
                last_observed,
            };
            warn!("⚠️ {}", failure);
            failure
        })
    }

    async fn attempt(
        &self,
        driver: &dyn PageDriver,
        locator: &Locator,
        target: &str,
        postback_target: Option<&str>,
        attempt: usize,
    ) -> Result<String, AttemptMiss> {
        debug!("设置 {} = '{}' (第 {} 次)", locator, target, attempt);

        self.poller
            .wait_present(driver, locator, self.policy.locate_timeout)
            .await
            .map_err(|e| AttemptMiss::Unreachable(e.to_string()))?;

        // 三种方式依次尝试，任何一种失败都不影响后续
        if let Err(e) = driver.click_option(locator, target).await {
            debug!("点击选项失败: {}", e);
        }
        if let Err(e) = driver.inject_value(locator, target).await {
            debug!("注入值失败: {}", e);
        }
        if let Err(e) = driver.select_option(locator, target).await {
            debug!("按值 / 文本选择失败: {}", e);
        }
        if let Some(target) = postback_target {
            if let Err(e) = driver.postback(target).await {
                debug!("触发 postback 失败: {}", e);
            }
        }

        tokio::time::sleep(self.policy.retry.base_delay).await;
        self.quiescence
            .settle(driver, self.policy.idle_timeout)
            .await;
        self.wait_busy_indicator(driver).await;

        let observed = driver
            .read_value(locator)
            .await
            .map_err(|e| AttemptMiss::Unreachable(e.to_string()))?;

        if observed == target {
            Ok(observed)
        } else {
            Err(AttemptMiss::Mismatch { observed })
        }
    }

    /// 进度指示器若出现，则等它消失；没出现不算错误
    async fn wait_busy_indicator(&self, driver: &dyn PageDriver) {
        let Some(indicator) = &self.policy.busy_indicator else {
            return;
        };
        if self
            .poller
            .wait_present(driver, indicator, self.policy.busy_appear)
            .await
            .is_ok()
        {
            if let Err(e) = self
                .poller
                .wait_invisible(driver, indicator, self.policy.busy_vanish)
                .await
            {
                debug!("进度指示器未消失: {}", e);
            }
        }
    }
}
