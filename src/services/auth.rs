//! 登录服务 - 业务能力层
//!
//! 只负责"把账号密码提交到登录页并确认登录成功"

use anyhow::{anyhow, Result};
use tracing::{debug, info, warn};

use crate::config::Timings;
use crate::error::{AppError, AppResult};
use crate::infrastructure::PageDriver;
use crate::models::PortalLayout;
use crate::services::poller::ConditionPoller;
use crate::utils::{retry, RetryPolicy};

/// 登录尝试次数
const LOGIN_ATTEMPTS: usize = 3;

pub struct Authenticator {
    portal: PortalLayout,
    login_url: String,
    poller: ConditionPoller,
    timings: Timings,
}

impl Authenticator {
    pub fn new(portal: PortalLayout, login_url: impl Into<String>, timings: Timings) -> Self {
        Self {
            portal,
            login_url: login_url.into(),
            poller: ConditionPoller::new(timings.poll_interval),
            timings,
        }
    }

    /// 登录，失败时按固定间隔重试
    ///
    /// # 参数
    /// - `driver`: 页面驱动
    /// - `user_id` / `password`: 登录凭据
    ///
    /// # 返回
    /// 重试用尽时返回 `AppError::LoginFailed`
    pub async fn login(
        &self,
        driver: &dyn PageDriver,
        user_id: &str,
        password: &str,
    ) -> AppResult<()> {
        let policy = RetryPolicy::fixed(LOGIN_ATTEMPTS, self.timings.login_retry_delay);

        retry(&policy, move |attempt| async move {
            info!("🔐 登录尝试 {}/{}", attempt, LOGIN_ATTEMPTS);
            let outcome = self.attempt(driver, user_id, password).await;
            if let Err(e) = &outcome {
                warn!("⚠️ 登录尝试 {} 失败: {}", attempt, e);
            }
            outcome
        })
        .await
        .map_err(|exhausted| AppError::LoginFailed {
            attempts: exhausted.attempts,
            last_error: exhausted.last_error_text(),
        })?;

        info!("✓ 登录成功");
        Ok(())
    }

    async fn attempt(&self, driver: &dyn PageDriver, user_id: &str, password: &str) -> Result<()> {
        driver.navigate(&self.login_url).await?;
        self.poller
            .wait_present(driver, &self.portal.username_input, self.timings.element_wait)
            .await?;

        driver.type_text(&self.portal.username_input, user_id).await?;
        driver.type_text(&self.portal.password_input, password).await?;
        driver.click(&self.portal.login_button).await?;

        // 离开登录页，或用户名输入框消失，都算登录成功
        self.poller
            .wait_until("离开登录页", self.timings.element_wait, move || async move {
                let url = driver.current_url().await?;
                if url != self.login_url {
                    debug!("当前页面: {}", url);
                    return Ok(true);
                }
                driver
                    .is_visible(&self.portal.username_input)
                    .await
                    .map(|visible| !visible)
            })
            .await
            .map_err(|e| anyhow!("登录后仍停留在登录页: {}", e))
    }
}
