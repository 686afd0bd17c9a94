//! 菜单导航 - 业务能力层
//!
//! 登录后依次点击菜单，进入课程评估页

use anyhow::Result;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::config::Timings;
use crate::error::{AppError, AppResult};
use crate::infrastructure::{Locator, PageDriver};
use crate::models::PortalLayout;
use crate::services::poller::ConditionPoller;
use crate::services::quiescence::QuiescenceDetector;
use crate::utils::{retry, RetryPolicy};

/// 每级菜单的点击尝试次数
const MENU_ATTEMPTS: usize = 3;

pub struct MenuNavigator {
    portal: PortalLayout,
    poller: ConditionPoller,
    quiescence: QuiescenceDetector,
    timings: Timings,
}

impl MenuNavigator {
    pub fn new(portal: PortalLayout, timings: Timings) -> Self {
        let poller = ConditionPoller::new(timings.poll_interval);
        Self {
            portal,
            poller,
            quiescence: QuiescenceDetector::new(poller),
            timings,
        }
    }

    /// 进入课程评估页
    ///
    /// 第 k 级菜单点击失败返回 `AppError::Navigation { step: k }`
    pub async fn open_evaluation(&self, driver: &dyn PageDriver) -> AppResult<()> {
        let policy = RetryPolicy::fixed(MENU_ATTEMPTS, self.timings.menu_retry_delay);

        for (index, item) in self.portal.menu_path.iter().enumerate() {
            let step = index + 1;
            retry(&policy, move |attempt| async move {
                debug!("点击第 {} 级菜单 (第 {} 次)", step, attempt);
                self.click_item(driver, item).await
            })
            .await
            .map_err(|exhausted| AppError::Navigation {
                step,
                last_error: exhausted.last_error_text(),
            })?;
            info!("✓ 第 {} 级菜单已点击", step);

            if let Some(pause) = self.timings.menu_pauses.get(index) {
                sleep(*pause).await;
            }
        }

        if let Err(e) = self
            .poller
            .wait_present(driver, &self.portal.landing_marker, self.timings.element_wait)
            .await
        {
            warn!("⚠️ 未检测到评估页标题: {}", e);
        }
        info!("✓ 已进入课程评估页");
        Ok(())
    }

    async fn click_item(&self, driver: &dyn PageDriver, item: &Locator) -> Result<()> {
        self.poller
            .wait_clickable(driver, item, self.timings.element_wait)
            .await?;
        driver.scroll_into_view(item).await?;
        if let Err(e) = driver.click(item).await {
            debug!("原生点击失败，改用 JS 点击: {}", e);
            driver.js_click(item).await?;
        }
        self.quiescence
            .settle(driver, self.timings.mutation_idle)
            .await;
        Ok(())
    }
}
