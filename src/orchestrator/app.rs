//! 应用生命周期 - 编排层
//!
//! 启动 / 连接浏览器 → 登录 → 进入评估页 → 批量处理 → 关闭浏览器。
//! 只有这里持有 `Browser`；登录和导航失败会中止整轮运行。

use std::sync::Arc;

use chromiumoxide::Browser;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::browser::{self, LaunchOptions};
use crate::config::Config;
use crate::error::{AppResult, BrowserError};
use crate::infrastructure::{ChromeDriver, JsExecutor};
use crate::models::PortalLayout;
use crate::orchestrator::course_batch::{BatchOutcome, CourseBatch};
use crate::services::{Authenticator, JsonResultWriter, MenuNavigator};
use crate::utils::logging;
use crate::workflow::TracingObserver;

/// 应用主结构
pub struct App {
    config: Config,
    browser: Browser,
    driver: ChromeDriver,
    /// 浏览器是否由本程序启动（连接的浏览器退出时不关闭）
    launched: bool,
}

impl App {
    /// 初始化应用：准备浏览器和页面
    pub async fn initialize(config: Config) -> AppResult<Self> {
        logging::log_startup(
            &config.user_id,
            config.headless,
            config.max_rounds,
            config.extra_attempts,
        );

        let (browser, page, launched) = match config.browser_debug_port {
            Some(port) => {
                let (browser, page) = browser::connect_to_browser_and_page(port)
                    .await
                    .map_err(|e| BrowserError::ConnectionFailed {
                        port,
                        message: format!("{:#}", e),
                    })?;
                (browser, page, false)
            }
            None => {
                let options = LaunchOptions {
                    headless: config.headless,
                    chrome_executable: config.chrome_executable.clone(),
                };
                let (browser, page) = browser::launch_browser(&options)
                    .await
                    .map_err(|e| BrowserError::LaunchFailed(format!("{:#}", e)))?;
                (browser, page, true)
            }
        };

        Ok(Self {
            config,
            browser,
            driver: ChromeDriver::new(JsExecutor::new(page)),
            launched,
        })
    }

    /// 运行应用主逻辑
    pub async fn run(&self) -> AppResult<BatchOutcome> {
        let timings = &self.config.timings;

        Authenticator::new(
            PortalLayout::default(),
            self.config.login_url.clone(),
            timings.clone(),
        )
        .login(&self.driver, &self.config.user_id, &self.config.password)
        .await?;

        MenuNavigator::new(PortalLayout::default(), timings.clone())
            .open_evaluation(&self.driver)
            .await?;

        let batch = CourseBatch::new(
            &self.config,
            Arc::new(JsonResultWriter::new(&self.config.results_path)),
            Arc::new(TracingObserver::new(self.config.results_path.clone())),
        );
        let outcome = batch.run(&self.driver).await;

        if outcome.completed {
            info!("🎉 评估状态: Completed!");
        } else {
            warn!("⚠️ 评估状态未在时限内变为 Completed!");
        }
        Ok(outcome)
    }

    /// 收尾：有界面时停留片刻，关闭自己启动的浏览器
    pub async fn shutdown(mut self) {
        if !self.config.headless {
            info!(
                "浏览器将在 {} 秒后关闭",
                self.config.timings.linger.as_secs()
            );
            sleep(self.config.timings.linger).await;
        }

        if self.launched {
            if let Err(e) = self.browser.close().await {
                warn!("⚠️ 关闭浏览器失败: {}", e);
            }
        }
    }
}
