use std::path::Path;

use anyhow::Result;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use tokio::time::sleep;
use tracing::{debug, error, info};

const WINDOW_WIDTH: u32 = 1920;
const WINDOW_HEIGHT: u32 = 1080;

/// 启动参数
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub headless: bool,
    /// 不指定则由 chromiumoxide 自动查找
    pub chrome_executable: Option<String>,
}

/// 启动浏览器并打开空白页
pub async fn launch_browser(options: &LaunchOptions) -> Result<(Browser, Page)> {
    if options.headless {
        info!("🚀 启动无头浏览器...");
    } else {
        info!("🚀 启动浏览器（有界面）...");
    }

    let mut builder = BrowserConfig::builder()
        .window_size(WINDOW_WIDTH, WINDOW_HEIGHT)
        .args(vec![
            "--no-sandbox",            // 禁用沙盒，防止权限问题导致的崩溃
            "--disable-gpu",
            "--disable-dev-shm-usage", // 防止共享内存不足
            "--disable-infobars",
            "--disable-extensions",
            "--disable-notifications",
        ]);
    builder = if options.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };
    if let Some(executable) = &options.chrome_executable {
        debug!("浏览器路径: {}", executable);
        builder = builder.chrome_executable(Path::new(executable));
    }

    let config = builder.build().map_err(|e| {
        error!("配置浏览器失败: {}", e);
        anyhow::anyhow!("配置浏览器失败: {}", e)
    })?;

    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动浏览器失败: {}", e);
        anyhow::anyhow!("启动浏览器失败: {}", e)
    })?;
    debug!("浏览器启动成功");

    // 在后台处理浏览器事件
    tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    sleep(tokio::time::Duration::from_millis(300)).await;

    let page = browser.new_page("about:blank").await.map_err(|e| {
        error!("创建页面失败: {}", e);
        anyhow::anyhow!("创建页面失败: {}", e)
    })?;

    Ok((browser, page))
}
