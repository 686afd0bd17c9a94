//! 页面静默检测 - 业务能力层
//!
//! 点击 / 选择 / postback 之后、读取页面之前，先等 jQuery 和 UpdatePanel 都空闲

use std::time::Duration;

use tracing::debug;

use crate::infrastructure::PageDriver;
use crate::services::poller::{ConditionPoller, WaitTimeout};

/// 静默检测器
///
/// 查询失败（页面没有对应全局对象、脚本报错）一律按空闲处理，
/// 调用方之后总会用别的方式再次校验页面状态。
#[derive(Debug, Clone, Copy)]
pub struct QuiescenceDetector {
    poller: ConditionPoller,
}

impl QuiescenceDetector {
    pub fn new(poller: ConditionPoller) -> Self {
        Self { poller }
    }

    /// 等待页面没有进行中的异步请求
    pub async fn await_idle(
        &self,
        driver: &dyn PageDriver,
        timeout: Duration,
    ) -> Result<(), WaitTimeout> {
        self.poller
            .wait_until("页面异步请求结束", timeout, move || async move {
                match driver.async_activity().await {
                    Ok(activity) => Ok::<_, String>(activity.is_idle()),
                    Err(e) => {
                        debug!("无法读取页面异步状态，按空闲处理: {}", e);
                        Ok(true)
                    }
                }
            })
            .await
    }

    /// 尽力等待空闲，超时只记录日志
    pub async fn settle(&self, driver: &dyn PageDriver, timeout: Duration) -> bool {
        match self.await_idle(driver, timeout).await {
            Ok(()) => true,
            Err(e) => {
                debug!("页面未在时限内静默: {}", e);
                false
            }
        }
    }
}
