//! 课程评估表单 - 业务能力层
//!
//! 只负责"读 / 写评估页上的某一块"，不关心处理顺序

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::Timings;
use crate::error::{DomError, DomResult};
use crate::infrastructure::{Locator, PageDriver};
use crate::models::{Course, EvaluationLayout, EvaluationStatus};
use crate::services::poller::{ConditionPoller, WaitTimeout};
use crate::services::quiescence::QuiescenceDetector;

/// 标签内容是否为占位（空，或只有下划线和空白）
pub fn is_placeholder(text: &str) -> bool {
    text.chars().all(|c| c == '_' || c.is_whitespace())
}

/// 提示信息是否在要求选择预期成绩
pub fn message_requests_grade(message: &str) -> bool {
    let lower = message.to_lowercase();
    lower.contains("expected") && lower.contains("grade")
}

/// 评估表单服务
///
/// - 不持有 page，每次调用传入 `PageDriver`
/// - 每次读取都按定位器重新查找元素
pub struct EvaluationForm {
    layout: EvaluationLayout,
    poller: ConditionPoller,
    quiescence: QuiescenceDetector,
    timings: Timings,
}

impl EvaluationForm {
    pub fn new(layout: EvaluationLayout, timings: Timings) -> Self {
        let poller = ConditionPoller::new(timings.poll_interval);
        Self {
            layout,
            poller,
            quiescence: QuiescenceDetector::new(poller),
            timings,
        }
    }

    pub fn layout(&self) -> &EvaluationLayout {
        &self.layout
    }

    /// 读取课程下拉框中所有真实课程（排除占位选项，按 value 去重）
    pub async fn snapshot_courses(&self, driver: &dyn PageDriver) -> DomResult<Vec<Course>> {
        if let Err(e) = self
            .poller
            .wait_present(driver, &self.layout.course_select, self.timings.element_wait)
            .await
        {
            warn!("⚠️ 课程下拉框未出现: {}", e);
        }

        let options = driver.list_options(&self.layout.course_select).await?;
        let mut courses: Vec<Course> = Vec::with_capacity(options.len());
        for option in options {
            if self.layout.is_sentinel(&option.value) {
                continue;
            }
            if courses.iter().any(|c| c.value == option.value) {
                continue;
            }
            courses.push(Course::from(option));
        }
        debug!("课程快照: {} 门", courses.len());
        Ok(courses)
    }

    /// 读取整体评估状态（用于报告），读取失败视为空状态
    pub async fn read_status(&self, driver: &dyn PageDriver) -> EvaluationStatus {
        match self.try_read_status(driver).await {
            Ok(status) => status,
            Err(e) => {
                debug!("读取评估状态失败: {}", e);
                EvaluationStatus::Other(String::new())
            }
        }
    }

    async fn try_read_status(&self, driver: &dyn PageDriver) -> DomResult<EvaluationStatus> {
        let text = driver.read_text(&self.layout.status_label).await?;
        Ok(EvaluationStatus::from_label(&text))
    }

    /// 等待状态不再是 `Pending!`
    ///
    /// 状态标签读不到时继续等待，不算离开 `Pending!`
    ///
    /// # 返回
    /// 超时前等到返回 `true`
    pub async fn wait_not_pending(&self, driver: &dyn PageDriver, timeout: Duration) -> bool {
        self.poller
            .wait_until("评估状态离开 Pending!", timeout, move || async move {
                Ok::<_, DomError>(!self.try_read_status(driver).await?.is_pending())
            })
            .await
            .is_ok()
    }

    /// 等待状态变为 `Completed!`，返回是否等到
    pub async fn wait_completed(&self, driver: &dyn PageDriver, timeout: Duration) -> bool {
        self.poller
            .wait_until("评估状态变为 Completed!", timeout, move || async move {
                Ok::<_, DomError>(self.try_read_status(driver).await?.is_completed())
            })
            .await
            .is_ok()
    }

    /// 等待课程详情加载：评估表格存在，且任课教师标签不是占位内容
    pub async fn wait_detail_loaded(&self, driver: &dyn PageDriver) -> Result<(), WaitTimeout> {
        self.poller
            .wait_until("课程详情加载", self.timings.detail_load, move || async move {
                if !driver.is_present(&self.layout.detail_panel).await? {
                    return Ok(false);
                }
                let faculty = driver.read_text(&self.layout.faculty_label).await?;
                Ok::<_, DomError>(!is_placeholder(&faculty))
            })
            .await
    }

    /// 读取当前预期成绩（重新定位）
    pub async fn read_grade(&self, driver: &dyn PageDriver) -> Option<String> {
        if self
            .poller
            .wait_present(driver, &self.layout.grade_select, self.timings.element_wait)
            .await
            .is_err()
        {
            return None;
        }
        driver.read_value(&self.layout.grade_select).await.ok()
    }

    /// 勾选表格内所有"非常同意"单选框，返回成功处理的个数
    ///
    /// 已勾选的也计数；单个失败只记录日志
    pub async fn fill_response_pattern(&self, driver: &dyn PageDriver) -> usize {
        let radios = match driver
            .list_matching(&self.layout.response_table, &self.layout.response_choice)
            .await
        {
            Ok(radios) => radios,
            Err(e) => {
                warn!("⚠️ 读取评估表格失败: {}", e);
                return 0;
            }
        };

        let mut clicked = 0;
        for radio in &radios {
            match self.choose(driver, radio).await {
                Ok(()) => clicked += 1,
                Err(e) => debug!("单选框 {} 点击失败: {}", radio, e),
            }
        }
        debug!("单选框: {}/{}", clicked, radios.len());
        clicked
    }

    async fn choose(&self, driver: &dyn PageDriver, radio: &Locator) -> DomResult<()> {
        driver.scroll_into_view(radio).await?;
        if driver.is_checked(radio).await? {
            return Ok(());
        }
        if let Err(e) = driver.js_click(radio).await {
            debug!("JS 点击失败，改用原生点击: {}", e);
            driver.click(radio).await?;
        }
        Ok(())
    }

    /// 清空评语（没有评语框不算错误）
    pub async fn clear_comment(&self, driver: &dyn PageDriver) {
        match driver.is_present(&self.layout.comment_box).await {
            Ok(true) => {
                if let Err(e) = driver.clear(&self.layout.comment_box).await {
                    debug!("清空评语失败: {}", e);
                }
            }
            Ok(false) => {}
            Err(e) => debug!("查找评语框失败: {}", e),
        }
    }

    /// 按优先顺序点击第一个可用的提交按钮，返回按钮 id
    ///
    /// 点击后等待页面静默；静默检测超时则改为等待进度指示器消失
    pub async fn submit(&self, driver: &dyn PageDriver) -> Option<String> {
        for button in &self.layout.submit_buttons {
            if !driver.is_present(button).await.unwrap_or(false) {
                continue;
            }
            if let Err(e) = self.press(driver, button).await {
                debug!("提交按钮 {} 点击失败: {}", button, e);
                continue;
            }

            if let Err(e) = self
                .quiescence
                .await_idle(driver, self.timings.submit_idle)
                .await
            {
                debug!("提交后未静默，等待进度指示器: {}", e);
                let _ = self
                    .poller
                    .wait_invisible(driver, &self.layout.busy_indicator, self.timings.busy_vanish)
                    .await;
            }

            let id = button
                .element_id()
                .map(str::to_string)
                .unwrap_or_else(|| button.to_string());
            info!("📤 已点击提交按钮: {}", id);
            return Some(id);
        }
        None
    }

    async fn press(&self, driver: &dyn PageDriver, button: &Locator) -> DomResult<()> {
        driver.scroll_into_view(button).await?;
        if let Err(e) = driver.js_click(button).await {
            debug!("JS 点击失败，改用原生点击: {}", e);
            driver.click(button).await?;
        }
        Ok(())
    }

    /// 读取提示信息，没有则为空串
    pub async fn read_message(&self, driver: &dyn PageDriver) -> String {
        driver
            .read_text(&self.layout.message_label)
            .await
            .map(|text| text.trim().to_string())
            .unwrap_or_default()
    }
}
