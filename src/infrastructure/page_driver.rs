//! 页面能力接口
//!
//! 上层只认识这个 trait：查找、读取、点击、注入值、执行脚本。
//! 真实实现是 `ChromeDriver`，测试里是内存中的假页面。

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::DomResult;
use crate::infrastructure::Locator;

/// 下拉框选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

/// 页面异步活动快照
///
/// 两个字段都可能拿不到（页面没有 jQuery / 没有 ASP.NET AJAX），拿不到就是 `None`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AsyncActivity {
    /// `jQuery.active`
    pub jquery_active: Option<i64>,
    /// `PageRequestManager.get_isInAsyncPostBack()`
    pub in_async_postback: Option<bool>,
}

impl AsyncActivity {
    pub fn is_idle(&self) -> bool {
        self.jquery_active.unwrap_or(0) == 0 && !self.in_async_postback.unwrap_or(false)
    }
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    async fn navigate(&self, url: &str) -> DomResult<()>;

    async fn current_url(&self) -> DomResult<String>;

    async fn is_present(&self, locator: &Locator) -> DomResult<bool>;

    /// 不存在的元素视为不可见
    async fn is_visible(&self, locator: &Locator) -> DomResult<bool>;

    async fn read_text(&self, locator: &Locator) -> DomResult<String>;

    /// 读取 `value` 属性
    async fn read_value(&self, locator: &Locator) -> DomResult<String>;

    async fn is_checked(&self, locator: &Locator) -> DomResult<bool>;

    /// 容器内匹配 `selector` 的元素个数
    async fn count_matching(&self, container: &Locator, selector: &str) -> DomResult<usize>;

    async fn list_options(&self, select: &Locator) -> DomResult<Vec<SelectOption>>;

    /// 原生指针点击
    async fn click(&self, locator: &Locator) -> DomResult<()>;

    /// 通过 `el.click()` 点击，绕开遮挡层
    async fn js_click(&self, locator: &Locator) -> DomResult<()>;

    async fn scroll_into_view(&self, locator: &Locator) -> DomResult<()>;

    /// 清空后输入文本
    async fn type_text(&self, locator: &Locator, text: &str) -> DomResult<()>;

    async fn clear(&self, locator: &Locator) -> DomResult<()>;

    /// 直接写 `value` 并派发 `change`
    async fn inject_value(&self, locator: &Locator, value: &str) -> DomResult<()>;

    /// 打开下拉框并点中值或文本匹配的选项
    async fn click_option(&self, select: &Locator, value_or_label: &str) -> DomResult<()>;

    /// 按值选择，找不到再按文本选择
    async fn select_option(&self, select: &Locator, value_or_label: &str) -> DomResult<()>;

    /// 读取页面的异步请求状态
    async fn async_activity(&self) -> DomResult<AsyncActivity>;

    /// 调用 `__doPostBack(target, '')`（页面没有该函数时什么也不做）
    async fn postback(&self, target: &str) -> DomResult<()>;

    /// 容器内每个匹配元素的定位器
    async fn list_matching(&self, container: &Locator, selector: &str) -> DomResult<Vec<Locator>> {
        let count = self.count_matching(container, selector).await?;
        Ok((0..count).map(|i| container.nth(selector, i)).collect())
    }
}
