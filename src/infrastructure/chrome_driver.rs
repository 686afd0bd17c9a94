//! 基于 chromiumoxide 的页面能力实现
//!
//! 除导航和原生点击外，所有操作都是一段在页面里执行的 JS：
//! 先用定位器重新解析元素，找不到就返回 `{ found: false }`。

use async_trait::async_trait;
use chromiumoxide::layout::Point;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{DomError, DomResult};
use crate::infrastructure::locator::js_str;
use crate::infrastructure::{AsyncActivity, JsExecutor, Locator, PageDriver, SelectOption};

const ASYNC_ACTIVITY_JS: &str = r#"
(() => {
    const jq = window.jQuery ? window.jQuery.active : null;
    let prm = null;
    if (window.Sys && Sys.WebForms && Sys.WebForms.PageRequestManager) {
        prm = Sys.WebForms.PageRequestManager.getInstance().get_isInAsyncPostBack();
    }
    return { jquery_active: jq, in_async_postback: prm };
})()
"#;

const FIRE_INPUT_AND_CHANGE: &str = "el.dispatchEvent(new Event('input', { bubbles: true })); \
     el.dispatchEvent(new Event('change', { bubbles: true }));";

#[derive(Debug, Deserialize)]
struct Probe<T> {
    found: bool,
    value: Option<T>,
}

#[derive(Debug, Deserialize)]
struct Center {
    x: f64,
    y: f64,
}

/// Chrome 页面驱动
pub struct ChromeDriver {
    executor: JsExecutor,
}

impl ChromeDriver {
    pub fn new(executor: JsExecutor) -> Self {
        Self { executor }
    }

    /// 解析元素后执行 `body`
    ///
    /// `body` 中可以使用变量 `el`，必须 `return { found: true, value: ... }`
    async fn probe<T: DeserializeOwned>(&self, locator: &Locator, body: &str) -> DomResult<T> {
        let js = format!(
            "(() => {{ const el = {}; if (!el) {{ return {{ found: false }}; }} {} }})()",
            locator.to_js(),
            body
        );
        let probe: Probe<T> = self.executor.eval_as(js).await?;
        if !probe.found {
            return Err(DomError::NotFound(locator.to_string()));
        }
        probe
            .value
            .ok_or_else(|| DomError::Decode(format!("{} 没有返回值", locator)))
    }

    /// 执行只关心成功与否的操作
    async fn act(&self, locator: &Locator, body: &str) -> DomResult<()> {
        let done: bool = self
            .probe(locator, &format!("{} return {{ found: true, value: true }};", body))
            .await?;
        if done {
            Ok(())
        } else {
            Err(DomError::Script(format!("{} 操作未生效", locator)))
        }
    }

    /// 执行返回 true / false 的选项操作，false 表示没有匹配选项
    async fn pick_option(&self, select: &Locator, body: &str, wanted: &str) -> DomResult<()> {
        let matched: bool = self.probe(select, body).await?;
        if matched {
            Ok(())
        } else {
            Err(DomError::NotFound(format!("{} 中的选项 '{}'", select, wanted)))
        }
    }
}

#[async_trait]
impl PageDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> DomResult<()> {
        debug!("导航到: {}", url);
        self.executor.page().goto(url).await?;
        Ok(())
    }

    async fn current_url(&self) -> DomResult<String> {
        Ok(self.executor.page().url().await?.unwrap_or_default())
    }

    async fn is_present(&self, locator: &Locator) -> DomResult<bool> {
        self.executor
            .eval_as(format!("(() => {} !== null)()", locator.to_js()))
            .await
    }

    async fn is_visible(&self, locator: &Locator) -> DomResult<bool> {
        let js = format!(
            r#"(() => {{
                const el = {};
                if (!el) {{ return false; }}
                const style = window.getComputedStyle(el);
                return style.display !== 'none' && style.visibility !== 'hidden' && el.getClientRects().length > 0;
            }})()"#,
            locator.to_js()
        );
        self.executor.eval_as(js).await
    }

    async fn read_text(&self, locator: &Locator) -> DomResult<String> {
        self.probe(
            locator,
            "return { found: true, value: (el.innerText || el.textContent || '').trim() };",
        )
        .await
    }

    async fn read_value(&self, locator: &Locator) -> DomResult<String> {
        self.probe(
            locator,
            "return { found: true, value: el.value !== undefined ? String(el.value) : (el.getAttribute('value') || '') };",
        )
        .await
    }

    async fn is_checked(&self, locator: &Locator) -> DomResult<bool> {
        self.probe(locator, "return { found: true, value: !!el.checked };")
            .await
    }

    async fn count_matching(&self, container: &Locator, selector: &str) -> DomResult<usize> {
        self.probe(
            container,
            &format!(
                "return {{ found: true, value: el.querySelectorAll({}).length }};",
                js_str(selector)
            ),
        )
        .await
    }

    async fn list_options(&self, select: &Locator) -> DomResult<Vec<SelectOption>> {
        self.probe(
            select,
            "return { found: true, value: Array.from(el.options || []).map(o => ({ value: o.value, label: (o.text || '').trim() })) };",
        )
        .await
    }

    async fn click(&self, locator: &Locator) -> DomResult<()> {
        let center: Center = self
            .probe(
                locator,
                r#"el.scrollIntoView({ block: 'center' });
                const r = el.getBoundingClientRect();
                return { found: true, value: { x: r.left + r.width / 2, y: r.top + r.height / 2 } };"#,
            )
            .await?;
        self.executor
            .page()
            .click(Point::new(center.x, center.y))
            .await?;
        Ok(())
    }

    async fn js_click(&self, locator: &Locator) -> DomResult<()> {
        self.act(locator, "el.click();").await
    }

    async fn scroll_into_view(&self, locator: &Locator) -> DomResult<()> {
        self.act(locator, "el.scrollIntoView({ block: 'center' });")
            .await
    }

    async fn type_text(&self, locator: &Locator, text: &str) -> DomResult<()> {
        self.act(
            locator,
            &format!(
                "el.focus(); el.value = ''; el.value = {}; {}",
                js_str(text),
                FIRE_INPUT_AND_CHANGE
            ),
        )
        .await
    }

    async fn clear(&self, locator: &Locator) -> DomResult<()> {
        self.act(locator, &format!("el.value = ''; {}", FIRE_INPUT_AND_CHANGE))
            .await
    }

    async fn inject_value(&self, locator: &Locator, value: &str) -> DomResult<()> {
        self.act(
            locator,
            &format!(
                "el.value = {}; el.dispatchEvent(new Event('change', {{ bubbles: true }}));",
                js_str(value)
            ),
        )
        .await
    }

    async fn click_option(&self, select: &Locator, value_or_label: &str) -> DomResult<()> {
        let wanted = js_str(value_or_label);
        let body = format!(
            r#"const opt = Array.from(el.options || []).find(o => o.value === {w} || (o.text || '').trim() === {w});
            if (!opt) {{ return {{ found: true, value: false }}; }}
            el.scrollIntoView({{ block: 'center' }});
            el.focus();
            el.click();
            opt.scrollIntoView({{ block: 'center' }});
            opt.selected = true;
            el.dispatchEvent(new Event('change', {{ bubbles: true }}));
            return {{ found: true, value: true }};"#,
            w = wanted
        );
        self.pick_option(select, &body, value_or_label).await
    }

    async fn select_option(&self, select: &Locator, value_or_label: &str) -> DomResult<()> {
        let wanted = js_str(value_or_label);
        let body = format!(
            r#"const opts = Array.from(el.options || []);
            let idx = opts.findIndex(o => o.value === {w});
            if (idx < 0) {{ idx = opts.findIndex(o => (o.text || '').trim() === {w}); }}
            if (idx < 0) {{ return {{ found: true, value: false }}; }}
            el.selectedIndex = idx;
            {fire}
            return {{ found: true, value: true }};"#,
            w = wanted,
            fire = FIRE_INPUT_AND_CHANGE
        );
        self.pick_option(select, &body, value_or_label).await
    }

    async fn async_activity(&self) -> DomResult<AsyncActivity> {
        self.executor.eval_as(ASYNC_ACTIVITY_JS).await
    }

    async fn postback(&self, target: &str) -> DomResult<()> {
        let js = format!(
            "(() => {{ if (typeof __doPostBack === 'function') {{ __doPostBack({}, ''); return true; }} return false; }})()",
            js_str(target)
        );
        let fired: bool = self.executor.eval_as(js).await?;
        if !fired {
            debug!("页面没有 __doPostBack，跳过: {}", target);
        }
        Ok(())
    }
}
