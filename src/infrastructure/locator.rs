//! 元素定位器
//!
//! 页面随时可能被 UpdatePanel 整块替换，所以这里只保存"怎么找"，不保存元素句柄。
//! 每次操作都把定位器渲染成一段 JS 表达式，在页面里重新解析。

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Locator {
    /// 元素 id
    Id(String),
    /// CSS 选择器（取第一个匹配）
    Css(String),
    /// XPath（取第一个匹配）
    XPath(String),
    /// 容器内第 `index` 个匹配 `selector` 的元素
    Nth {
        container: Box<Locator>,
        selector: String,
        index: usize,
    },
}

impl Locator {
    pub fn id(id: impl Into<String>) -> Self {
        Locator::Id(id.into())
    }

    pub fn css(selector: impl Into<String>) -> Self {
        Locator::Css(selector.into())
    }

    pub fn xpath(path: impl Into<String>) -> Self {
        Locator::XPath(path.into())
    }

    /// 以当前定位器为容器，取第 `index` 个匹配项
    pub fn nth(&self, selector: impl Into<String>, index: usize) -> Self {
        Locator::Nth {
            container: Box::new(self.clone()),
            selector: selector.into(),
            index,
        }
    }

    /// 元素 id（仅 `Id` 定位器有）
    pub fn element_id(&self) -> Option<&str> {
        match self {
            Locator::Id(id) => Some(id),
            _ => None,
        }
    }

    /// 渲染为 JS 表达式，结果为元素或 `null`
    pub fn to_js(&self) -> String {
        match self {
            Locator::Id(id) => format!("document.getElementById({})", js_str(id)),
            Locator::Css(selector) => format!("document.querySelector({})", js_str(selector)),
            Locator::XPath(path) => format!(
                "document.evaluate({}, document, null, XPathResult.FIRST_ORDERED_NODE_TYPE, null).singleNodeValue",
                js_str(path)
            ),
            Locator::Nth {
                container,
                selector,
                index,
            } => format!(
                "(() => {{ const c = {}; return c ? (c.querySelectorAll({})[{}] || null) : null; }})()",
                container.to_js(),
                js_str(selector),
                index
            ),
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Id(id) => write!(f, "#{}", id),
            Locator::Css(selector) => write!(f, "css={}", selector),
            Locator::XPath(path) => write!(f, "xpath={}", path),
            Locator::Nth {
                container,
                selector,
                index,
            } => write!(f, "{} >> {}[{}]", container, selector, index),
        }
    }
}

/// 字符串转成 JS 字面量（带转义）
pub fn js_str(value: &str) -> String {
    JsonValue::String(value.to_string()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_locator_js() {
        let loc = Locator::id("ctl00_MainContainer_lblMsg");
        assert_eq!(
            loc.to_js(),
            r#"document.getElementById("ctl00_MainContainer_lblMsg")"#
        );
    }

    #[test]
    fn test_js_escaping() {
        let loc = Locator::css(r#"input[type=radio][value="5"]"#);
        assert_eq!(
            loc.to_js(),
            r#"document.querySelector("input[type=radio][value=\"5\"]")"#
        );
    }

    #[test]
    fn test_nth_wraps_container() {
        let table = Locator::css("table.evaluationTable");
        let radio = table.nth("input[type=radio]", 3);
        let js = radio.to_js();
        assert!(js.contains(r#"document.querySelector("table.evaluationTable")"#));
        assert!(js.contains("[3]"));
        assert_eq!(radio.to_string(), "css=table.evaluationTable >> input[type=radio][3]");
    }
}
