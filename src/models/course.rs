use std::fmt;

use serde::{Deserialize, Serialize};

use crate::infrastructure::SelectOption;

/// 待评估课程
///
/// `value` 在一次会话内稳定，`label` 仅用于显示
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Course {
    pub value: String,
    pub label: String,
}

impl Course {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// 下拉框选项转为课程，显示名去掉首尾空白
impl From<SelectOption> for Course {
    fn from(option: SelectOption) -> Self {
        let label = option.label.trim().to_string();
        Self {
            value: option.value,
            label,
        }
    }
}

impl fmt::Display for Course {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.value, self.label)
    }
}

/// 页面上的整体评估状态
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EvaluationStatus {
    /// `Pending!`
    Pending,
    /// `Completed!`
    Completed,
    /// 其它（加载中、空白等）
    Other(String),
}

impl EvaluationStatus {
    /// 从状态标签文本解析，忽略大小写和首尾空白
    pub fn from_label(text: &str) -> Self {
        match text.trim().to_lowercase().as_str() {
            "pending!" => EvaluationStatus::Pending,
            "completed!" => EvaluationStatus::Completed,
            _ => EvaluationStatus::Other(text.trim().to_string()),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, EvaluationStatus::Pending)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, EvaluationStatus::Completed)
    }
}

impl fmt::Display for EvaluationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationStatus::Pending => write!(f, "Pending!"),
            EvaluationStatus::Completed => write!(f, "Completed!"),
            EvaluationStatus::Other(text) if text.is_empty() => write!(f, "(空)"),
            EvaluationStatus::Other(text) => write!(f, "{}", text),
        }
    }
}
