use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::models::Course;

/// 处理批次
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    /// 主轮次（从 1 开始）
    Round(usize),
    /// 补交轮次（从 1 开始）
    Recovery(usize),
    /// 遗漏课程补处理
    Leftover,
    /// 试运行
    Sample,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Round(n) => write!(f, "round-{}", n),
            Pass::Recovery(n) => write!(f, "recovery-{}", n),
            Pass::Leftover => write!(f, "leftover"),
            Pass::Sample => write!(f, "sample"),
        }
    }
}

impl Serialize for Pass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 提交失败类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitErrorKind {
    NoSubmitButtonFound,
}

impl SubmitErrorKind {
    /// 写入结果文件和日志时使用的标记
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmitErrorKind::NoSubmitButtonFound => "no_submit_button_found",
        }
    }
}

impl fmt::Display for SubmitErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubmitErrorKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// 详情面板加载超时的错误标记
pub const EVALUATION_LOAD_TIMEOUT: &str = "evaluation_load_timeout";

/// 一次课程处理的结果
///
/// 每次处理都追加一条新记录，重试不会修改旧记录
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutcomeRecord {
    pub value: String,
    #[serde(rename = "text")]
    pub label: String,
    pub pass: Pass,
    pub start: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_set_initial: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_expected_grade: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub radios_clicked: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submitted: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub clicked_submit_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submit_error: Option<SubmitErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resubmit_after_fix: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resubmit_clicked_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OutcomeRecord {
    /// 开始处理时创建
    pub fn begin(course: &Course, pass: Pass) -> Self {
        Self {
            value: course.value.clone(),
            label: course.label.clone(),
            pass,
            start: Utc::now(),
            end: None,
            expected_set_initial: None,
            selected_expected_grade: None,
            radios_clicked: None,
            submitted: None,
            clicked_submit_id: None,
            submit_error: None,
            resubmit_after_fix: None,
            resubmit_clicked_id: None,
            error: None,
        }
    }

    /// 结束处理，记录结束时间
    pub fn finish(mut self) -> Self {
        self.end = Some(Utc::now());
        self
    }

    pub fn is_submitted(&self) -> bool {
        self.submitted == Some(true)
    }
}
