//! 课程处理上下文
//!
//! 封装"我正在第几轮处理第几门课"这一信息

use std::fmt::Display;

use crate::models::Pass;

/// 课程处理上下文
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CourseCtx {
    /// 所在批次
    pub pass: Pass,

    /// 本批次中的序号（从1开始，仅用于日志显示）
    pub index: usize,

    /// 本批次课程总数
    pub total: usize,
}

impl CourseCtx {
    pub fn new(pass: Pass, index: usize, total: usize) -> Self {
        Self { pass, index, total }
    }
}

impl Display for CourseCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} {}/{}]", self.pass, self.index, self.total)
    }
}
