//! 结果写入服务 - 业务能力层
//!
//! 只负责"把处理记录写成 JSON 文件"，不关心流程

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::models::OutcomeRecord;

/// 处理记录的去处
pub trait ResultSink: Send + Sync {
    /// 写入全部记录（覆盖之前的内容）
    fn persist(&self, records: &[OutcomeRecord]) -> Result<()>;
}

/// 写入带缩进的 JSON 数组，每次运行覆盖
pub struct JsonResultWriter {
    path: PathBuf,
}

impl JsonResultWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ResultSink for JsonResultWriter {
    fn persist(&self, records: &[OutcomeRecord]) -> Result<()> {
        debug!("写入 {} 条记录到 {}", records.len(), self.path.display());

        let json = serde_json::to_string_pretty(records).context("序列化处理记录失败")?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("无法写入结果文件: {}", self.path.display()))?;

        info!("✓ 处理记录已写入 {}", self.path.display());
        Ok(())
    }
}
