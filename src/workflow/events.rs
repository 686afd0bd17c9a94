//! 运行事件
//!
//! 编排层把进度以事件形式交给观察者，自己不直接打印统计信息

use tracing::{error, info, warn};

use crate::models::{Course, EvaluationStatus, OutcomeRecord, Pass};
use crate::utils::logging;

#[derive(Debug, Clone, PartialEq)]
pub enum RunEvent {
    /// 读取到课程快照
    CoursesLoaded { total: usize },
    /// 开始一个批次
    PassStarted { pass: Pass, pending: usize },
    /// 开始处理一门课程
    CourseStarted {
        pass: Pass,
        course: Course,
        index: usize,
        total: usize,
    },
    /// 一门课程处理结束
    CourseFinished { record: OutcomeRecord },
    /// 轮次结束时读取到的整体状态
    StatusChecked { status: EvaluationStatus },
    ResultsPersisted { count: usize },
    PersistFailed { message: String },
    /// 全部结束
    Finished {
        submitted: usize,
        failed: usize,
        total: usize,
        completed: bool,
    },
}

/// 运行事件观察者
pub trait RunObserver: Send + Sync {
    fn on_event(&self, event: &RunEvent);
}

/// 把事件输出为日志
pub struct TracingObserver {
    results_path: String,
}

impl TracingObserver {
    pub fn new(results_path: impl Into<String>) -> Self {
        Self {
            results_path: results_path.into(),
        }
    }
}

impl RunObserver for TracingObserver {
    fn on_event(&self, event: &RunEvent) {
        match event {
            RunEvent::CoursesLoaded { total } => logging::log_courses_loaded(*total),
            RunEvent::PassStarted { pass, pending } => {
                logging::log_pass_start(&pass.to_string(), *pending)
            }
            RunEvent::CourseStarted {
                pass,
                course,
                index,
                total,
            } => info!("[{} {}/{}] 📘 处理课程 {}", pass, index, total, course),
            RunEvent::CourseFinished { record } => {
                if record.is_submitted() {
                    info!(
                        "✅ 课程 {} 已提交 (修正后重新提交: {})",
                        record.value,
                        record.resubmit_after_fix.unwrap_or(false)
                    );
                } else {
                    warn!(
                        "❌ 课程 {} 未提交: {}",
                        record.value,
                        record
                            .error
                            .as_deref()
                            .or(record.submit_error.map(|kind| kind.as_str()))
                            .unwrap_or("未知原因")
                    );
                }
            }
            RunEvent::StatusChecked { status } => info!("📋 评估状态: {}", status),
            RunEvent::ResultsPersisted { count } => {
                info!("💾 已保存 {} 条处理记录", count)
            }
            RunEvent::PersistFailed { message } => error!("❌ 保存处理记录失败: {}", message),
            RunEvent::Finished {
                submitted,
                failed,
                total,
                completed,
            } => logging::print_final_stats(
                *submitted,
                *failed,
                *total,
                *completed,
                &self.results_path,
            ),
        }
    }
}
