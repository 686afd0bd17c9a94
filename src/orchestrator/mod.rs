//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用生命周期
//! - 启动或连接浏览器，持有 Browser 和 ChromeDriver
//! - 登录、菜单导航（失败即中止整轮运行）
//! - 收尾：停留、关闭浏览器
//!
//! ### `course_batch` - 课程批量处理器
//! - 读取课程快照
//! - 主轮次 / 补交 / 遗漏课程
//! - 写出处理记录，报告最终状态
//!
//! ## 层次关系
//!
//! ```text
//! app (浏览器 + 登录 + 导航)
//!     ↓
//! course_batch (处理 Vec<Course>)
//!     ↓
//! workflow::CourseFlow (处理单门 Course)
//!     ↓
//! services (能力层：mutator / poller / quiescence / form)
//!     ↓
//! infrastructure (基础设施：PageDriver)
//! ```

pub mod app;
pub mod course_batch;

pub use app::App;
pub use course_batch::{BatchOutcome, CourseBatch};
