//! # Course Eval Submit
//!
//! 自动完成 UCAM 课程评估的 Rust 应用程序
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Page），只暴露能力
//! - `PageDriver` - 页面能力接口（查找、读取、点击、注入值）
//! - `ChromeDriver` - 基于 `JsExecutor` 的真实实现
//! - `Locator` - 元素定位器，每次操作都重新解析，不缓存元素句柄
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ConditionPoller` / `QuiescenceDetector` - 等待条件成立 / 页面静默
//! - `VerifiedMutator` - 修改字段并读回校验
//! - `EvaluationForm` - 评估页各区块的读写
//! - `Authenticator` / `MenuNavigator` - 登录、进入评估页
//! - `JsonResultWriter` - 写出处理记录
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一门课"的完整处理流程
//! - `CourseCtx` - 上下文封装（批次 + 序号）
//! - `CourseFlow` - 选课 → 等待加载 → 预期成绩 → 勾选 → 提交 → 修正重交
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/course_batch` - 主轮次、补交、遗漏课程
//! - `orchestrator/app` - 浏览器、登录、导航的生命周期
//!
//! ## 模块结构

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Timings};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeDriver, Locator, PageDriver};
pub use models::{Course, EvaluationStatus, OutcomeRecord, Pass};
pub use orchestrator::{App, BatchOutcome, CourseBatch};
pub use workflow::{CourseCtx, CourseFlow};
