//! 日志工具模块
//!
//! 提供日志初始化和横幅输出的辅助函数

use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅者
///
/// 优先使用 `RUST_LOG`，否则按 `verbose` 选择 debug / info。重复初始化会被忽略。
///
/// # 参数
/// - `verbose`: 是否输出 debug 日志
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `user_id`: 学号
/// - `headless`: 是否无头模式
/// - `max_rounds`: 主轮次上限
/// - `extra_attempts`: 补交轮次
pub fn log_startup(user_id: &str, headless: bool, max_rounds: usize, extra_attempts: usize) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 课程评估自动提交");
    info!("👤 学号: {}", user_id);
    info!("🖥️ 无头模式: {}", headless);
    info!("📊 主轮次上限: {}, 补交轮次: {}", max_rounds, extra_attempts);
    info!("{}", "=".repeat(60));
}

/// 记录课程快照信息
pub fn log_courses_loaded(total: usize) {
    info!("✓ 找到 {} 门待评估课程", total);
}

/// 记录批次开始信息
///
/// # 参数
/// - `pass`: 批次名称（如 `round-1`）
/// - `pending`: 本批次待处理课程数
pub fn log_pass_start(pass: &str, pending: usize) {
    info!("\n{}", "=".repeat(60));
    info!("📦 开始批次 {}，待处理 {} 门", pass, pending);
    info!("{}", "=".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `submitted`: 已提交的记录数
/// - `failed`: 未提交的记录数
/// - `total`: 记录总数
/// - `completed`: 页面状态是否为 `Completed!`
/// - `results_path`: 结果文件路径
pub fn print_final_stats(submitted: usize, failed: usize, total: usize, completed: bool, results_path: &str) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 已提交课程: {}/{}", submitted, total);
    info!("❌ 未提交课程: {}", failed);
    if completed {
        info!("🎉 评估状态: Completed!");
    } else {
        info!("⚠️ 评估状态未达到 Completed!");
    }
    info!("{}", "=".repeat(60));
    info!("\n结果已保存至: {}", results_path);
}

/// 截断长文本用于日志显示
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
