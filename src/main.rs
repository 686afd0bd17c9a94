use std::process::ExitCode;

use course_eval_submit::error::AppError;
use course_eval_submit::utils::logging;
use course_eval_submit::{App, Config};
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
    // 加载配置（环境变量优先，其次是当前目录下的 .env）
    let config = match Config::from_env_and_file(".env") {
        Ok(config) => config,
        Err(e) => {
            logging::init(false);
            let err = AppError::from(e);
            error!("❌ {}", err);
            return ExitCode::from(err.exit_code());
        }
    };

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let app = match App::initialize(config).await {
        Ok(app) => app,
        Err(e) => {
            error!("❌ {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    let result = app.run().await;
    app.shutdown().await;

    // 最终状态不是 Completed! 也按正常结束处理，以处理记录为准
    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}
