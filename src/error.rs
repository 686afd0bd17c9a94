use thiserror::Error;

/// 页面能力层错误
///
/// 只描述"对页面做一次操作"失败的原因，上层一律当作可重试的瞬时错误处理
#[derive(Debug, Error)]
pub enum DomError {
    /// 定位器解析不到元素（可能正在被 postback 替换）
    #[error("元素不存在: {0}")]
    NotFound(String),
    /// 页面内脚本执行失败
    #[error("脚本执行失败: {0}")]
    Script(String),
    /// 与浏览器通信失败
    #[error("浏览器通信失败: {0}")]
    Browser(String),
    /// 脚本返回值无法解析
    #[error("返回值解析失败: {0}")]
    Decode(String),
}

pub type DomResult<T> = Result<T, DomError>;

impl From<chromiumoxide::error::CdpError> for DomError {
    fn from(err: chromiumoxide::error::CdpError) -> Self {
        DomError::Browser(err.to_string())
    }
}

impl From<serde_json::Error> for DomError {
    fn from(err: serde_json::Error) -> Self {
        DomError::Decode(err.to_string())
    }
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 环境变量不存在
    #[error("环境变量 {var_name} 不存在")]
    EnvVarNotFound { var_name: String },
}

/// 浏览器启动 / 连接错误
#[derive(Debug, Error)]
pub enum BrowserError {
    /// 启动浏览器失败
    #[error("启动浏览器失败: {0}")]
    LaunchFailed(String),
    /// 连接浏览器失败
    #[error("无法连接到浏览器 (端口: {port}): {message}")]
    ConnectionFailed { port: u16, message: String },
}

/// 应用程序错误类型
///
/// 只有整轮运行必须中止的错误才会走到这里；单门课程的失败记录在 `OutcomeRecord` 里
#[derive(Debug, Error)]
pub enum AppError {
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    #[error("浏览器错误: {0}")]
    Browser(#[from] BrowserError),
    /// 登录失败
    #[error("登录失败: 已尝试 {attempts} 次 ({last_error})")]
    LoginFailed { attempts: usize, last_error: String },
    /// 菜单导航失败（step 从 1 开始）
    #[error("第 {step} 级菜单点击失败: {last_error}")]
    Navigation { step: usize, last_error: String },
}

impl AppError {
    /// 进程退出码
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Browser(_) => 1,
            AppError::LoginFailed { .. } => 2,
            AppError::Navigation { step, .. } => (2 + *step).min(u8::MAX as usize) as u8,
        }
    }
}

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
