use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use tracing::debug;

use crate::error::ConfigError;

/// 默认登录地址
pub const DEFAULT_LOGIN_URL: &str = "https://ucam.uiu.ac.bd/Security/Login.aspx";

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 学号
    pub user_id: String,
    /// 密码
    pub password: String,
    /// 是否无头模式
    pub headless: bool,
    /// 登录页地址
    pub login_url: String,
    /// 连接已有浏览器的调试端口（不设置则自行启动）
    pub browser_debug_port: Option<u16>,
    /// 浏览器可执行文件路径
    pub chrome_executable: Option<String>,
    /// 结果 JSON 输出路径
    pub results_path: String,
    /// 主轮次上限
    pub max_rounds: usize,
    /// 补交轮次
    pub extra_attempts: usize,
    /// 预期成绩
    pub expected_grade: String,
    /// 只处理前 N 门课程（试运行）
    pub sample_limit: Option<usize>,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub timings: Timings,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 读取进程环境变量，缺少的再从 `.env` 文件中取
    ///
    /// # 参数
    /// - `path`: `.env` 文件路径，文件不存在不算错误
    pub fn from_env_and_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let file = read_env_file(path.as_ref());
        Self::from_lookup(layered(|name| std::env::var(name).ok(), file))
    }

    /// 从任意键值来源读取配置，缺少学号或密码时报错
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| ConfigError::EnvVarNotFound {
                    var_name: name.to_string(),
                })
        };

        Ok(Self {
            user_id: required("USER_ID")?,
            password: required("PASSWORD")?,
            headless: lookup("HEADLESS").map_or(true, |v| parse_headless(&v)),
            login_url: lookup("LOGIN_URL").unwrap_or_else(|| DEFAULT_LOGIN_URL.to_string()),
            browser_debug_port: parse_optional(&lookup, "BROWSER_DEBUG_PORT", "u16")?,
            chrome_executable: lookup("CHROME_EXECUTABLE"),
            results_path: lookup("RESULTS_PATH")
                .unwrap_or_else(|| "completed_courses.json".to_string()),
            max_rounds: parse_optional(&lookup, "MAX_ROUNDS", "usize")?.unwrap_or(4),
            extra_attempts: parse_optional(&lookup, "EXTRA_ATTEMPTS", "usize")?.unwrap_or(2),
            expected_grade: lookup("EXPECTED_GRADE").unwrap_or_else(|| "A".to_string()),
            sample_limit: parse_optional(&lookup, "SAMPLE_COURSES", "usize")?,
            verbose_logging: parse_optional(&lookup, "VERBOSE_LOGGING", "bool")?.unwrap_or(false),
            timings: Timings::default(),
        })
    }
}

fn read_env_file(path: &Path) -> HashMap<String, String> {
    match dotenvy::from_path_iter(path) {
        Ok(entries) => entries.filter_map(Result::ok).collect(),
        Err(e) => {
            debug!("未读取 {}: {}", path.display(), e);
            HashMap::new()
        }
    }
}

/// 先查 `primary`，没有再查文件内容
fn layered<F>(primary: F, file: HashMap<String, String>) -> impl Fn(&str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    move |name| primary(name).or_else(|| file.get(name).cloned())
}

/// `HEADLESS` 只有 `0` / `false` / `False` 表示有界面
fn parse_headless(value: &str) -> bool {
    !matches!(value.trim(), "0" | "false" | "False")
}

fn parse_optional<T, F>(lookup: &F, name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value: raw,
                expected_type: expected_type.to_string(),
            }),
    }
}

/// 所有等待 / 退避时长
#[derive(Clone, Debug)]
pub struct Timings {
    /// 条件轮询间隔
    pub poll_interval: Duration,
    /// 普通元素等待
    pub element_wait: Duration,
    /// 选课后 postback 等待
    pub select_postback: Duration,
    /// 课程详情加载等待
    pub detail_load: Duration,
    /// 修改字段后的空闲等待
    pub mutation_idle: Duration,
    /// 进度指示器出现窗口
    pub busy_appear: Duration,
    /// 进度指示器消失窗口
    pub busy_vanish: Duration,
    /// 课程下拉框单次重试基础延迟
    pub select_base_delay: Duration,
    /// 面板内预期成绩重试延迟
    pub scoped_grade_delay: Duration,
    /// 预期成绩重试基础延迟
    pub grade_base_delay: Duration,
    /// 提交后空闲等待
    pub submit_idle: Duration,
    /// 提交后读取提示前的等待
    pub post_submit_idle: Duration,
    /// 主轮次中课程之间的等待
    pub between_courses_idle: Duration,
    /// 补交轮次中课程之间的等待
    pub recovery_idle: Duration,
    /// 轮次结束时检查状态的等待
    pub status_check: Duration,
    /// 最终等待 Completed! 的时长
    pub final_status: Duration,
    /// 登录重试间隔
    pub login_retry_delay: Duration,
    /// 菜单点击重试间隔
    pub menu_retry_delay: Duration,
    /// 菜单层级之间的停顿
    pub menu_pauses: [Duration; 2],
    /// 有界面模式下退出前的停留
    pub linger: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(120),
            element_wait: Duration::from_secs(15),
            select_postback: Duration::from_secs(20),
            detail_load: Duration::from_secs(25),
            mutation_idle: Duration::from_secs(6),
            busy_appear: Duration::from_secs(1),
            busy_vanish: Duration::from_secs(8),
            select_base_delay: Duration::from_millis(500),
            scoped_grade_delay: Duration::from_millis(600),
            grade_base_delay: Duration::from_millis(500),
            submit_idle: Duration::from_secs(12),
            post_submit_idle: Duration::from_secs(6),
            between_courses_idle: Duration::from_secs(8),
            recovery_idle: Duration::from_secs(6),
            status_check: Duration::from_secs(6),
            final_status: Duration::from_secs(20),
            login_retry_delay: Duration::from_secs(2),
            menu_retry_delay: Duration::from_secs(1),
            menu_pauses: [Duration::from_millis(800), Duration::from_millis(500)],
            linger: Duration::from_secs(5),
        }
    }
}

impl Timings {
    /// 测试用：所有时长压缩到毫秒级
    #[cfg(test)]
    pub(crate) fn instant() -> Self {
        let ms = Duration::from_millis;
        Self {
            poll_interval: ms(1),
            element_wait: ms(30),
            select_postback: ms(30),
            detail_load: ms(30),
            mutation_idle: ms(20),
            busy_appear: ms(2),
            busy_vanish: ms(10),
            select_base_delay: ms(1),
            scoped_grade_delay: ms(1),
            grade_base_delay: ms(1),
            submit_idle: ms(20),
            post_submit_idle: ms(5),
            between_courses_idle: ms(5),
            recovery_idle: ms(5),
            status_check: ms(10),
            final_status: ms(10),
            login_retry_delay: ms(1),
            menu_retry_delay: ms(1),
            menu_pauses: [ms(1), ms(1)],
            linger: ms(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config =
            Config::from_lookup(lookup_from(&[("USER_ID", "011201"), ("PASSWORD", "pw")])).unwrap();
        assert!(config.headless);
        assert_eq!(config.login_url, DEFAULT_LOGIN_URL);
        assert_eq!(config.results_path, "completed_courses.json");
        assert_eq!(config.max_rounds, 4);
        assert_eq!(config.extra_attempts, 2);
        assert_eq!(config.expected_grade, "A");
        assert_eq!(config.browser_debug_port, None);
        assert_eq!(config.sample_limit, None);
    }

    #[test]
    fn test_missing_credentials() {
        let err = Config::from_lookup(lookup_from(&[("USER_ID", "011201")])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { var_name } if var_name == "PASSWORD"));

        let err = Config::from_lookup(lookup_from(&[("USER_ID", "  "), ("PASSWORD", "pw")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { var_name } if var_name == "USER_ID"));
    }

    #[test]
    fn test_dotenv_file_fills_missing_variables() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "USER_ID=011201001\nPASSWORD=\"from file\"\nMAX_ROUNDS=3\n",
        )
        .unwrap();

        let env = lookup_from(&[("PASSWORD", "from env")]);
        let config = Config::from_lookup(layered(env, read_env_file(&path))).unwrap();

        assert_eq!(config.user_id, "011201001");
        assert_eq!(config.password, "from env");
        assert_eq!(config.max_rounds, 3);
    }

    #[test]
    fn test_missing_dotenv_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = read_env_file(&dir.path().join(".env"));
        assert!(file.is_empty());

        let env = lookup_from(&[("USER_ID", "u"), ("PASSWORD", "p")]);
        assert!(Config::from_lookup(layered(env, file)).is_ok());
    }

    #[test]
    fn test_headless_flag() {
        for (raw, expected) in [("0", false), ("false", false), ("False", false), ("1", true), ("yes", true)] {
            let config = Config::from_lookup(lookup_from(&[
                ("USER_ID", "u"),
                ("PASSWORD", "p"),
                ("HEADLESS", raw),
            ]))
            .unwrap();
            assert_eq!(config.headless, expected, "HEADLESS={}", raw);
        }
    }

    #[test]
    fn test_numeric_overrides_and_errors() {
        let config = Config::from_lookup(lookup_from(&[
            ("USER_ID", "u"),
            ("PASSWORD", "p"),
            ("MAX_ROUNDS", "2"),
            ("SAMPLE_COURSES", "3"),
            ("BROWSER_DEBUG_PORT", "9222"),
        ]))
        .unwrap();
        assert_eq!(config.max_rounds, 2);
        assert_eq!(config.sample_limit, Some(3));
        assert_eq!(config.browser_debug_port, Some(9222));

        let err = Config::from_lookup(lookup_from(&[
            ("USER_ID", "u"),
            ("PASSWORD", "p"),
            ("EXTRA_ATTEMPTS", "twice"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { var_name, .. } if var_name == "EXTRA_ATTEMPTS"));
    }
}
