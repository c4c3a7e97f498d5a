//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `CALCLAB__*` 覆盖（双下划线表示嵌套，如 `CALCLAB__LLM__PROVIDER=openai`）。
//! API Key 不进配置文件，只从环境变量读取（GEMINI_API_KEY / OPENAI_API_KEY）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::memory::DEFAULT_HISTORY_LIMIT;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
}

/// [app] 段：数据目录、历史条数上限
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 偏好数据库与日志所在目录；未设置时用平台数据目录
    pub data_dir: Option<PathBuf>,
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            data_dir: None,
            history_limit: default_history_limit(),
        }
    }
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

impl AppSection {
    /// 数据目录：配置 > 平台数据目录 > ./data
    pub fn resolve_data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .or_else(|| {
                directories::ProjectDirs::from("com.local", "CalcLab", "CalcLab")
                    .map(|dirs| dirs.data_dir().to_path_buf())
            })
            .unwrap_or_else(|| PathBuf::from("data"))
    }
}

/// [llm] 段：后端选择与超时
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：gemini / openai / mock
    #[serde(default = "default_provider")]
    pub provider: String,
    pub model: Option<String>,
    pub base_url: Option<String>,
    #[serde(default)]
    pub gemini: LlmModelSection,
    #[serde(default)]
    pub openai: LlmModelSection,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            base_url: None,
            gemini: LlmModelSection::default(),
            openai: LlmModelSection::default(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_provider() -> String {
    "gemini".to_string()
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LlmModelSection {
    pub model: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次 AI 请求超时（秒），0 表示不限
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// 从 config 目录加载配置，环境变量 CALCLAB__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 CALCLAB__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CALCLAB")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.app.history_limit, 20);
        assert_eq!(cfg.llm.provider, "gemini");
        assert_eq!(cfg.llm.timeouts.request, 60);
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calclab.toml");
        std::fs::write(
            &path,
            r#"
[app]
data_dir = "/tmp/calclab-test"
history_limit = 5

[llm]
provider = "mock"

[llm.timeouts]
request = 0
"#,
        )
        .unwrap();

        let cfg = load_config(Some(path)).unwrap();
        assert_eq!(cfg.app.history_limit, 5);
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.llm.timeouts.request, 0);
        assert_eq!(
            cfg.app.resolve_data_dir(),
            PathBuf::from("/tmp/calclab-test")
        );
    }

    #[test]
    fn test_env_overrides_file_defaults() {
        // 与 test_load_explicit_file 取相同的值，并行执行时互不影响
        std::env::set_var("CALCLAB__LLM__PROVIDER", "mock");
        std::env::set_var("CALCLAB__APP__HISTORY_LIMIT", "5");

        let cfg = load_config(None);

        std::env::remove_var("CALCLAB__LLM__PROVIDER");
        std::env::remove_var("CALCLAB__APP__HISTORY_LIMIT");

        let cfg = cfg.unwrap();
        assert_eq!(cfg.llm.provider, "mock");
        assert_eq!(cfg.app.history_limit, 5);
    }
}
