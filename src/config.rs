//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `PLANEXEC__*` 覆盖（双下划线表示嵌套，如 `PLANEXEC__LLM__MODEL=qwen-max`）。

use std::path::PathBuf;

use serde::Deserialize;

use crate::core::DEFAULT_MAX_STEPS;
use crate::llm::RetryConfig;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub app: AppSection,
    pub llm: LlmSection,
}

/// [app] 段：应用名、步数预算、prompt 覆盖目录
#[derive(Debug, Clone, Deserialize)]
pub struct AppSection {
    pub name: Option<String>,
    /// 主循环最多消耗的步数（每次执行 + 重规划算一步）
    #[serde(default = "default_max_steps")]
    pub max_steps: usize,
    /// 存放 planner.md / replanner.md 等模板的目录，未设置时用内置模板
    pub prompts_dir: Option<PathBuf>,
}

impl Default for AppSection {
    fn default() -> Self {
        Self {
            name: None,
            max_steps: default_max_steps(),
            prompts_dir: None,
        }
    }
}

fn default_max_steps() -> usize {
    DEFAULT_MAX_STEPS
}

/// [llm] 段：后端选择、凭证、超时与重试
#[derive(Debug, Clone, Deserialize)]
pub struct LlmSection {
    /// 后端：dashscope / openai / deepseek（均为 OpenAI 兼容接口）
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_model")]
    pub model: String,
    pub base_url: Option<String>,
    /// 直接写在配置里的 Key；优先于 api_key_env
    pub api_key: Option<String>,
    /// 存放 Key 的环境变量名
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: default_model(),
            base_url: None,
            api_key: None,
            api_key_env: default_api_key_env(),
            timeouts: LlmTimeoutsSection::default(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_provider() -> String {
    "dashscope".to_string()
}

fn default_model() -> String {
    "qwen-plus".to_string()
}

fn default_api_key_env() -> String {
    "DASHSCOPE_API_KEY".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmTimeoutsSection {
    /// 单次请求超时（秒）
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

impl LlmSection {
    /// 解析 API Key：配置中的非空值优先，否则读 api_key_env 指向的环境变量
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| {
                std::env::var(&self.api_key_env)
                    .ok()
                    .filter(|k| !k.trim().is_empty())
            })
    }
}

/// 从 config 目录加载配置，环境变量 PLANEXEC__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml，找到则作为第一源
/// 2. 若传入 config_path，则追加该文件（可覆盖前面的键；文件不存在时报错）
/// 3. 最后叠加环境变量 PLANEXEC__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    for name in ["config/default", "../config/default"] {
        if std::path::Path::new(&format!("{}.toml", name)).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(path) = config_path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    builder = builder.add_source(
        config::Environment::with_prefix("PLANEXEC")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
