//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MENTOR__*` 覆盖（双下划线表示嵌套，
//! 如 `MENTOR__LLM__MODEL=anthropic/claude-3.5-sonnet`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub app: AppSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub detector: DetectorSection,
    #[serde(default)]
    pub storage: StorageSection,
}

/// [app] 段：应用名
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppSection {
    pub name: Option<String>,
}

/// [llm] 段：补全端点、模型与固定采样参数
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// OpenAI 兼容端点（默认 OpenRouter）
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// 输出长度上限
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// 固定采样温度
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// 单次补全请求超时（秒）
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".to_string()
}

fn default_model() -> String {
    "anthropic/claude-3.5-sonnet".to_string()
}

fn default_max_tokens() -> u32 {
    2048
}

fn default_temperature() -> f32 {
    0.7
}

fn default_request_timeout() -> u64 {
    60
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// [detector] 段：页面就绪等待上限与描述截断长度
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DetectorSection {
    /// 等待题目出现的上限（毫秒），超时报告「未找到」
    #[serde(default = "default_problem_wait_ms")]
    pub problem_wait_ms: u64,
    /// 等待编辑器代码的上限（毫秒）
    #[serde(default = "default_code_wait_ms")]
    pub code_wait_ms: u64,
    /// 题目描述截断长度（字符）
    #[serde(default = "default_description_max_chars")]
    pub description_max_chars: usize,
}

fn default_problem_wait_ms() -> u64 {
    5000
}

fn default_code_wait_ms() -> u64 {
    3000
}

fn default_description_max_chars() -> usize {
    1000
}

impl Default for DetectorSection {
    fn default() -> Self {
        Self {
            problem_wait_ms: default_problem_wait_ms(),
            code_wait_ms: default_code_wait_ms(),
            description_max_chars: default_description_max_chars(),
        }
    }
}

/// [storage] 段：持久化目录；未设置时使用内存存储
#[derive(Debug, Clone, Deserialize, Default)]
pub struct StorageSection {
    pub data_dir: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app: AppSection::default(),
            llm: LlmSection::default(),
            detector: DetectorSection::default(),
            storage: StorageSection::default(),
        }
    }
}

/// 从 config 目录加载配置，环境变量 MENTOR__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MENTOR__*（双下划线表示嵌套键）
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
        config::Environment::with_prefix("MENTOR")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}
