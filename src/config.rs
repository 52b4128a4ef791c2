use tracing::warn;

use crate::error::ConfigError;

/// 答案计数的更新方式
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum CounterMode {
    /// 在同一批次中使用存储原生的自增操作
    #[default]
    AtomicIncrement,
    /// 先读取当前值，再写入 `当前值 + 1`（并发时可能丢失更新）
    ReadThenWrite,
}

impl std::str::FromStr for CounterMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "atomic" | "atomic_increment" | "increment" => Ok(CounterMode::AtomicIncrement),
            "read_then_write" | "read-then-write" | "legacy" => Ok(CounterMode::ReadThenWrite),
            other => Err(ConfigError::EnvVarParseFailed {
                var_name: "EDUMENTOR_COUNTER_MODE".to_string(),
                value: other.to_string(),
                expected_type: "CounterMode".to_string(),
            }),
        }
    }
}

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 课程与测验目录文件
    pub catalog_path: String,
    /// 默认日志级别（RUST_LOG 优先）
    pub log_level: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 答案计数更新方式
    pub counter_mode: CounterMode,
    // --- LLM 配置 ---
    pub llm_api_key: String,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
    // --- 文档存储配置 ---
    pub firestore_api_base_url: String,
    pub firestore_project_id: String,
    pub firestore_auth_token: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog_path: "data/catalog.toml".to_string(),
            log_level: "info".to_string(),
            verbose_logging: false,
            counter_mode: CounterMode::default(),
            llm_api_key: String::new(),
            llm_api_base_url: "https://api.openai.com/v1".to_string(),
            llm_model_name: "gpt-4o-mini".to_string(),
            firestore_api_base_url: "https://firestore.googleapis.com/v1".to_string(),
            firestore_project_id: String::new(),
            firestore_auth_token: None,
        }
    }
}

impl Config {
    /// 只读取日志相关的环境变量，其余为默认值
    ///
    /// 用于在解析完整配置之前初始化日志。
    pub fn logging_from_env() -> Self {
        let default = Self::default();
        Self {
            log_level: std::env::var("EDUMENTOR_LOG_LEVEL").unwrap_or(default.log_level),
            verbose_logging: std::env::var("VERBOSE_LOGGING").ok().and_then(|v| v.parse().ok()).unwrap_or(default.verbose_logging),
            ..default
        }
    }

    pub fn from_env() -> Self {
        let default = Self::logging_from_env();
        Self {
            catalog_path: std::env::var("EDUMENTOR_CATALOG").unwrap_or(default.catalog_path),
            counter_mode: counter_mode_or(std::env::var("EDUMENTOR_COUNTER_MODE").ok().as_deref(), default.counter_mode),
            llm_api_key: std::env::var("LLM_API_KEY").unwrap_or(default.llm_api_key),
            llm_api_base_url: std::env::var("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: std::env::var("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
            firestore_api_base_url: std::env::var("FIRESTORE_API_BASE_URL").unwrap_or(default.firestore_api_base_url),
            firestore_project_id: std::env::var("FIRESTORE_PROJECT_ID").unwrap_or(default.firestore_project_id),
            firestore_auth_token: std::env::var("FIRESTORE_AUTH_TOKEN").ok().filter(|t| !t.is_empty()),
            ..default
        }
    }

    /// 是否配置了 LLM 访问凭据
    pub fn has_llm_credentials(&self) -> bool {
        !self.llm_api_key.is_empty()
    }

    /// 远程文档存储所需的项目 ID
    pub fn require_project_id(&self) -> Result<&str, ConfigError> {
        if self.firestore_project_id.is_empty() {
            Err(ConfigError::Missing {
                name: "FIRESTORE_PROJECT_ID".to_string(),
            })
        } else {
            Ok(&self.firestore_project_id)
        }
    }
}

/// 解析计数方式，无效值记录警告后使用默认值
fn counter_mode_or(raw: Option<&str>, default: CounterMode) -> CounterMode {
    match raw.map(str::parse::<CounterMode>) {
        None => default,
        Some(Ok(mode)) => mode,
        Some(Err(e)) => {
            warn!("⚠️ {}，使用默认值 {:?}", e, default);
            default
        }
    }
}
