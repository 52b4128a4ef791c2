use std::collections::BTreeMap;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 输入校验错误（写入前发现）
    #[error("校验错误: {0}")]
    Validation(#[from] ValidationError),
    /// 存储读写错误
    #[error("存储错误: {0}")]
    Persistence(#[from] PersistenceError),
    /// AI 返回格式错误
    #[error("格式错误: {0}")]
    Format(#[from] FormatError),
    /// LLM 服务错误
    #[error("LLM错误: {0}")]
    Llm(#[from] LlmError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

/// 字段级校验错误
///
/// `fields` 的 key 为字段名，value 为面向用户的提示信息。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} ({})", format_fields(.fields))]
pub struct ValidationError {
    pub message: String,
    pub fields: BTreeMap<String, String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// 追加一个字段错误
    pub fn with_field(mut self, field: impl Into<String>, reason: impl Into<String>) -> Self {
        self.fields.insert(field.into(), reason.into());
        self
    }

    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// 没有字段错误时返回 Ok
    pub fn into_result(self) -> Result<(), ValidationError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn format_fields(fields: &BTreeMap<String, String>) -> String {
    fields
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

/// 存储读写错误
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// 读取失败
    #[error("读取 {path} 失败: {reason}")]
    ReadFailed { path: String, reason: String },
    /// 写入失败
    #[error("写入失败 ({path}): {reason}")]
    WriteFailed { path: String, reason: String },
    /// 更新的文档不存在
    #[error("文档不存在: {path}")]
    NotFound { path: String },
    /// 网络请求失败
    #[error("请求失败 ({endpoint}): {source}")]
    RequestFailed {
        endpoint: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 后端返回错误响应
    #[error("后端返回错误响应 ({endpoint}): status={status}, body={body}")]
    BadResponse {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// 文档内容无法解码
    #[error("文档解码失败 ({path}): {reason}")]
    Decode { path: String, reason: String },
}

/// AI 返回结果格式错误
#[derive(Debug, Error)]
pub enum FormatError {
    /// 返回内容不是约定的 JSON 结构
    #[error("无法解析 AI 返回内容: {source} (响应: {response})")]
    InvalidEnvelope {
        response: String,
        #[source]
        source: serde_json::Error,
    },
    /// 缺少必需字段
    #[error("AI 返回内容缺少字段: {field}")]
    MissingField { field: String },
}

/// LLM 服务错误
#[derive(Debug, Error)]
pub enum LlmError {
    /// API 调用失败
    #[error("LLM API调用失败 (模型: {model}): {source}")]
    ApiCallFailed {
        model: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// 返回内容为空
    #[error("LLM返回内容为空 (模型: {model})")]
    EmptyContent { model: String },
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {path}")]
    NotFound { path: String },
    /// 读取文件失败
    #[error("读取文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
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
    /// 必需的配置项缺失
    #[error("缺少配置项: {name}")]
    Missing { name: String },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建存储读取错误
    pub fn read_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Persistence(PersistenceError::ReadFailed {
            path: path.into(),
            reason: reason.to_string(),
        })
    }

    /// 创建存储写入错误
    pub fn write_failed(path: impl Into<String>, reason: impl ToString) -> Self {
        AppError::Persistence(PersistenceError::WriteFailed {
            path: path.into(),
            reason: reason.to_string(),
        })
    }

    /// 创建网络请求错误
    pub fn request_failed(
        endpoint: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        AppError::Persistence(PersistenceError::RequestFailed {
            endpoint: endpoint.into(),
            source: Box::new(source),
        })
    }

    /// 创建LLM API调用错误
    pub fn llm_api_failed(
        model: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        AppError::Llm(LlmError::ApiCallFailed {
            model: model.into(),
            source: source.into(),
        })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Validation(_))
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, AppError::Persistence(_))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_collects_fields() {
        let err = ValidationError::new("表单数据无效")
            .with_field("title", "too short")
            .with_field("content", "too short");

        assert_eq!(err.field("title"), Some("too short"));
        assert!(err.field("tags").is_none());
        let text = err.to_string();
        assert!(text.contains("content: too short"));
        assert!(text.contains("title: too short"));
    }

    #[test]
    fn test_empty_validation_error_is_ok() {
        assert!(ValidationError::new("无").into_result().is_ok());
    }

    #[test]
    fn test_app_error_classification() {
        let err: AppError = ValidationError::new("x").with_field("a", "b").into();
        assert!(err.is_validation());
        assert!(!err.is_persistence());

        let err = AppError::write_failed("questions/q1", "offline");
        assert!(err.is_persistence());
        assert!(err.to_string().contains("questions/q1"));
    }
}
