//! LLM 服务 - 业务能力层
//!
//! 只负责"调用模型拿到文本"，不关心提示词和结果解析
//!
//! ## 技术栈
//! - 使用 `async-openai` crate 进行 API 调用
//! - 支持自定义 API 端点和模型
//! - 兼容 OpenAI API 的服务（如 Azure, Gemini 等）

use std::future::Future;

use async_openai::{
    config::OpenAIConfig,
    types::chat::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
    Client,
};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LlmError};

/// 文本生成能力
///
/// 推荐服务只依赖这一个接口，测试时可以替换成固定输出。
pub trait TextGenerator: Send + Sync {
    fn generate(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> impl Future<Output = AppResult<String>> + Send;
}

/// LLM 服务
pub struct LlmService {
    client: Client<OpenAIConfig>,
    model_name: String,
}

impl LlmService {
    /// 创建新的 LLM 服务
    pub fn new(config: &Config) -> Self {
        // 配置 OpenAI 客户端（兼容 OpenAI API 的服务）
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.llm_api_key)
            .with_api_base(&config.llm_api_base_url);

        Self {
            client: Client::with_config(openai_config),
            model_name: config.llm_model_name.clone(),
        }
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// 通用的 LLM 调用函数
    ///
    /// # 参数
    /// - `user_message`: 用户消息内容
    /// - `system_message`: 系统消息（可选）
    ///
    /// # 返回
    /// 去掉首尾空白的响应内容
    ///
    /// # 示例
    /// ```no_run
    /// # use edumentor::services::LlmService;
    /// # async fn example(service: &LlmService) -> edumentor::error::AppResult<()> {
    /// let response = service.send_to_llm("عرّف المتغير في الجبر", None).await?;
    /// println!("LLM 响应: {}", response);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn send_to_llm(
        &self,
        user_message: &str,
        system_message: Option<&str>,
    ) -> AppResult<String> {
        debug!("调用 LLM API，模型: {}", self.model_name);
        debug!("用户消息长度: {} 字符", user_message.chars().count());

        let api_err = |e| AppError::llm_api_failed(&self.model_name, e);
        let mut messages = Vec::new();

        if let Some(sys_msg) = system_message {
            let system_msg = ChatCompletionRequestSystemMessageArgs::default()
                .content(sys_msg)
                .build()
                .map_err(api_err)?;
            messages.push(ChatCompletionRequestMessage::System(system_msg));
        }

        let user_msg = ChatCompletionRequestUserMessageArgs::default()
            .content(user_message)
            .build()
            .map_err(api_err)?;
        messages.push(ChatCompletionRequestMessage::User(user_msg));

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model_name)
            .messages(messages)
            .temperature(0.3)
            .max_tokens(1024u32)
            .build()
            .map_err(api_err)?;

        let response = self.client.chat().create(request).await.map_err(|e| {
            warn!("LLM API 调用失败: {}", e);
            api_err(e)
        })?;

        debug!("LLM API 调用成功");

        let content = response
            .choices
            .first()
            .and_then(|choice| choice.message.content.clone())
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| LlmError::EmptyContent {
                model: self.model_name.clone(),
            })?;

        Ok(content.trim().to_string())
    }
}

impl TextGenerator for LlmService {
    async fn generate(&self, user_message: &str, system_message: Option<&str>) -> AppResult<String> {
        self.send_to_llm(user_message, system_message).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 需要设置 LLM_API_KEY 等环境变量
    #[tokio::test]
    #[ignore]
    async fn test_send_to_llm_simple() {
        let _ = tracing_subscriber::fmt::try_init();

        let config = Config::from_env();
        assert!(config.has_llm_credentials(), "缺少 LLM_API_KEY");
        let service = LlmService::new(&config);

        let response = service
            .send_to_llm("ما هو المتغير في الجبر؟", Some("أجب بجملة واحدة."))
            .await
            .unwrap();
        println!("LLM 响应: {}", response);
        assert!(!response.is_empty());
    }

    #[test]
    fn test_model_name_from_config() {
        let config = Config {
            llm_model_name: "test-model".to_string(),
            ..Config::default()
        };
        assert_eq!(LlmService::new(&config).model_name(), "test-model");
    }
}
