//! 个性化学习推荐
//!
//! 输入校验 → 拼接提示词 → 调用模型 → 在服务边界解析结果。
//! 模型输出不可信：外层 JSON 结构错误返回 `FormatError`，
//! 模块列表格式不对时保留原文，推荐理由照常返回。

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::error::{AppResult, FormatError, ValidationError};
use crate::services::llm_service::TextGenerator;
use crate::utils::truncate_text;

/// 学习历史、测验成绩的最少字符数
pub const MIN_INPUT_CHARS: usize = 10;

const SYSTEM_PROMPT: &str = "You are an expert learning recommendation system. Reply with a single JSON object and nothing else.";

/// 推荐请求
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationInput {
    pub learning_history: String,
    pub quiz_results: String,
    #[serde(default)]
    pub user_preferences: Option<String>,
}

impl RecommendationInput {
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.learning_history = self.learning_history.trim().to_string();
        self.quiz_results = self.quiz_results.trim().to_string();
        self.user_preferences = self
            .user_preferences
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty());

        let mut err = ValidationError::new("Invalid form data.");
        if self.learning_history.chars().count() < MIN_INPUT_CHARS {
            err = err.with_field("learningHistory", "Learning history is too short.");
        }
        if self.quiz_results.chars().count() < MIN_INPUT_CHARS {
            err = err.with_field("quizResults", "Quiz results are too short.");
        }
        err.into_result()?;
        Ok(self)
    }

    pub fn prompt(&self) -> String {
        format!(
            "You are an expert learning recommendation system. You will analyze the user's learning history, quiz results, and preferences to recommend relevant learning modules.\n\n\
             Learning History: {}\n\
             Quiz Results: {}\n\
             User Preferences: {}\n\n\
             Based on this information, recommend a list of learning modules that will help the user improve their understanding and performance.\n\
             Answer with a JSON object with exactly two fields:\n\
             - \"recommendedModules\": a JSON array of strings\n\
             - \"reasoning\": an explanation that refers to specific weaknesses shown in the learning history and quiz results\n\
             Ensure the output is valid JSON.",
            self.learning_history,
            self.quiz_results,
            self.user_preferences.as_deref().unwrap_or(""),
        )
    }
}

/// 推荐的模块列表
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ModuleList {
    Parsed(Vec<String>),
    /// 模型给出的内容不是字符串数组，保留原文用于展示
    Malformed(String),
}

impl ModuleList {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(raw) => match serde_json::from_str::<Vec<String>>(raw.trim()) {
                Ok(modules) => ModuleList::Parsed(modules),
                Err(e) => {
                    debug!("recommendedModules 不是字符串数组: {}", e);
                    ModuleList::Malformed(raw)
                }
            },
            array @ Value::Array(_) => match serde_json::from_value::<Vec<String>>(array.clone()) {
                Ok(modules) => ModuleList::Parsed(modules),
                Err(_) => ModuleList::Malformed(array.to_string()),
            },
            other => ModuleList::Malformed(other.to_string()),
        }
    }

    pub fn is_parsed(&self) -> bool {
        matches!(self, ModuleList::Parsed(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub modules: ModuleList,
    pub reasoning: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope {
    #[serde(default)]
    recommended_modules: Option<Value>,
    reasoning: String,
}

/// 去掉 ```json ... ``` 代码块包裹
fn strip_code_fence(response: &str) -> &str {
    let trimmed = response.trim();
    if let Ok(re) = Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$") {
        if let Some(inner) = re.captures(trimmed).and_then(|c| c.get(1)) {
            return inner.as_str();
        }
    }
    trimmed
}

/// 解析模型返回的推荐结果
pub fn parse_recommendation_response(response: &str) -> Result<Recommendation, FormatError> {
    let body = strip_code_fence(response);
    let envelope: Envelope = serde_json::from_str(body).map_err(|e| FormatError::InvalidEnvelope {
        response: truncate_text(response, 200),
        source: e,
    })?;

    let modules = match envelope.recommended_modules {
        Some(Value::Null) | None => {
            return Err(FormatError::MissingField {
                field: "recommendedModules".to_string(),
            })
        }
        Some(value) => ModuleList::from_value(value),
    };

    if !modules.is_parsed() {
        warn!("⚠️ 推荐模块格式异常，保留原始内容");
    }

    Ok(Recommendation {
        modules,
        reasoning: envelope.reasoning.trim().to_string(),
    })
}

/// 推荐服务
pub struct RecommendationService<G> {
    generator: G,
}

impl<G: TextGenerator> RecommendationService<G> {
    pub fn new(generator: G) -> Self {
        Self { generator }
    }

    pub async fn recommend(&self, input: RecommendationInput) -> AppResult<Recommendation> {
        let input = input.validated()?;
        info!("🔍 正在生成学习推荐...");

        let response = self
            .generator
            .generate(&input.prompt(), Some(SYSTEM_PROMPT))
            .await?;
        debug!("模型响应: {}", truncate_text(&response, 120));

        let recommendation = parse_recommendation_response(&response)?;
        info!("✓ 推荐生成完成");
        Ok(recommendation)
    }
}
