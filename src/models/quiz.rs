use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// 选项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: String,
    pub text: String,
}

/// 测验中的单选题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: String,
    pub text: String,
    pub options: Vec<QuestionOption>,
    pub correct_option_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

impl QuizQuestion {
    pub fn option(&self, option_id: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.option(&self.correct_option_id)
    }

    pub fn is_correct(&self, option_id: &str) -> bool {
        self.correct_option_id == option_id
    }
}

/// 测验：有序的题目序列，加载后不可变
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub module_id: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub questions: Vec<QuizQuestion>,
}

impl Quiz {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// 检查测验结构
    ///
    /// 每道题至少两个选项、选项 id 不重复、正确答案必须是其中一个选项，
    /// 题目 id 在测验内唯一。
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut err = ValidationError::new(format!("测验 {} 结构无效", self.id));
        let mut question_ids = HashSet::new();

        for (idx, q) in self.questions.iter().enumerate() {
            let key = format!("questions[{}]", idx);
            if !question_ids.insert(q.id.as_str()) {
                err = err.with_field(format!("{}.id", key), format!("重复的题目 id: {}", q.id));
            }
            if q.options.len() < 2 {
                err = err.with_field(format!("{}.options", key), "至少需要两个选项");
            }
            let mut option_ids = HashSet::new();
            if q.options.iter().any(|o| !option_ids.insert(o.id.as_str())) {
                err = err.with_field(format!("{}.options", key), "选项 id 重复");
            }
            if q.correct_option().is_none() {
                err = err.with_field(
                    format!("{}.correct_option_id", key),
                    format!("正确选项 {} 不存在", q.correct_option_id),
                );
            }
        }

        err.into_result()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;

    pub fn question(id: &str, correct: &str) -> QuizQuestion {
        QuizQuestion {
            id: id.to_string(),
            text: format!("题目 {}", id),
            options: vec![
                QuestionOption { id: "opt1".to_string(), text: "A".to_string() },
                QuestionOption { id: "opt2".to_string(), text: "B".to_string() },
                QuestionOption { id: "opt3".to_string(), text: "C".to_string() },
            ],
            correct_option_id: correct.to_string(),
            explanation: Some(format!("解析 {}", id)),
        }
    }

    pub fn quiz(questions: Vec<QuizQuestion>) -> Quiz {
        Quiz {
            id: "algebra-quiz-1".to_string(),
            title: "Algebra Basics Quiz".to_string(),
            module_id: "intro-to-algebra".to_string(),
            description: String::new(),
            questions,
        }
    }
}
