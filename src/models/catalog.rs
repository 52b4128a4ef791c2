use serde::{Deserialize, Serialize};

use crate::models::quiz::Quiz;

/// 课程内容块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentItem {
    Text {
        value: String,
    },
    Image {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt_text: Option<String>,
    },
    Video {
        value: String,
    },
}

/// 学习模块
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    /// 预计完成时间，例如 "2 hours"
    #[serde(default)]
    pub estimated_time: String,
    #[serde(default)]
    pub content: Vec<ContentItem>,
}

/// 课程目录：所有模块和测验
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub modules: Vec<Module>,
    #[serde(default)]
    pub quizzes: Vec<Quiz>,
    #[serde(skip)]
    pub file_path: Option<String>,
}

impl Catalog {
    pub fn module(&self, id: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.id == id)
    }

    pub fn quiz(&self, id: &str) -> Option<&Quiz> {
        self.quizzes.iter().find(|q| q.id == id)
    }

    /// 某个模块下的所有测验
    pub fn quizzes_for_module<'a>(&'a self, module_id: &'a str) -> impl Iterator<Item = &'a Quiz> + 'a {
        self.quizzes.iter().filter(move |q| q.module_id == module_id)
    }
}
