//! # EduMentor
//!
//! 阿拉伯语学习平台的核心逻辑：测验流程、社区问答数据层、个性化推荐
//!
//! ## 架构设计
//!
//! 本系统采用分层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有后端连接，只暴露文档存储能力
//! - `DocumentStore` - 读文档 / 排序查询 / 原子批量写入
//! - `MemoryStore`、`FirestoreRestStore` - 两种实现
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `CommunityDataStore` - 问题与回答的读写，维护 `answersCount`
//! - `ProfileService` - 用户资料
//! - `LlmService` / `RecommendationService` - 模型调用与推荐结果解析
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 纯同步状态机
//! - `QuizRunner` - 逐题作答、计分、回顾
//!
//! ### 数据
//! - `models/` - 课程目录、测验、社区问答、用户、学习进度
//! - `models/loaders` - TOML 课程目录加载
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, CounterMode};
pub use error::{AppError, AppResult};
pub use infrastructure::{DocumentStore, FirestoreRestStore, MemoryStore};
pub use models::{Catalog, Quiz};
pub use services::{CommunityDataStore, Fetched, ProfileService, RecommendationService};
pub use workflow::{QuizRunner, QuizState};
