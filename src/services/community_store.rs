//! 社区问答数据层
//!
//! 集合布局：
//! - `questions/{questionId}`
//! - `questions/{questionId}/answers/{answerId}`
//!
//! 问题文档上的 `answersCount` 是冗余计数，写回答时与回答本身在同一批次中提交。

use tracing::{debug, error, info, warn};

use crate::config::CounterMode;
use crate::error::{AppError, AppResult, ValidationError};
use crate::infrastructure::document::{
    field_writes, CollectionPath, Document, DocumentPath, FieldWrite, OrderBy, WriteBatch,
};
use crate::infrastructure::document_store::DocumentStore;
use crate::models::community::{Answer, AuthorRef, CommunityQuestion, NewAnswer, NewQuestion};

pub const QUESTIONS_COLLECTION: &str = "questions";
pub const ANSWERS_COLLECTION: &str = "answers";

/// 读取结果
///
/// 区分"没有数据"和"读取失败"，需要旧行为的调用方用 `into_items()` 统一成空列表。
#[derive(Debug)]
pub enum Fetched<T> {
    Loaded(Vec<T>),
    Empty,
    Failed(AppError),
}

impl<T> Fetched<T> {
    fn from_items(items: Vec<T>) -> Self {
        if items.is_empty() {
            Fetched::Empty
        } else {
            Fetched::Loaded(items)
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Fetched::Loaded(items) => items,
            Fetched::Empty | Fetched::Failed(_) => &[],
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Fetched::Loaded(items) => items,
            Fetched::Empty | Fetched::Failed(_) => Vec::new(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Fetched::Failed(_))
    }

    pub fn error(&self) -> Option<&AppError> {
        match self {
            Fetched::Failed(e) => Some(e),
            _ => None,
        }
    }

    pub fn into_result(self) -> AppResult<Vec<T>> {
        match self {
            Fetched::Loaded(items) => Ok(items),
            Fetched::Empty => Ok(Vec::new()),
            Fetched::Failed(e) => Err(e),
        }
    }
}

/// 社区问答存储
pub struct CommunityDataStore<S> {
    store: S,
    counter_mode: CounterMode,
}

impl<S: DocumentStore> CommunityDataStore<S> {
    pub fn new(store: S, counter_mode: CounterMode) -> Self {
        Self { store, counter_mode }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn counter_mode(&self) -> CounterMode {
        self.counter_mode
    }

    fn questions() -> CollectionPath {
        CollectionPath::root(QUESTIONS_COLLECTION)
    }

    fn question_path(question_id: &str) -> DocumentPath {
        Self::questions().doc(question_id)
    }

    fn answers(question_id: &str) -> CollectionPath {
        Self::question_path(question_id).collection(ANSWERS_COLLECTION)
    }

    fn require_question_id(question_id: &str) -> AppResult<&str> {
        let id = question_id.trim();
        if id.is_empty() {
            return Err(ValidationError::new("معرّف السؤال مفقود.")
                .with_field("questionId", "معرّف السؤال مطلوب.")
                .into());
        }
        Ok(id)
    }

    /// 发布问题，返回新问题 id
    ///
    /// 计数器全部从 0 开始，`createdAt` 由服务端写入。
    pub async fn add_question(&self, data: NewQuestion, author: &AuthorRef) -> AppResult<String> {
        let data = data.validated()?;
        if author.author_id.trim().is_empty() {
            return Err(ValidationError::new("بيانات السؤال غير صالحة.")
                .with_field("authorId", "يجب تسجيل الدخول لنشر سؤال.")
                .into());
        }

        let path = Self::questions().new_doc();
        let question_id = path.id().to_string();

        let mut batch = WriteBatch::new();
        batch.set(
            path,
            field_writes([
                ("title", FieldWrite::value(data.title)),
                ("content", FieldWrite::value(data.content)),
                ("tags", FieldWrite::value(data.tags)),
                ("subject", FieldWrite::value(data.subject)),
                ("gradeLevel", FieldWrite::value(data.grade_level)),
                ("questionType", FieldWrite::value(data.question_type)),
                ("authorId", FieldWrite::value(author.author_id.as_str())),
                ("authorName", FieldWrite::value(author.author_name.as_str())),
                ("authorPhotoURL", FieldWrite::value(author.author_photo_url.clone())),
                ("votes", FieldWrite::value(0i64)),
                ("answersCount", FieldWrite::value(0i64)),
                ("views", FieldWrite::value(0i64)),
                ("createdAt", FieldWrite::ServerTimestamp),
            ]),
        );

        self.store.commit(batch).await.map_err(|e| {
            error!("发布问题失败: {}", e);
            e
        })?;

        info!("✓ 问题已发布: {}", question_id);
        Ok(question_id)
    }

    /// 所有问题，按创建时间从新到旧
    pub async fn get_questions(&self) -> Fetched<CommunityQuestion> {
        let order = OrderBy::desc("createdAt");
        match self.store.query(&Self::questions(), Some(&order)).await {
            Ok(docs) => {
                debug!("读取到 {} 个问题", docs.len());
                Fetched::from_items(docs.iter().map(CommunityQuestion::from_document).collect())
            }
            Err(e) => {
                error!("读取问题列表失败: {}", e);
                Fetched::Failed(e)
            }
        }
    }

    /// 单个问题，不存在时为 None
    pub async fn get_question(&self, question_id: &str) -> AppResult<Option<CommunityQuestion>> {
        let id = Self::require_question_id(question_id)?;
        let doc = self.store.get(&Self::question_path(id)).await?;
        Ok(doc.as_ref().map(CommunityQuestion::from_document))
    }

    /// 发布回答，返回新回答 id
    ///
    /// 先读取父问题，再把"写回答"和"更新计数"放进同一批次原子提交。
    /// 父问题不存在时仍写入回答，只跳过计数更新。
    pub async fn add_answer(&self, question_id: &str, data: NewAnswer) -> AppResult<String> {
        let question_id = Self::require_question_id(question_id)?;
        let data = data.validated()?;

        let question_path = Self::question_path(question_id);
        let parent = self.store.get(&question_path).await.map_err(|e| {
            error!("读取问题 {} 失败: {}", question_id, e);
            e
        })?;

        let answer_path = Self::answers(question_id).new_doc();
        let answer_id = answer_path.id().to_string();

        let mut batch = WriteBatch::new();
        batch.set(
            answer_path,
            field_writes([
                ("questionId", FieldWrite::value(question_id)),
                ("content", FieldWrite::value(data.content)),
                ("authorId", FieldWrite::value(data.author.author_id)),
                ("authorName", FieldWrite::value(data.author.author_name)),
                ("authorPhotoURL", FieldWrite::value(data.author.author_photo_url)),
                ("votes", FieldWrite::value(0i64)),
                ("isAccepted", FieldWrite::value(false)),
                ("createdAt", FieldWrite::ServerTimestamp),
            ]),
        );

        match parent {
            Some(doc) => {
                batch.update(question_path, field_writes([("answersCount", self.counter_write(&doc))]));
            }
            None => warn!("⚠️ 问题 {} 不存在，只写入回答，不更新计数", question_id),
        }

        self.store.commit(batch).await.map_err(|e| {
            error!("发布回答失败 (问题 {}): {}", question_id, e);
            e
        })?;

        info!("✓ 回答已发布: {} → 问题 {}", answer_id, question_id);
        Ok(answer_id)
    }

    fn counter_write(&self, parent: &Document) -> FieldWrite {
        match self.counter_mode {
            CounterMode::AtomicIncrement => FieldWrite::Increment(1),
            CounterMode::ReadThenWrite => {
                let previous = parent.get_counter("answersCount");
                FieldWrite::value(previous.saturating_add(1).min(i64::MAX as u64) as i64)
            }
        }
    }

    /// 某个问题的回答，按创建时间从旧到新
    pub async fn get_answers(&self, question_id: &str) -> Fetched<Answer> {
        let question_id = match Self::require_question_id(question_id) {
            Ok(id) => id,
            Err(e) => return Fetched::Failed(e),
        };

        let order = OrderBy::asc("createdAt");
        match self.store.query(&Self::answers(question_id), Some(&order)).await {
            Ok(docs) => Fetched::from_items(
                docs.iter()
                    .map(|doc| Answer::from_document(doc, question_id))
                    .collect(),
            ),
            Err(e) => {
                error!("读取问题 {} 的回答失败: {}", question_id, e);
                Fetched::Failed(e)
            }
        }
    }
}
