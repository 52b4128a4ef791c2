//! 社区问答数据结构
//!
//! 文档字段名沿用存储中的 camelCase，结构体字段使用 snake_case。

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::infrastructure::document::Document;
use crate::models::subject::{Icon, Subject};

/// 问题标题长度范围（按字符计）
pub const TITLE_MIN_CHARS: usize = 10;
pub const TITLE_MAX_CHARS: usize = 150;
/// 问题正文最少字符数
pub const CONTENT_MIN_CHARS: usize = 20;
/// 筛选条件中表示"全部"的值
pub const FILTER_ALL: &str = "الكل";

/// 作者引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorRef {
    pub author_id: String,
    pub author_name: String,
    #[serde(rename = "authorPhotoURL", skip_serializing_if = "Option::is_none")]
    pub author_photo_url: Option<String>,
}

impl AuthorRef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, photo_url: Option<String>) -> Self {
        Self {
            author_id: id.into(),
            author_name: name.into(),
            author_photo_url: photo_url.filter(|url| !url.is_empty()),
        }
    }

    fn from_document(doc: &Document) -> Self {
        Self {
            author_id: doc.get_string("authorId"),
            author_name: doc.get_string("authorName"),
            author_photo_url: doc.get_opt_string("authorPhotoURL"),
        }
    }
}

/// 社区问题
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommunityQuestion {
    pub id: String,
    pub title: String,
    pub content: String,
    pub tags: Vec<String>,
    /// 净票数（赞成减反对），可以为负
    pub votes: i64,
    /// 计数器不会为负，存储中的负值按 0 读取
    pub answers_count: u64,
    pub views: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grade_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_type: Option<String>,
    #[serde(flatten)]
    pub author: AuthorRef,
    /// ISO-8601
    pub created_at: String,
}

impl CommunityQuestion {
    /// 从存储文档转换，缺失的计数器按 0、缺失的标签按空列表处理
    pub fn from_document(doc: &Document) -> Self {
        Self {
            id: doc.id().to_string(),
            title: doc.get_string("title"),
            content: doc.get_string("content"),
            tags: doc.get_string_array("tags"),
            votes: doc.get_i64("votes"),
            answers_count: doc.get_counter("answersCount"),
            views: doc.get_counter("views"),
            subject: doc.get_opt_string("subject"),
            grade_level: doc.get_opt_string("gradeLevel"),
            question_type: doc.get_opt_string("questionType"),
            author: AuthorRef::from_document(doc),
            created_at: doc.get_iso_timestamp("createdAt"),
        }
    }

    /// 问题所属的已知学科
    pub fn subject_category(&self) -> Option<Subject> {
        self.subject
            .as_deref()
            .and_then(|s| Subject::from_id(s).or_else(|| Subject::from_name(s)))
    }

    /// 列表中显示的学科图标
    pub fn subject_icon(&self) -> Icon {
        self.subject.as_deref().map(Subject::icon_for).unwrap_or_default()
    }
}

/// 回答
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub id: String,
    pub question_id: String,
    #[serde(flatten)]
    pub author: AuthorRef,
    pub content: String,
    /// 与问题的 `votes` 相同，是净票数
    pub votes: i64,
    pub is_accepted: bool,
    /// ISO-8601
    pub created_at: String,
}

impl Answer {
    /// `question_id` 以文档所在的父问题为准
    pub fn from_document(doc: &Document, question_id: &str) -> Self {
        Self {
            id: doc.id().to_string(),
            question_id: question_id.to_string(),
            author: AuthorRef::from_document(doc),
            content: doc.get_string("content"),
            votes: doc.get_i64("votes"),
            is_accepted: doc.get_bool("isAccepted"),
            created_at: doc.get_iso_timestamp("createdAt"),
        }
    }
}

/// 新问题表单
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewQuestion {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub grade_level: Option<String>,
    #[serde(default)]
    pub question_type: Option<String>,
}

impl NewQuestion {
    /// 逗号分隔的标签输入，去空白、去空项、去重（保留首次出现的位置）
    pub fn parse_tags(raw: &str) -> Vec<String> {
        normalize_tags(raw.split(','))
    }

    /// 校验并规范化
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.title = self.title.trim().to_string();
        self.content = self.content.trim().to_string();
        self.tags = normalize_tags(self.tags.iter().map(String::as_str));
        self.subject = normalize_optional(self.subject);
        self.grade_level = normalize_optional(self.grade_level);
        self.question_type = normalize_optional(self.question_type);

        let mut err = ValidationError::new("بيانات السؤال غير صالحة.");
        let title_len = self.title.chars().count();
        if title_len < TITLE_MIN_CHARS {
            err = err.with_field("title", "العنوان يجب أن لا يقل عن 10 أحرف.");
        } else if title_len > TITLE_MAX_CHARS {
            err = err.with_field("title", "العنوان يجب أن لا يتجاوز 150 حرفًا.");
        }
        if self.content.chars().count() < CONTENT_MIN_CHARS {
            err = err.with_field("content", "العرض يجب أن لا يقل عن 20 حرفًا.");
        }
        err.into_result()?;
        Ok(self)
    }
}

/// 新回答表单
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAnswer {
    pub content: String,
    #[serde(flatten)]
    pub author: AuthorRef,
}

impl NewAnswer {
    pub fn validated(mut self) -> Result<Self, ValidationError> {
        self.content = self.content.trim().to_string();

        let mut err = ValidationError::new("بيانات الإجابة غير صالحة.");
        if self.content.is_empty() {
            err = err.with_field("content", "لا يمكن إرسال إجابة فارغة.");
        }
        if self.author.author_id.trim().is_empty() {
            err = err.with_field("authorId", "يجب تسجيل الدخول لتقديم إجابة.");
        }
        err.into_result()?;
        Ok(self)
    }
}

/// 问题列表筛选条件（年级、学科）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionFilter {
    pub grade_level: String,
    pub subject: String,
}

impl Default for QuestionFilter {
    fn default() -> Self {
        Self {
            grade_level: FILTER_ALL.to_string(),
            subject: FILTER_ALL.to_string(),
        }
    }
}

impl QuestionFilter {
    pub fn matches(&self, question: &CommunityQuestion) -> bool {
        field_matches(&self.grade_level, question.grade_level.as_deref())
            && field_matches(&self.subject, question.subject.as_deref())
    }

    pub fn apply<'a>(&self, questions: &'a [CommunityQuestion]) -> Vec<&'a CommunityQuestion> {
        questions.iter().filter(|q| self.matches(q)).collect()
    }
}

fn field_matches(wanted: &str, actual: Option<&str>) -> bool {
    wanted.is_empty() || wanted == FILTER_ALL || actual == Some(wanted)
}

fn normalize_tags<'a>(raw: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.map(str::trim).filter(|t| !t.is_empty()) {
        if !tags.iter().any(|t| t == tag) {
            tags.push(tag.to_string());
        }
    }
    tags
}

fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_question() -> NewQuestion {
        NewQuestion {
            title: "  كيف أحل معادلة من الدرجة الثانية؟ ".to_string(),
            content: "أحتاج شرحًا مفصلًا لطريقة المميز مع مثال.".to_string(),
            tags: vec!["جبر".to_string(), " ".to_string(), "جبر".to_string(), "معادلات".to_string()],
            subject: Some("رياضيات".to_string()),
            grade_level: Some("".to_string()),
            question_type: None,
        }
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            NewQuestion::parse_tags(" جبر, هندسة,,جبر ,"),
            vec!["جبر".to_string(), "هندسة".to_string()]
        );
        assert!(NewQuestion::parse_tags("").is_empty());
    }

    #[test]
    fn test_validated_normalizes_question() {
        let q = new_question().validated().unwrap();
        assert_eq!(q.title, "كيف أحل معادلة من الدرجة الثانية؟");
        assert_eq!(q.tags, vec!["جبر".to_string(), "معادلات".to_string()]);
        assert_eq!(q.grade_level, None);
        assert_eq!(q.subject.as_deref(), Some("رياضيات"));
    }

    #[test]
    fn test_validated_reports_every_bad_field() {
        let q = NewQuestion {
            title: "قصير".to_string(),
            content: "قصير".to_string(),
            ..Default::default()
        };
        let err = q.validated().unwrap_err();
        assert!(err.field("title").is_some());
        assert!(err.field("content").is_some());

        let long = NewQuestion {
            title: "ع".repeat(151),
            ..new_question()
        };
        assert!(long.validated().unwrap_err().field("title").is_some());
    }

    #[test]
    fn test_new_answer_rejects_blank() {
        let answer = NewAnswer {
            content: "   ".to_string(),
            author: AuthorRef::new("", "مستخدم", None),
        };
        let err = answer.validated().unwrap_err();
        assert!(err.field("content").is_some());
        assert!(err.field("authorId").is_some());
    }

    #[test]
    fn test_votes_are_signed_counters_are_not() {
        use crate::infrastructure::document::{CollectionPath, FieldValue, Fields};

        let fields = Fields::from([
            ("title".to_string(), FieldValue::from("سؤال")),
            ("votes".to_string(), FieldValue::Integer(-2)),
            ("answersCount".to_string(), FieldValue::Integer(-1)),
            ("views".to_string(), FieldValue::Integer(7)),
        ]);
        let doc = Document::new(CollectionPath::root("questions").doc("q1"), fields.clone());
        let question = CommunityQuestion::from_document(&doc);
        assert_eq!(question.votes, -2);
        assert_eq!((question.answers_count, question.views), (0, 7));

        let doc = Document::new(
            CollectionPath::root("questions/q1/answers").doc("a1"),
            fields,
        );
        assert_eq!(Answer::from_document(&doc, "q1").votes, -2);
    }

    #[test]
    fn test_filter() {
        let mut q = CommunityQuestion {
            id: "q1".to_string(),
            title: String::new(),
            content: String::new(),
            tags: Vec::new(),
            votes: 0,
            answers_count: 0,
            views: 0,
            subject: Some("فيزياء".to_string()),
            grade_level: Some("بكالوريا".to_string()),
            question_type: None,
            author: AuthorRef::new("u1", "أحمد", None),
            created_at: String::new(),
        };

        assert!(QuestionFilter::default().matches(&q));
        assert_eq!(q.subject_category(), Some(Subject::Physics));
        assert_eq!(q.subject_icon(), Icon::Atom);

        let filter = QuestionFilter {
            grade_level: "بكالوريا".to_string(),
            subject: "رياضيات".to_string(),
        };
        assert!(!filter.matches(&q));
        q.subject = Some("رياضيات".to_string());
        assert!(filter.matches(&q));
        assert_eq!(q.subject_category(), Some(Subject::Math));
        assert_eq!(q.subject_icon(), Icon::Calculator);

        q.subject = Some("فلك".to_string());
        assert_eq!(q.subject_category(), None);
        assert_eq!(q.subject_icon(), Icon::Book);
    }
}
