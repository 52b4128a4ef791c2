use serde::{Deserialize, Serialize};

use crate::infrastructure::document::Document;

/// 身份提供方给出的已认证身份
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthIdentity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
}

impl AuthIdentity {
    /// 用户名推导：显式用户名 → 显示名称 → 邮箱前缀 → "User"
    pub fn default_username(&self, requested: Option<&str>) -> String {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .or_else(|| self.display_name.clone().filter(|s| !s.is_empty()))
            .or_else(|| {
                self.email
                    .as_deref()
                    .and_then(|e| e.split('@').next())
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "User".to_string())
    }

    /// 回答/提问时显示的作者名
    pub fn author_name(&self) -> String {
        self.display_name
            .clone()
            .filter(|s| !s.is_empty())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| "مستخدم مجهول".to_string())
    }
}

/// 存储中的用户资料
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub username: String,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    /// ISO-8601
    pub created_at: String,
    pub interests: Vec<String>,
}

impl UserProfile {
    pub fn from_document(doc: &Document) -> Self {
        Self {
            uid: doc.id().to_string(),
            email: doc.get_opt_string("email"),
            display_name: doc.get_opt_string("displayName"),
            username: doc.get_string("username"),
            photo_url: doc.get_opt_string("photoURL"),
            created_at: doc.get_iso_timestamp("createdAt"),
            interests: doc.get_string_array("interests"),
        }
    }
}

/// 身份数据与资料的合并视图
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub username: Option<String>,
    #[serde(rename = "photoURL")]
    pub photo_url: Option<String>,
    pub created_at: Option<String>,
    pub interests: Vec<String>,
}

impl AppUser {
    /// 资料中的值优先，缺失时回退到身份数据
    pub fn merge(identity: &AuthIdentity, profile: &UserProfile) -> Self {
        Self {
            uid: identity.uid.clone(),
            email: identity.email.clone().or_else(|| profile.email.clone()),
            display_name: profile
                .display_name
                .clone()
                .or_else(|| identity.display_name.clone()),
            username: Some(profile.username.clone()).filter(|u| !u.is_empty()),
            photo_url: profile.photo_url.clone().or_else(|| identity.photo_url.clone()),
            created_at: Some(profile.created_at.clone()),
            interests: profile.interests.clone(),
        }
    }

    /// 用户列表搜索：显示名称、用户名、邮箱，忽略大小写
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }
        [&self.display_name, &self.username, &self.email]
            .into_iter()
            .flatten()
            .any(|value| value.to_lowercase().contains(&term))
    }
}

impl From<UserProfile> for AppUser {
    fn from(profile: UserProfile) -> Self {
        Self {
            uid: profile.uid,
            email: profile.email,
            display_name: profile.display_name,
            username: Some(profile.username).filter(|u| !u.is_empty()),
            photo_url: profile.photo_url,
            created_at: Some(profile.created_at),
            interests: profile.interests,
        }
    }
}

/// 身份提供方错误码对应的提示信息
pub fn auth_error_message(code: &str) -> &'static str {
    match code {
        "auth/invalid-email" => "البريد الإلكتروني الذي أدخلته غير صالح.",
        "auth/user-disabled" => "تم تعطيل هذا الحساب.",
        "auth/user-not-found" => "لم يتم العثور على حساب بهذا البريد الإلكتروني.",
        "auth/wrong-password" => "كلمة المرور غير صحيحة.",
        "auth/email-already-in-use" => "هذا البريد الإلكتروني مُستخدم بالفعل.",
        "auth/weak-password" => "كلمة المرور ضعيفة جدًا. يجب أن تتكون من 6 أحرف على الأقل.",
        "auth/operation-not-allowed" => "تسجيل الدخول بكلمة المرور معطل لهذا المشروع.",
        "auth/popup-closed-by-user" => "تم إغلاق نافذة تسجيل الدخول بواسطة جوجل.",
        "auth/cancelled-popup-request" => "تم إلغاء طلب نافذة تسجيل الدخول بواسطة جوجل.",
        "auth/account-exists-with-different-credential" => {
            "يوجد حساب بالفعل بنفس عنوان البريد الإلكتروني ولكن ببيانات اعتماد تسجيل دخول مختلفة."
        }
        _ => "حدث خطأ غير متوقع. يرجى المحاولة مرة أخرى.",
    }
}
