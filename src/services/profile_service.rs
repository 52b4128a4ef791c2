use tracing::{error, info};

use crate::error::{AppResult, ValidationError};
use crate::infrastructure::document::{field_writes, CollectionPath, DocumentPath, FieldWrite, OrderBy, WriteBatch};
use crate::infrastructure::document_store::DocumentStore;
use crate::models::user::{AppUser, AuthIdentity, UserProfile};
use crate::services::community_store::Fetched;

pub const USERS_COLLECTION: &str = "users";

/// 用户资料服务（`users/{uid}`）
pub struct ProfileService<S> {
    store: S,
}

impl<S: DocumentStore> ProfileService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    fn user_path(uid: &str) -> AppResult<DocumentPath> {
        let uid = uid.trim();
        if uid.is_empty() {
            return Err(ValidationError::new("معرّف المستخدم مفقود.")
                .with_field("uid", "معرّف المستخدم مطلوب.")
                .into());
        }
        Ok(CollectionPath::root(USERS_COLLECTION).doc(uid))
    }

    /// 登录或注册后调用：资料不存在时创建，存在时原样返回
    pub async fn ensure_profile(
        &self,
        identity: &AuthIdentity,
        username: Option<&str>,
    ) -> AppResult<AppUser> {
        let path = Self::user_path(&identity.uid)?;

        if let Some(doc) = self.store.get(&path).await? {
            return Ok(AppUser::merge(identity, &UserProfile::from_document(&doc)));
        }

        let username = identity.default_username(username);
        // 身份提供方没有显示名称时用用户名代替
        let display_name = identity
            .display_name
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| username.clone());
        let mut batch = WriteBatch::new();
        batch.set(
            path.clone(),
            field_writes([
                ("uid", FieldWrite::value(identity.uid.as_str())),
                ("email", FieldWrite::value(identity.email.clone())),
                ("displayName", FieldWrite::value(display_name.as_str())),
                ("username", FieldWrite::value(username.as_str())),
                ("photoURL", FieldWrite::value(identity.photo_url.clone())),
                ("interests", FieldWrite::value(Vec::<String>::new())),
                ("createdAt", FieldWrite::ServerTimestamp),
            ]),
        );
        self.store.commit(batch).await.map_err(|e| {
            error!("创建用户资料失败 ({}): {}", identity.uid, e);
            e
        })?;
        info!("✓ 已创建用户资料: {} ({})", identity.uid, username);

        let created = self
            .store
            .get(&path)
            .await?
            .map(|doc| UserProfile::from_document(&doc));
        Ok(match created {
            Some(profile) => AppUser::merge(identity, &profile),
            None => AppUser {
                uid: identity.uid.clone(),
                email: identity.email.clone(),
                display_name: Some(display_name),
                username: Some(username),
                photo_url: identity.photo_url.clone(),
                created_at: None,
                interests: Vec::new(),
            },
        })
    }

    pub async fn get_profile(&self, uid: &str) -> AppResult<Option<UserProfile>> {
        let path = Self::user_path(uid)?;
        Ok(self
            .store
            .get(&path)
            .await?
            .map(|doc| UserProfile::from_document(&doc)))
    }

    /// 覆盖兴趣列表，空白项会被丢弃
    pub async fn update_interests(&self, uid: &str, interests: &[String]) -> AppResult<()> {
        let path = Self::user_path(uid)?;
        let interests: Vec<String> = interests
            .iter()
            .map(|i| i.trim().to_string())
            .filter(|i| !i.is_empty())
            .collect();

        let mut batch = WriteBatch::new();
        batch.update(path, field_writes([("interests", FieldWrite::value(interests))]));
        self.store.commit(batch).await
    }

    /// 所有用户资料，按显示名称排序
    pub async fn get_all_profiles(&self) -> Fetched<AppUser> {
        let order = OrderBy::asc("displayName");
        match self
            .store
            .query(&CollectionPath::root(USERS_COLLECTION), Some(&order))
            .await
        {
            Ok(docs) if docs.is_empty() => Fetched::Empty,
            Ok(docs) => Fetched::Loaded(
                docs.iter()
                    .map(|doc| AppUser::from(UserProfile::from_document(doc)))
                    .collect(),
            ),
            Err(e) => {
                error!("读取用户列表失败: {}", e);
                Fetched::Failed(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{AppError, PersistenceError};
    use crate::infrastructure::memory_store::MemoryStore;

    fn identity(uid: &str, name: Option<&str>, email: &str) -> AuthIdentity {
        AuthIdentity {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            display_name: name.map(str::to_string),
            photo_url: None,
        }
    }

    #[tokio::test]
    async fn test_ensure_profile_is_get_or_create() {
        let service = ProfileService::new(MemoryStore::new());
        let ident = identity("u1", None, "layla@example.com");

        let user = service.ensure_profile(&ident, None).await.unwrap();
        assert_eq!(user.username.as_deref(), Some("layla"));
        assert_eq!(user.display_name.as_deref(), Some("layla"));
        assert!(user.created_at.is_some());

        let stored = service.get_profile("u1").await.unwrap().unwrap();
        assert_eq!(stored.display_name.as_deref(), Some("layla"));

        service
            .update_interests("u1", &["الفيزياء".to_string(), " ".to_string()])
            .await
            .unwrap();
        let again = service.ensure_profile(&ident, Some("ignored")).await.unwrap();
        assert_eq!(again.username.as_deref(), Some("layla"));
        assert_eq!(again.interests, vec!["الفيزياء"]);
    }

    #[tokio::test]
    async fn test_update_missing_profile_fails() {
        let service = ProfileService::new(MemoryStore::new());
        let err = service
            .update_interests("ghost", &["x".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Persistence(PersistenceError::NotFound { .. })));
        assert!(service.get_profile("").await.unwrap_err().is_validation());
    }

    #[tokio::test]
    async fn test_all_profiles_sorted_by_display_name() {
        let service = ProfileService::new(MemoryStore::new());
        service
            .ensure_profile(&identity("u1", Some("Zaid"), "z@example.com"), None)
            .await
            .unwrap();
        service
            .ensure_profile(&identity("u2", Some("Amina"), "a@example.com"), None)
            .await
            .unwrap();

        let users = service.get_all_profiles().await.into_items();
        let names: Vec<_> = users.iter().filter_map(|u| u.display_name.as_deref()).collect();
        assert_eq!(names, vec!["Amina", "Zaid"]);

        // 没有显示名称的用户按用户名参与排序
        service
            .ensure_profile(&identity("u3", None, "mona@example.com"), None)
            .await
            .unwrap();
        let users = service.get_all_profiles().await.into_items();
        let names: Vec<_> = users.iter().filter_map(|u| u.display_name.as_deref()).collect();
        assert_eq!(names, vec!["Amina", "Zaid", "mona"]);
        assert_eq!(users.iter().filter(|u| u.matches_search("zai")).count(), 1);
    }
}
