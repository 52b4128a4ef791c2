use std::future::Future;
use std::sync::Arc;

use crate::error::AppResult;
use crate::infrastructure::document::{CollectionPath, Document, DocumentPath, OrderBy, WriteBatch};

/// 文档存储
///
/// 业务层只通过这三个能力访问后端：读单个文档、按字段排序查询集合、原子提交批量写入。
/// 每次调用都直接访问后端，不做任何缓存。
pub trait DocumentStore: Send + Sync {
    /// 读取单个文档，不存在时返回 `Ok(None)`
    fn get(&self, path: &DocumentPath) -> impl Future<Output = AppResult<Option<Document>>> + Send;

    /// 查询集合中的所有文档
    ///
    /// 指定 `order_by` 时，缺少该字段的文档不会出现在结果中。
    fn query(
        &self,
        collection: &CollectionPath,
        order_by: Option<&OrderBy>,
    ) -> impl Future<Output = AppResult<Vec<Document>>> + Send;

    /// 原子提交批量写入
    fn commit(&self, batch: WriteBatch) -> impl Future<Output = AppResult<()>> + Send;
}

impl<S: DocumentStore> DocumentStore for Arc<S> {
    fn get(&self, path: &DocumentPath) -> impl Future<Output = AppResult<Option<Document>>> + Send {
        (**self).get(path)
    }

    fn query(
        &self,
        collection: &CollectionPath,
        order_by: Option<&OrderBy>,
    ) -> impl Future<Output = AppResult<Vec<Document>>> + Send {
        (**self).query(collection, order_by)
    }

    fn commit(&self, batch: WriteBatch) -> impl Future<Output = AppResult<()>> + Send {
        (**self).commit(batch)
    }
}
