//! 进程内文档存储
//!
//! 用于本地运行和测试。每次调用都会先让出一次执行权，
//! 与远程调用一样存在挂起点，并发调用之间可以交错执行。

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AppError, AppResult, PersistenceError};
use crate::infrastructure::document::{
    CollectionPath, Direction, Document, DocumentPath, FieldValue, FieldWrite, FieldWrites,
    Fields, OrderBy, WriteBatch, WriteOp,
};
use crate::infrastructure::document_store::DocumentStore;

#[derive(Debug, Clone)]
struct StoredDoc {
    fields: Fields,
    /// 创建顺序，排序字段相同时用于稳定排序
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    /// 集合路径 -> (文档 id -> 文档)
    collections: HashMap<String, BTreeMap<String, StoredDoc>>,
    /// 上一次分配的服务端时间
    last_timestamp: Option<DateTime<Utc>>,
    next_seq: u64,
}

impl Inner {
    /// 单调递增的服务端时间，同一次提交内的所有字段共享一个时间
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_timestamp {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_timestamp = Some(ts);
        ts
    }

    fn lookup(&self, path: &DocumentPath) -> Option<&StoredDoc> {
        self.collections
            .get(path.parent().as_str())
            .and_then(|c| c.get(path.id()))
    }
}

/// 进程内文档存储
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 之后的读取全部失败（测试用）
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// 之后的写入全部失败（测试用）
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// 集合中的文档数量
    pub async fn count(&self, collection: &CollectionPath) -> usize {
        let inner = self.inner.read().await;
        inner
            .collections
            .get(collection.as_str())
            .map(BTreeMap::len)
            .unwrap_or(0)
    }

    fn check_reads(&self, path: &str) -> AppResult<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::read_failed(path, "存储不可用"));
        }
        Ok(())
    }

    fn check_writes(&self, path: &str) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::write_failed(path, "存储不可用"));
        }
        Ok(())
    }
}

/// 把写入字段应用到已有字段上
fn apply_writes(target: &mut Fields, writes: &FieldWrites, now: DateTime<Utc>) {
    for (name, write) in writes {
        let value = match write {
            FieldWrite::Value(v) => v.clone(),
            FieldWrite::ServerTimestamp => FieldValue::Timestamp(now),
            FieldWrite::Increment(by) => {
                let current = target.get(name).and_then(FieldValue::as_i64).unwrap_or(0);
                // 与 Firestore 一致，溢出时截断到 i64 边界
                FieldValue::Integer(current.saturating_add(*by))
            }
        };
        target.insert(name.clone(), value);
    }
}

impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocumentPath) -> AppResult<Option<Document>> {
        tokio::task::yield_now().await;
        self.check_reads(path.as_str())?;

        let inner = self.inner.read().await;
        Ok(inner
            .lookup(path)
            .map(|doc| Document::new(path.clone(), doc.fields.clone())))
    }

    async fn query(
        &self,
        collection: &CollectionPath,
        order_by: Option<&OrderBy>,
    ) -> AppResult<Vec<Document>> {
        tokio::task::yield_now().await;
        self.check_reads(collection.as_str())?;

        let inner = self.inner.read().await;
        let Some(docs) = inner.collections.get(collection.as_str()) else {
            return Ok(Vec::new());
        };

        let mut rows: Vec<(&String, &StoredDoc)> = docs.iter().collect();
        match order_by {
            Some(order) => {
                rows.retain(|(_, d)| d.fields.contains_key(&order.field));
                rows.sort_by(|(_, a), (_, b)| {
                    let ord = a.fields[&order.field]
                        .compare(&b.fields[&order.field])
                        .then(a.seq.cmp(&b.seq));
                    match order.direction {
                        Direction::Ascending => ord,
                        Direction::Descending => ord.reverse(),
                    }
                });
            }
            None => rows.sort_by_key(|(_, d)| d.seq),
        }

        Ok(rows
            .into_iter()
            .map(|(id, d)| Document::new(collection.doc(id), d.fields.clone()))
            .collect())
    }

    async fn commit(&self, batch: WriteBatch) -> AppResult<()> {
        tokio::task::yield_now().await;
        let first_path = batch
            .ops()
            .first()
            .map(|op| op.path().to_string())
            .unwrap_or_default();
        self.check_writes(&first_path)?;

        let mut inner = self.inner.write().await;
        let now = inner.next_timestamp();

        // 先在副本上应用，全部成功后再写回
        let mut staged: BTreeMap<DocumentPath, Option<StoredDoc>> = BTreeMap::new();
        for op in batch.ops() {
            let path = op.path();
            let current = match staged.get(path) {
                Some(doc) => doc.clone(),
                None => inner.lookup(path).cloned(),
            };

            let next = match (op, current) {
                (WriteOp::Set { fields, .. }, existing) => {
                    let seq = match existing {
                        Some(doc) => doc.seq,
                        None => {
                            inner.next_seq += 1;
                            inner.next_seq
                        }
                    };
                    let mut doc = StoredDoc {
                        fields: Fields::new(),
                        seq,
                    };
                    apply_writes(&mut doc.fields, fields, now);
                    doc
                }
                (WriteOp::Update { fields, .. }, Some(mut doc)) => {
                    apply_writes(&mut doc.fields, fields, now);
                    doc
                }
                (WriteOp::Update { .. }, None) => {
                    debug!("批量写入失败，文档不存在: {}", path);
                    return Err(AppError::Persistence(PersistenceError::NotFound {
                        path: path.to_string(),
                    }));
                }
            };
            staged.insert(path.clone(), Some(next));
        }

        for (path, doc) in staged {
            if let Some(doc) = doc {
                inner
                    .collections
                    .entry(path.parent().as_str().to_string())
                    .or_default()
                    .insert(path.id().to_string(), doc);
            }
        }

        debug!("批量写入完成: {} 个操作", batch.len());
        Ok(())
    }
}
