//! 基础设施层
//!
//! 持有外部后端连接，只向上暴露文档存储能力。
//! - `DocumentStore`：读文档 / 排序查询 / 原子批量写入
//! - `MemoryStore`：进程内实现
//! - `FirestoreRestStore`：托管 Firestore 的 REST 实现

pub mod document;
pub mod document_store;
pub mod firestore_rest;
pub mod memory_store;

pub use document::{
    CollectionPath, Document, DocumentPath, FieldValue, FieldWrite, OrderBy, WriteBatch,
};
pub use document_store::DocumentStore;
pub use firestore_rest::FirestoreRestStore;
pub use memory_store::MemoryStore;
