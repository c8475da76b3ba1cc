// ==========================================
// 物流管理系统 - 领域模型层
// ==========================================
// 职责: 定义导入记录、持久化实体、领域类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod entity;
pub mod record;
pub mod types;

// 重导出核心类型
pub use entity::{
    ClientRow, CollectionRow, ImportBatch, ItemRow, PersistedClient, PersistedCollection,
    PersistedItem, PersistedProduct, ProductRow, ProfileRow,
};
pub use record::{
    is_blank, ClientRecord, CollectionRecord, ImportRecord, ProductRecord, ProfileRecord,
    RecordBatch,
};
pub use types::{CollectionKind, CollectionStatus, ImportKind, Owner, ProfileRole};
