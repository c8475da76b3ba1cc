// ==========================================
// 物流管理系统 - 物流数据存储 Trait
// ==========================================
// 职责: 定义导入写入所需的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 约束: 所有调用按 user_id 归属，调用方负责为每行写入 owner
// ==========================================

use crate::domain::{
    ClientRow, CollectionRow, ImportBatch, ItemRow, Owner, PersistedClient, PersistedCollection,
    PersistedItem, PersistedProduct, ProductRow, ProfileRow,
};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// StoreTable - 存储表及其冲突键
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreTable {
    Collections,
    Items,
    Products,
    Clients,
    Profiles,
    ImportBatches,
}

impl StoreTable {
    pub fn table_name(&self) -> &'static str {
        match self {
            StoreTable::Collections => "collections",
            StoreTable::Items => "items",
            StoreTable::Products => "products",
            StoreTable::Clients => "clients",
            StoreTable::Profiles => "profiles",
            StoreTable::ImportBatches => "import_batch",
        }
    }

    /// "插入，跳过重复" 时使用的冲突键；无自然键的表返回空
    pub fn conflict_keys(&self) -> &'static [&'static str] {
        match self {
            StoreTable::Products => &["user_id", "code"],
            StoreTable::Clients => &["user_id", "name"],
            StoreTable::Profiles => &["user_id", "first_name", "last_name", "phone"],
            _ => &[],
        }
    }
}

// ==========================================
// LogisticsStore Trait
// ==========================================
// 实现者: SqliteLogisticsStore（使用 rusqlite）
#[async_trait]
pub trait LogisticsStore: Send + Sync {
    // ===== 批量写入（每次调用一个事务）=====

    /// 批量新增揽收/派送（总是新建行）
    ///
    /// # 返回
    /// - Ok(Vec<PersistedCollection>): 按提交顺序返回落库行（含生成的 id）
    /// - Err: 数据库错误（整批回滚）
    async fn insert_collections(
        &self,
        rows: Vec<CollectionRow>,
    ) -> RepositoryResult<Vec<PersistedCollection>>;

    /// 批量新增明细行
    async fn insert_items(&self, rows: Vec<ItemRow>) -> RepositoryResult<usize>;

    /// 产品：插入，跳过 (user_id, code) 重复
    async fn upsert_products(&self, rows: Vec<ProductRow>) -> RepositoryResult<()>;

    /// 客户：插入，跳过 (user_id, name) 重复
    async fn upsert_clients(&self, rows: Vec<ClientRow>) -> RepositoryResult<()>;

    /// 人员档案：插入，跳过 (user_id, first_name, last_name, phone) 重复
    async fn upsert_profiles(&self, rows: Vec<ProfileRow>) -> RepositoryResult<()>;

    // ===== 批次记录 =====

    async fn insert_import_batch(&self, batch: ImportBatch) -> RepositoryResult<()>;

    async fn list_recent_batches(
        &self,
        owner: &Owner,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>>;

    // ===== 查询 =====

    /// 统计某账户在指定表中的行数
    async fn count_rows(&self, table: StoreTable, owner: &Owner) -> RepositoryResult<usize>;

    async fn list_collections(&self, owner: &Owner) -> RepositoryResult<Vec<PersistedCollection>>;

    async fn list_items_by_collection(
        &self,
        owner: &Owner,
        collection_id: &str,
    ) -> RepositoryResult<Vec<PersistedItem>>;

    async fn find_product_by_code(
        &self,
        owner: &Owner,
        code: &str,
    ) -> RepositoryResult<Option<PersistedProduct>>;

    async fn find_client_by_name(
        &self,
        owner: &Owner,
        name: &str,
    ) -> RepositoryResult<Option<PersistedClient>>;

    async fn list_profiles(&self, owner: &Owner) -> RepositoryResult<Vec<ProfileRow>>;
}
