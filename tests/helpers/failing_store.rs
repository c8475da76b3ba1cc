// ==========================================
// 可注入失败的存储 - 用于集成测试
// ==========================================
// 包装真实存储，按开关让指定写入调用失败，其余调用透传
// ==========================================

use async_trait::async_trait;
use logistics_import::domain::{
    ClientRow, CollectionRow, ImportBatch, ItemRow, Owner, PersistedClient, PersistedCollection,
    PersistedItem, PersistedProduct, ProductRow, ProfileRow,
};
use logistics_import::repository::{
    LogisticsStore, RepositoryError, RepositoryResult, SqliteLogisticsStore, StoreTable,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

pub const REJECTION_MESSAGE: &str = "duplicate key value violates unique constraint";

pub struct FailingStore {
    inner: Arc<SqliteLogisticsStore>,
    fail_products: AtomicBool,
    fail_items: AtomicBool,
}

impl FailingStore {
    pub fn new(inner: Arc<SqliteLogisticsStore>) -> Self {
        Self {
            inner,
            fail_products: AtomicBool::new(false),
            fail_items: AtomicBool::new(false),
        }
    }

    pub fn fail_products(&self, fail: bool) {
        self.fail_products.store(fail, Ordering::SeqCst);
    }

    pub fn fail_items(&self, fail: bool) {
        self.fail_items.store(fail, Ordering::SeqCst);
    }

    fn rejection() -> RepositoryError {
        RepositoryError::DatabaseQueryError(REJECTION_MESSAGE.to_string())
    }
}

#[async_trait]
impl LogisticsStore for FailingStore {
    async fn insert_collections(
        &self,
        rows: Vec<CollectionRow>,
    ) -> RepositoryResult<Vec<PersistedCollection>> {
        self.inner.insert_collections(rows).await
    }

    async fn insert_items(&self, rows: Vec<ItemRow>) -> RepositoryResult<usize> {
        if self.fail_items.load(Ordering::SeqCst) {
            return Err(Self::rejection());
        }
        self.inner.insert_items(rows).await
    }

    async fn upsert_products(&self, rows: Vec<ProductRow>) -> RepositoryResult<()> {
        if self.fail_products.load(Ordering::SeqCst) {
            return Err(Self::rejection());
        }
        self.inner.upsert_products(rows).await
    }

    async fn upsert_clients(&self, rows: Vec<ClientRow>) -> RepositoryResult<()> {
        self.inner.upsert_clients(rows).await
    }

    async fn upsert_profiles(&self, rows: Vec<ProfileRow>) -> RepositoryResult<()> {
        self.inner.upsert_profiles(rows).await
    }

    async fn insert_import_batch(&self, batch: ImportBatch) -> RepositoryResult<()> {
        self.inner.insert_import_batch(batch).await
    }

    async fn list_recent_batches(
        &self,
        owner: &Owner,
        limit: usize,
    ) -> RepositoryResult<Vec<ImportBatch>> {
        self.inner.list_recent_batches(owner, limit).await
    }

    async fn count_rows(&self, table: StoreTable, owner: &Owner) -> RepositoryResult<usize> {
        self.inner.count_rows(table, owner).await
    }

    async fn list_collections(&self, owner: &Owner) -> RepositoryResult<Vec<PersistedCollection>> {
        self.inner.list_collections(owner).await
    }

    async fn list_items_by_collection(
        &self,
        owner: &Owner,
        collection_id: &str,
    ) -> RepositoryResult<Vec<PersistedItem>> {
        self.inner.list_items_by_collection(owner, collection_id).await
    }

    async fn find_product_by_code(
        &self,
        owner: &Owner,
        code: &str,
    ) -> RepositoryResult<Option<PersistedProduct>> {
        self.inner.find_product_by_code(owner, code).await
    }

    async fn find_client_by_name(
        &self,
        owner: &Owner,
        name: &str,
    ) -> RepositoryResult<Option<PersistedClient>> {
        self.inner.find_client_by_name(owner, name).await
    }

    async fn list_profiles(&self, owner: &Owner) -> RepositoryResult<Vec<ProfileRow>> {
        self.inner.list_profiles(owner).await
    }
}
