// ==========================================
// 物流管理系统 - 对账写入器
// ==========================================
// 阶段 3: 记录 → 持久化行 → 批量写入 → 缓存失效
// 红线: owner 由调用方显式传入，写入器不读取任何全局会话
// 红线: 每次调用只写一种实体，每批一个事务（不跨种类）
// ==========================================

use crate::domain::{
    ClientRecord, ClientRow, CollectionRecord, CollectionRow, ImportBatch, ImportKind, ItemRow,
    Owner, ProductRecord, ProductRow, ProfileRecord, ProfileRole, ProfileRow, RecordBatch,
};
use crate::events::{invalidation_keys, CacheInvalidator};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::LogisticsStore;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// WriteReport - 写入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReport {
    pub kind: ImportKind,
    /// 提交的记录数（"插入，跳过重复" 的种类不区分实际新增数）
    pub submitted: usize,
    pub items_inserted: usize,
    /// 明细行写入失败时的存储端消息（仅记录，不影响结果）
    pub item_error: Option<String>,
    pub batch_id: Option<String>,
}

impl WriteReport {
    fn empty(kind: ImportKind) -> Self {
        Self {
            kind,
            submitted: 0,
            items_inserted: 0,
            item_error: None,
            batch_id: None,
        }
    }
}

// ==========================================
// ReconciliationWriter
// ==========================================
pub struct ReconciliationWriter {
    store: Arc<dyn LogisticsStore>,
    invalidator: Arc<dyn CacheInvalidator>,
}

impl ReconciliationWriter {
    pub fn new(store: Arc<dyn LogisticsStore>, invalidator: Arc<dyn CacheInvalidator>) -> Self {
        Self { store, invalidator }
    }

    pub fn store(&self) -> Arc<dyn LogisticsStore> {
        Arc::clone(&self.store)
    }

    /// 写入一批已校验的记录
    ///
    /// # 返回
    /// - Ok(WriteReport): 成功（空批次为 0 条的成功）
    /// - Err(NotAuthenticated): 未登录，未发生任何写入
    /// - Err(Persistence): 存储拒绝整批（已回滚）
    #[instrument(skip(self, owner, batch), fields(kind = %batch.kind(), submitted = batch.len()))]
    pub async fn write(
        &self,
        owner: Option<&Owner>,
        batch: RecordBatch,
        file_name: Option<&str>,
    ) -> ImportResult<WriteReport> {
        let owner = match owner {
            Some(owner) if owner.is_authenticated() => owner,
            _ => return Err(ImportError::NotAuthenticated),
        };

        let kind = batch.kind();
        if batch.is_empty() {
            debug!("空批次，跳过写入");
            return Ok(WriteReport::empty(kind));
        }

        let start = Instant::now();
        let submitted = batch.len();
        let mut report = WriteReport {
            submitted,
            ..WriteReport::empty(kind)
        };

        match batch {
            RecordBatch::Collections(records) => {
                let (items_inserted, item_error) = self.write_collections(owner, records).await?;
                report.items_inserted = items_inserted;
                report.item_error = item_error;
            }
            RecordBatch::Products(records) => {
                let rows = records.iter().map(|r| product_row(r, owner)).collect();
                self.store.upsert_products(rows).await?;
            }
            RecordBatch::Clients(records) => {
                let rows = records.iter().map(|r| client_row(r, owner)).collect();
                self.store.upsert_clients(rows).await?;
            }
            RecordBatch::Technicians(records) => {
                let rows = records
                    .iter()
                    .map(|r| profile_row(r, owner, ProfileRole::Technician))
                    .collect();
                self.store.upsert_profiles(rows).await?;
            }
            RecordBatch::Supervisors(records) => {
                let rows = records
                    .iter()
                    .map(|r| profile_row(r, owner, ProfileRole::Supervisor))
                    .collect();
                self.store.upsert_profiles(rows).await?;
            }
        }

        // 缓存失效失败不影响导入结果
        let keys = invalidation_keys(kind, owner);
        if let Err(e) = self.invalidator.invalidate(&keys) {
            warn!(error = %e, keys = keys.len(), "缓存失效失败");
        }

        let batch_id = Uuid::new_v4().to_string();
        let record = ImportBatch {
            batch_id: batch_id.clone(),
            user_id: owner.user_id.clone(),
            kind,
            file_name: file_name.map(str::to_string),
            submitted_rows: submitted,
            items_inserted: report.items_inserted,
            elapsed_ms: start.elapsed().as_millis() as i64,
            imported_at: Utc::now(),
        };
        match self.store.insert_import_batch(record).await {
            Ok(()) => report.batch_id = Some(batch_id),
            Err(e) => warn!(error = %e, "导入批次记录失败"),
        }

        info!(
            owner_id = %owner.user_id,
            items_inserted = report.items_inserted,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "导入写入完成"
        );
        Ok(report)
    }

    /// 揽收/派送: 总是新建父行；明细行为尽力而为的第二批写入
    async fn write_collections(
        &self,
        owner: &Owner,
        records: Vec<CollectionRecord>,
    ) -> ImportResult<(usize, Option<String>)> {
        let rows = records.iter().map(|r| collection_row(r, owner)).collect();
        let persisted = self.store.insert_collections(rows).await?;

        let items: Vec<ItemRow> = persisted
            .iter()
            .zip(records.iter())
            .filter(|(_, record)| record.has_item())
            .filter_map(|(parent, record)| {
                Some(ItemRow {
                    collection_id: parent.id.clone(),
                    user_id: owner.user_id.clone(),
                    name: record.product_code.clone()?,
                    description: record.product_description.clone(),
                    quantity: record.quantity?,
                    status: parent.row.status,
                })
            })
            .collect();

        if items.is_empty() {
            return Ok((0, None));
        }

        let expected = items.len();
        match self.store.insert_items(items).await {
            Ok(inserted) => Ok((inserted, None)),
            Err(e) => {
                // 父行已提交，不回滚；仅此一条日志
                warn!(
                    owner_id = %owner.user_id,
                    parents = persisted.len(),
                    items = expected,
                    error = %e,
                    "明细行写入失败，揽收/派送已保留"
                );
                Ok((0, Some(e.store_message())))
            }
        }
    }
}

// ==========================================
// 记录 → 持久化行
// ==========================================

fn collection_row(record: &CollectionRecord, owner: &Owner) -> CollectionRow {
    CollectionRow {
        user_id: owner.user_id.clone(),
        kind: record.kind,
        status: record.status,
        parceiro: record.parceiro.clone().unwrap_or_default(),
        origin_address: record.origin_address.clone().unwrap_or_default(),
        origin_lat: record.origin_lat,
        origin_lng: record.origin_lng,
        destination_address: record.destination_address.clone(),
        destination_lat: record.destination_lat,
        destination_lng: record.destination_lng,
        requested_date: record.requested_date.clone().unwrap_or_default(),
        freight_value: record.freight_value,
        client_id: None,
        driver_id: None,
        carrier_id: None,
        responsible_user_id: None,
    }
}

fn product_row(record: &ProductRecord, owner: &Owner) -> ProductRow {
    ProductRow {
        user_id: owner.user_id.clone(),
        code: record.code.clone().unwrap_or_default(),
        description: record.description.clone(),
        model: record.model.clone(),
        serial_number: record.serial_number.clone(),
    }
}

fn client_row(record: &ClientRecord, owner: &Owner) -> ClientRow {
    ClientRow {
        user_id: owner.user_id.clone(),
        name: record.name.clone().unwrap_or_default(),
        phone: record.phone.clone(),
        email: record.email.clone(),
        address: record.address.clone(),
        tax_id: record.tax_id.clone(),
        contact_person: record.contact_person.clone(),
    }
}

/// 每条记录写入前生成新 id；主管总是没有上级
fn profile_row(record: &ProfileRecord, owner: &Owner, role: ProfileRole) -> ProfileRow {
    let supervisor_id = match role {
        ProfileRole::Technician => record.supervisor_id.clone(),
        ProfileRole::Supervisor => None,
    };

    ProfileRow {
        id: Uuid::new_v4().to_string(),
        user_id: owner.user_id.clone(),
        first_name: record.first_name.clone().unwrap_or_default(),
        last_name: record.last_name.clone().unwrap_or_default(),
        phone: record.phone.clone().unwrap_or_default(),
        role,
        position: record.role.clone(),
        supervisor_id,
        shift: record.shift.clone(),
        address: record.address.clone(),
    }
}
