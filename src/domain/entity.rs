// ==========================================
// 物流管理系统 - 持久化实体
// ==========================================
// 红线: 所有行归属于唯一账户（user_id），不跨账户引用
// 约定: *Row 为写入形态，Persisted* 为落库后形态（含生成的 id）
// ==========================================

use crate::domain::types::{CollectionKind, CollectionStatus, ImportKind, ProfileRole};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// 揽收/派送
// ==========================================
// 对齐: collections 表；无自然键，导入总是新建
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRow {
    pub user_id: String,
    pub kind: CollectionKind,
    pub status: CollectionStatus,
    pub parceiro: String,
    pub origin_address: String,
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_address: Option<String>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,
    pub requested_date: String,
    pub freight_value: Option<f64>,

    // ===== 关联（导入时为空，由编辑流程补全）=====
    pub client_id: Option<String>,
    pub driver_id: Option<String>,
    pub carrier_id: Option<String>,
    pub responsible_user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedCollection {
    pub id: String,
    #[serde(flatten)]
    pub row: CollectionRow,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// 明细行
// ==========================================
// 对齐: items 表（collection_id 外键）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRow {
    pub collection_id: String,
    pub user_id: String,
    pub name: String, // 产品代码 / 型号
    pub description: Option<String>,
    pub quantity: i64, // > 0
    pub status: CollectionStatus, // 创建时取父行状态
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedItem {
    pub id: String,
    #[serde(flatten)]
    pub row: ItemRow,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// 产品（自然键: user_id + code）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRow {
    pub user_id: String,
    pub code: String,
    pub description: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedProduct {
    pub id: String,
    #[serde(flatten)]
    pub row: ProductRow,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// 客户（自然键: user_id + name）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRow {
    pub user_id: String,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,
    pub contact_person: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedClient {
    pub id: String,
    #[serde(flatten)]
    pub row: ClientRow,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// 人员档案（技术员/主管）
// ==========================================
// 去重键: user_id + first_name + last_name + phone（缺省存 ''）
// id 由写入器在写入前生成
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRow {
    pub id: String,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub role: ProfileRole,
    pub position: Option<String>,
    pub supervisor_id: Option<String>,
    pub shift: Option<String>,
    pub address: Option<String>,
}

// ==========================================
// ImportBatch - 导入批次记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub user_id: String,
    pub kind: ImportKind,
    pub file_name: Option<String>,
    pub submitted_rows: usize,
    pub items_inserted: usize,
    pub elapsed_ms: i64,
    pub imported_at: DateTime<Utc>,
}
