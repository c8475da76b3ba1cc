// ==========================================
// 物流管理系统 - 导入中间记录
// ==========================================
// 用途: 导入管道中间产物（文件解析 → 字段映射 → 此结构）
// 生命周期: 仅存在于解析与落库之间的内存中
// ==========================================

use crate::domain::types::{CollectionKind, CollectionStatus, ImportKind};
use serde::{Deserialize, Serialize};

// ==========================================
// CollectionRecord - 揽收/派送导入行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectionRecord {
    pub row_number: usize,

    // ===== 必填 =====
    pub parceiro: Option<String>,       // 合作方（客户名称）
    pub origin_address: Option<String>, // 起点地址
    pub requested_date: Option<String>, // 期望日期（ISO，无法识别时保留原文）

    // ===== 地理信息 =====
    pub origin_lat: Option<f64>,
    pub origin_lng: Option<f64>,
    pub destination_address: Option<String>,
    pub destination_lat: Option<f64>,
    pub destination_lng: Option<f64>,

    // ===== 货物 =====
    pub product_code: Option<String>,
    pub product_description: Option<String>,
    pub quantity: Option<i64>,
    pub freight_value: Option<f64>,

    pub status: CollectionStatus,
    pub kind: CollectionKind,
}

impl CollectionRecord {
    /// 是否需要生成明细行：产品代码非空且数量 > 0
    pub fn has_item(&self) -> bool {
        !is_blank(&self.product_code) && self.quantity.map_or(false, |q| q > 0)
    }
}

// ==========================================
// ProductRecord - 产品导入行（自然键: code）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub row_number: usize,
    pub code: Option<String>,
    pub description: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
}

// ==========================================
// ClientRecord - 客户导入行（自然键: name）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientRecord {
    pub row_number: usize,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub tax_id: Option<String>,         // CNPJ/CPF
    pub contact_person: Option<String>,
}

// ==========================================
// ProfileRecord - 技术员/主管导入行
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub row_number: usize,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<String>,          // 源文件中的岗位描述
    pub supervisor_id: Option<String>, // 仅技术员有意义，不校验是否存在
    pub shift: Option<String>,
    pub address: Option<String>,
}

// ==========================================
// ImportRecord - 按种类区分的导入记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "record", rename_all = "snake_case")]
pub enum ImportRecord {
    Collection(CollectionRecord),
    Product(ProductRecord),
    Client(ClientRecord),
    Technician(ProfileRecord),
    Supervisor(ProfileRecord),
}

impl ImportRecord {
    pub fn kind(&self) -> ImportKind {
        match self {
            ImportRecord::Collection(_) => ImportKind::Collections,
            ImportRecord::Product(_) => ImportKind::Products,
            ImportRecord::Client(_) => ImportKind::Clients,
            ImportRecord::Technician(_) => ImportKind::Technicians,
            ImportRecord::Supervisor(_) => ImportKind::Supervisors,
        }
    }

    pub fn row_number(&self) -> usize {
        match self {
            ImportRecord::Collection(r) => r.row_number,
            ImportRecord::Product(r) => r.row_number,
            ImportRecord::Client(r) => r.row_number,
            ImportRecord::Technician(r) | ImportRecord::Supervisor(r) => r.row_number,
        }
    }

    /// 按种类列出缺失的必填字段（空白视为缺失）
    ///
    /// - 客户: name
    /// - 产品: code
    /// - 揽收/派送: parceiro + origin_address + requested_date
    /// - 技术员/主管: first_name
    pub fn missing_required_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        match self {
            ImportRecord::Client(r) => {
                if is_blank(&r.name) {
                    missing.push("name");
                }
            }
            ImportRecord::Product(r) => {
                if is_blank(&r.code) {
                    missing.push("code");
                }
            }
            ImportRecord::Collection(r) => {
                if is_blank(&r.parceiro) {
                    missing.push("parceiro");
                }
                if is_blank(&r.origin_address) {
                    missing.push("origin_address");
                }
                if is_blank(&r.requested_date) {
                    missing.push("requested_date");
                }
            }
            ImportRecord::Technician(r) | ImportRecord::Supervisor(r) => {
                if is_blank(&r.first_name) {
                    missing.push("first_name");
                }
            }
        }
        missing
    }
}

// ==========================================
// RecordBatch - 同种类记录集合
// ==========================================
// 不变式: 一个批次只包含一种实体，由类型保证
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "records", rename_all = "snake_case")]
pub enum RecordBatch {
    Collections(Vec<CollectionRecord>),
    Products(Vec<ProductRecord>),
    Clients(Vec<ClientRecord>),
    Technicians(Vec<ProfileRecord>),
    Supervisors(Vec<ProfileRecord>),
}

impl RecordBatch {
    pub fn empty(kind: ImportKind) -> Self {
        match kind {
            ImportKind::Collections => RecordBatch::Collections(Vec::new()),
            ImportKind::Products => RecordBatch::Products(Vec::new()),
            ImportKind::Clients => RecordBatch::Clients(Vec::new()),
            ImportKind::Technicians => RecordBatch::Technicians(Vec::new()),
            ImportKind::Supervisors => RecordBatch::Supervisors(Vec::new()),
        }
    }

    /// 由记录列表构造批次；种类不符时返回第一条不符的记录
    pub fn from_records(kind: ImportKind, records: Vec<ImportRecord>) -> Result<Self, ImportRecord> {
        let mut batch = Self::empty(kind);
        for record in records {
            batch.push(record)?;
        }
        Ok(batch)
    }

    pub fn push(&mut self, record: ImportRecord) -> Result<(), ImportRecord> {
        match (self, record) {
            (RecordBatch::Collections(v), ImportRecord::Collection(r)) => v.push(r),
            (RecordBatch::Products(v), ImportRecord::Product(r)) => v.push(r),
            (RecordBatch::Clients(v), ImportRecord::Client(r)) => v.push(r),
            (RecordBatch::Technicians(v), ImportRecord::Technician(r)) => v.push(r),
            (RecordBatch::Supervisors(v), ImportRecord::Supervisor(r)) => v.push(r),
            (_, other) => return Err(other),
        }
        Ok(())
    }

    pub fn kind(&self) -> ImportKind {
        match self {
            RecordBatch::Collections(_) => ImportKind::Collections,
            RecordBatch::Products(_) => ImportKind::Products,
            RecordBatch::Clients(_) => ImportKind::Clients,
            RecordBatch::Technicians(_) => ImportKind::Technicians,
            RecordBatch::Supervisors(_) => ImportKind::Supervisors,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            RecordBatch::Collections(v) => v.len(),
            RecordBatch::Products(v) => v.len(),
            RecordBatch::Clients(v) => v.len(),
            RecordBatch::Technicians(v) | RecordBatch::Supervisors(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<ImportRecord> {
        match self {
            RecordBatch::Collections(v) => v.into_iter().map(ImportRecord::Collection).collect(),
            RecordBatch::Products(v) => v.into_iter().map(ImportRecord::Product).collect(),
            RecordBatch::Clients(v) => v.into_iter().map(ImportRecord::Client).collect(),
            RecordBatch::Technicians(v) => v.into_iter().map(ImportRecord::Technician).collect(),
            RecordBatch::Supervisors(v) => v.into_iter().map(ImportRecord::Supervisor).collect(),
        }
    }
}

/// None、空串、纯空白均视为空
pub fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(code: Option<&str>, quantity: Option<i64>) -> CollectionRecord {
        CollectionRecord {
            row_number: 1,
            parceiro: Some("ACME".to_string()),
            origin_address: Some("Rua A, 100".to_string()),
            requested_date: Some("2025-01-20".to_string()),
            origin_lat: None,
            origin_lng: None,
            destination_address: None,
            destination_lat: None,
            destination_lng: None,
            product_code: code.map(str::to_string),
            product_description: None,
            quantity,
            freight_value: None,
            status: CollectionStatus::Pending,
            kind: CollectionKind::Collection,
        }
    }

    #[test]
    fn test_has_item_requires_code_and_positive_quantity() {
        assert!(collection(Some("X123"), Some(2)).has_item());
        assert!(!collection(Some("X123"), Some(0)).has_item());
        assert!(!collection(Some("  "), Some(3)).has_item());
        assert!(!collection(Some("X123"), None).has_item());
    }

    #[test]
    fn test_collection_requires_all_three_fields() {
        let mut record = collection(None, None);
        assert!(ImportRecord::Collection(record.clone()).missing_required_fields().is_empty());

        record.origin_address = Some(" ".to_string());
        record.requested_date = None;
        let missing = ImportRecord::Collection(record).missing_required_fields();
        assert_eq!(missing, vec!["origin_address", "requested_date"]);
    }

    #[test]
    fn test_batch_rejects_mismatched_kind() {
        let mut batch = RecordBatch::empty(ImportKind::Products);
        let client = ImportRecord::Client(ClientRecord {
            row_number: 1,
            name: Some("ACME".to_string()),
            phone: None,
            email: None,
            address: None,
            tax_id: None,
            contact_person: None,
        });

        assert!(batch.push(client).is_err());
        assert!(batch.is_empty());
        assert_eq!(batch.kind(), ImportKind::Products);
    }

    #[test]
    fn test_technician_and_supervisor_share_profile_shape() {
        let profile = ProfileRecord {
            row_number: 4,
            first_name: Some("Ana".to_string()),
            last_name: None,
            phone: None,
            role: None,
            supervisor_id: None,
            shift: None,
            address: None,
        };
        let batch = RecordBatch::from_records(
            ImportKind::Supervisors,
            vec![ImportRecord::Supervisor(profile.clone())],
        )
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert!(RecordBatch::from_records(
            ImportKind::Supervisors,
            vec![ImportRecord::Technician(profile)]
        )
        .is_err());
    }
}
