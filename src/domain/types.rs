// ==========================================
// 物流管理系统 - 领域类型定义
// ==========================================
// 职责: 导入种类、揽收/派送类型、状态、账户归属
// 说明: 枚举以小写 snake_case 字符串落库
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// ImportKind - 导入种类
// ==========================================
// 一次导入只处理一种实体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportKind {
    Collections, // 揽收/派送
    Products,    // 产品
    Clients,     // 客户
    Technicians, // 技术员
    Supervisors, // 主管
}

impl ImportKind {
    pub const ALL: [ImportKind; 5] = [
        ImportKind::Collections,
        ImportKind::Products,
        ImportKind::Clients,
        ImportKind::Technicians,
        ImportKind::Supervisors,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImportKind::Collections => "collections",
            ImportKind::Products => "products",
            ImportKind::Clients => "clients",
            ImportKind::Technicians => "technicians",
            ImportKind::Supervisors => "supervisors",
        }
    }

    /// 该种类接受的文件扩展名（小写，不含点）
    ///
    /// - 揽收/派送: 表格 / 分隔文本 / 文档
    /// - 其他种类: 表格 / 分隔文本 / 结构化数据
    pub fn accepted_extensions(&self) -> &'static [&'static str] {
        match self {
            ImportKind::Collections => &["xlsx", "csv", "pdf"],
            _ => &["xlsx", "csv", "json"],
        }
    }

    pub fn accepts_extension(&self, extension: &str) -> bool {
        self.accepted_extensions().contains(&extension)
    }

    /// 形如 ".xlsx/.csv/.pdf" 的展示文本
    pub fn accepted_formats_label(&self) -> String {
        self.accepted_extensions()
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join("/")
    }
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImportKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "collections" | "deliveries" | "coletas" | "entregas" => Ok(ImportKind::Collections),
            "products" | "produtos" => Ok(ImportKind::Products),
            "clients" | "clientes" => Ok(ImportKind::Clients),
            "technicians" | "tecnicos" | "técnicos" => Ok(ImportKind::Technicians),
            "supervisors" | "supervisores" => Ok(ImportKind::Supervisors),
            other => Err(format!("未知的导入种类: {}", other)),
        }
    }
}

// ==========================================
// CollectionKind - 揽收 / 派送
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionKind {
    Collection,
    Delivery,
}

impl CollectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionKind::Collection => "collection",
            CollectionKind::Delivery => "delivery",
        }
    }

    /// 宽松解析（中英葡拼写），无法识别返回 None
    pub fn parse_loose(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "collection" | "coleta" | "揽收" => Some(CollectionKind::Collection),
            "delivery" | "entrega" | "派送" => Some(CollectionKind::Delivery),
            _ => None,
        }
    }
}

impl FromStr for CollectionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| format!("未知的揽收类型: {}", s))
    }
}

// ==========================================
// CollectionStatus - 揽收/派送状态
// ==========================================
// 不变式: 仅 pending / in_transit / completed 三态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Pending,
    InTransit, // 已排期 / 运输中
    Completed,
}

impl CollectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CollectionStatus::Pending => "pending",
            CollectionStatus::InTransit => "in_transit",
            CollectionStatus::Completed => "completed",
        }
    }

    pub fn parse_loose(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pending" | "pendente" => Some(CollectionStatus::Pending),
            "scheduled" | "agendada" | "agendado" | "in_transit" | "em_transito"
            | "em_trânsito" => Some(CollectionStatus::InTransit),
            "completed" | "concluida" | "concluída" | "concluido" | "concluído" => {
                Some(CollectionStatus::Completed)
            }
            _ => None,
        }
    }
}

impl FromStr for CollectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_loose(s).ok_or_else(|| format!("未知的状态: {}", s))
    }
}

// ==========================================
// ProfileRole - 人员档案角色
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileRole {
    Technician,
    Supervisor,
}

impl ProfileRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProfileRole::Technician => "technician",
            ProfileRole::Supervisor => "supervisor",
        }
    }
}

impl FromStr for ProfileRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "technician" => Ok(ProfileRole::Technician),
            "supervisor" => Ok(ProfileRole::Supervisor),
            other => Err(format!("未知的人员角色: {}", other)),
        }
    }
}

// ==========================================
// Owner - 数据归属账户
// ==========================================
// 由调用方显式传入写入器，写入器内部不读取任何全局会话
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Owner {
    pub user_id: String,
}

impl Owner {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    /// user_id 为空白视为未登录
    pub fn is_authenticated(&self) -> bool {
        !self.user_id.trim().is_empty()
    }
}
