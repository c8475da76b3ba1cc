// ==========================================
// 物流管理系统 - 导入配置快照
// ==========================================
// 职责: 一次性读取导入所需配置，供解析阶段（阻塞线程）使用
// ==========================================

use crate::config::import_config_trait::{ConfigResult, ImportConfigReader};
use crate::domain::{CollectionKind, CollectionStatus};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSettings {
    pub csv_delimiter: u8,
    pub default_collection_status: CollectionStatus,
    pub default_collection_kind: CollectionKind,
    pub excel_sheet_name: Option<String>,
}

impl Default for ImportSettings {
    fn default() -> Self {
        Self {
            csv_delimiter: b',',
            default_collection_status: CollectionStatus::Pending,
            default_collection_kind: CollectionKind::Collection,
            excel_sheet_name: None,
        }
    }
}

impl ImportSettings {
    /// 从配置读取器加载快照
    pub async fn load(reader: &dyn ImportConfigReader) -> ConfigResult<Self> {
        Ok(Self {
            csv_delimiter: reader.get_csv_delimiter().await?,
            default_collection_status: reader.get_default_collection_status().await?,
            default_collection_kind: reader.get_default_collection_kind().await?,
            excel_sheet_name: reader.get_excel_sheet_name().await?,
        })
    }
}

// 快照本身也可作为读取器使用（测试无需数据库）
#[async_trait]
impl ImportConfigReader for ImportSettings {
    async fn get_csv_delimiter(&self) -> ConfigResult<u8> {
        Ok(self.csv_delimiter)
    }

    async fn get_default_collection_status(&self) -> ConfigResult<CollectionStatus> {
        Ok(self.default_collection_status)
    }

    async fn get_default_collection_kind(&self) -> ConfigResult<CollectionKind> {
        Ok(self.default_collection_kind)
    }

    async fn get_excel_sheet_name(&self) -> ConfigResult<Option<String>> {
        Ok(self.excel_sheet_name.clone())
    }
}
