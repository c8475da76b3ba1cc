// ==========================================
// 物流管理系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::{CollectionKind, CollectionStatus};
use async_trait::async_trait;
use std::error::Error;

pub type ConfigResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）、ImportSettings（内存快照）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取 CSV 分隔符
    ///
    /// # 默认值
    /// - `,`
    async fn get_csv_delimiter(&self) -> ConfigResult<u8>;

    /// 获取揽收/派送行状态缺失或无法识别时使用的默认状态
    ///
    /// # 默认值
    /// - pending
    async fn get_default_collection_status(&self) -> ConfigResult<CollectionStatus>;

    /// 获取类型标记缺失或无法识别时使用的默认类型
    ///
    /// # 默认值
    /// - collection
    async fn get_default_collection_kind(&self) -> ConfigResult<CollectionKind>;

    /// 获取 Excel 读取的工作表名称
    ///
    /// # 返回
    /// - None: 读取第一个工作表（默认）
    async fn get_excel_sheet_name(&self) -> ConfigResult<Option<String>>;
}
