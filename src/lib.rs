// ==========================================
// 物流管理系统 - 数据导入核心库
// ==========================================
// 技术栈: Rust + SQLite
// 定位: 将表格/文本文件批量导入揽收、产品、客户、人员数据
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 记录与实体
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 导入配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 导入事件（缓存失效 / 通知）
pub mod events;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    CollectionKind, CollectionStatus, ImportKind, ImportRecord, Owner, ProfileRole, RecordBatch,
};

// 导入流程
pub use importer::{
    ImportError, ImportPreview, ImportResult, ImportSession, ImportStage, ReconciliationWriter,
    SourceFile, WriteReport,
};

// 存储
pub use repository::{LogisticsStore, SqliteLogisticsStore};

// 配置与事件
pub use config::{ConfigManager, ImportSettings};
pub use events::{CacheInvalidator, ImportNotifier, Notification};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "物流管理系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";
