// ==========================================
// 物流管理系统 - 导入层
// ==========================================
// 职责: 外部文件 → 校验后的记录批次 → 落库
// 支持: Excel(.xlsx), CSV, JSON, PDF(占位解析)
// 流程: 解析 → 字段映射 → 必填校验 → 预览 → 写入
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod file_parser;
pub mod import_session;
pub mod import_trait;
pub mod preview;
pub mod reconciliation_writer;
pub mod record_extractor;
pub mod record_validator;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::RecordFieldMapper;
pub use file_parser::{
    CsvParser, ExcelParser, JsonParser, ParsedRows, PdfStubParser, RawRecord, SourceFile,
    UniversalFileParser,
};
pub use import_session::{ImportSession, ImportStage};
pub use preview::{DiscardedRecord, ImportPreview, ParseWarning};
pub use reconciliation_writer::{ReconciliationWriter, WriteReport};
pub use record_extractor::RecordExtractor;
pub use record_validator::{RequiredFieldValidator, ValidationOutcome};

// 重导出 Trait 接口
pub use import_trait::{FieldMapper, FileParser, RecordValidator};
