// ==========================================
// 物流管理系统 - 导入管道 Trait
// ==========================================
// 职责: 定义导入各阶段接口（不包含实现）
// 流程: 文件解析 → 字段映射 → 必填校验 → 落库
// ==========================================

use crate::domain::{ImportKind, ImportRecord};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::{ParsedRows, RawRecord, SourceFile};
use crate::importer::preview::ParseWarning;
use crate::importer::record_validator::ValidationOutcome;

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser, JsonParser, PdfStubParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始行记录（列名 → 值）
    ///
    /// # 返回
    /// - Ok(ParsedRows): 行记录（已跳过完全空白的行）及非致命警告
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_records(&self, file: &SourceFile) -> ImportResult<ParsedRows>;
}

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 字段映射接口（阶段 1）
// 实现者: RecordFieldMapper
pub trait FieldMapper: Send + Sync {
    /// 将原始行映射为指定种类的导入记录
    ///
    /// # 参数
    /// - kind: 当前导入种类
    /// - raw: 原始行
    /// - warnings: 无法识别的值不拒绝整行，写入警告后置空
    fn map_record(
        &self,
        kind: ImportKind,
        raw: &RawRecord,
        warnings: &mut Vec<ParseWarning>,
    ) -> ImportRecord;
}

// ==========================================
// RecordValidator Trait
// ==========================================
// 用途: 必填字段过滤（阶段 2）
// 实现者: RequiredFieldValidator
pub trait RecordValidator: Send + Sync {
    /// 丢弃缺少必填字段的记录，不修改保留下来的记录
    ///
    /// # 返回
    /// - Ok(ValidationOutcome): 有效批次 + 被丢弃的行
    /// - Err(NoValidRecords): 全部被丢弃
    fn filter(&self, kind: ImportKind, records: Vec<ImportRecord>)
        -> ImportResult<ValidationOutcome>;
}
