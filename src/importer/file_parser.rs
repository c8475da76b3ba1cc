// ==========================================
// 物流管理系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx) / CSV (.csv) / JSON (.json) / PDF (.pdf，示例数据)
// ==========================================

use crate::domain::ImportKind;
use crate::i18n::{t, t_with_args};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::FileParser;
use crate::importer::preview::ParseWarning;
use calamine::{Reader, Xlsx};
use csv::ReaderBuilder;
use serde_json::Value;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use tracing::debug;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

// ==========================================
// SourceFile - 用户提交的文件
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl SourceFile {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }

    /// 从磁盘读取文件
    pub fn from_path<P: AsRef<Path>>(path: P) -> ImportResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ImportError::FileReadError(t_with_args(
                "import.file_not_found",
                &[("path", path.display().to_string().as_str())],
            )));
        }

        let bytes = std::fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        Ok(Self { name, bytes })
    }

    /// 扩展名（小写，不含点；无扩展名时为空串）
    pub fn extension(&self) -> String {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase()
    }
}

// ==========================================
// 解析产物
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 源文件中的行号（表格含表头行，首个数据行为 2）
    pub row_number: usize,
    pub values: HashMap<String, String>,
}

impl RawRecord {
    pub fn new(row_number: usize, values: HashMap<String, String>) -> Self {
        Self { row_number, values }
    }

    fn is_blank(&self) -> bool {
        self.values.values().all(|v| v.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedRows {
    pub rows: Vec<RawRecord>,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedRows {
    fn from_rows(rows: Vec<RawRecord>) -> Self {
        Self {
            rows,
            warnings: Vec::new(),
        }
    }
}

/// 按表头组装一行，跳过完全空白的行
fn build_row(headers: &[String], cells: Vec<String>, row_number: usize) -> Option<RawRecord> {
    let mut row_map = HashMap::new();
    for (col_idx, value) in cells.into_iter().enumerate() {
        if let Some(header) = headers.get(col_idx) {
            if header.is_empty() {
                continue;
            }
            row_map.insert(header.clone(), value.trim().to_string());
        }
    }

    let record = RawRecord::new(row_number, row_map);
    if record.is_blank() {
        None
    } else {
        Some(record)
    }
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser {
    delimiter: u8,
}

impl CsvParser {
    pub fn new(delimiter: u8) -> Self {
        Self { delimiter }
    }
}

impl Default for CsvParser {
    fn default() -> Self {
        Self::new(b',')
    }
}

impl FileParser for CsvParser {
    fn parse_to_raw_records(&self, file: &SourceFile) -> ImportResult<ParsedRows> {
        let data = file.bytes.strip_prefix(UTF8_BOM).unwrap_or(&file.bytes);

        let mut reader = ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(data);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        // 读取所有行
        let mut rows = Vec::new();
        for (row_idx, result) in reader.records().enumerate() {
            let record = result?;
            let row_number = record
                .position()
                .map(|p| p.line() as usize)
                .unwrap_or(row_idx + 2);
            let cells = record.iter().map(str::to_string).collect();

            if let Some(row) = build_row(&headers, cells, row_number) {
                rows.push(row);
            }
        }

        Ok(ParsedRows::from_rows(rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser {
    sheet_name: Option<String>,
}

impl ExcelParser {
    /// sheet_name 为空时读取第一个工作表
    pub fn new(sheet_name: Option<String>) -> Self {
        Self { sheet_name }
    }
}

impl Default for ExcelParser {
    fn default() -> Self {
        Self::new(None)
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_records(&self, file: &SourceFile) -> ImportResult<ParsedRows> {
        let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(file.bytes.as_slice()))?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = match &self.sheet_name {
            Some(name) if sheet_names.iter().any(|s| s == name) => name.clone(),
            Some(name) => {
                return Err(ImportError::ExcelParseError(format!("工作表不存在: {}", name)));
            }
            None => sheet_names
                .first()
                .cloned()
                .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?,
        };

        let range = workbook.worksheet_range(&sheet_name)?;
        let first_row = range.start().map(|(row, _)| row as usize).unwrap_or(0);

        // 提取表头（第一行）
        let mut data_rows = range.rows();
        let header_row = match data_rows.next() {
            Some(row) => row,
            None => return Ok(ParsedRows::default()),
        };

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        // 读取数据行（行号为 Excel 中的 1 起始行号）
        let mut rows = Vec::new();
        for (offset, data_row) in data_rows.enumerate() {
            let cells = data_row.iter().map(|cell| cell.to_string()).collect();
            if let Some(row) = build_row(&headers, cells, first_row + offset + 2) {
                rows.push(row);
            }
        }

        debug!(sheet = %sheet_name, rows = rows.len(), "Excel 工作表读取完成");
        Ok(ParsedRows::from_rows(rows))
    }
}

// ==========================================
// JSON Parser 实现
// ==========================================
// 顶层必须是对象数组；值统一转为文本
pub struct JsonParser;

impl JsonParser {
    fn value_to_text(value: &Value) -> String {
        match value {
            Value::Null => String::new(),
            Value::String(s) => s.clone(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => other.to_string(),
        }
    }
}

impl FileParser for JsonParser {
    fn parse_to_raw_records(&self, file: &SourceFile) -> ImportResult<ParsedRows> {
        let data = file.bytes.strip_prefix(UTF8_BOM).unwrap_or(&file.bytes);
        let root: Value = serde_json::from_slice(data)?;

        let items = root.as_array().ok_or_else(|| {
            ImportError::JsonParseError("顶层必须是对象数组".to_string())
        })?;

        let mut rows = Vec::new();
        for (idx, item) in items.iter().enumerate() {
            let object = item.as_object().ok_or_else(|| {
                ImportError::JsonParseError(format!("第 {} 个元素不是对象", idx + 1))
            })?;

            let values: HashMap<String, String> = object
                .iter()
                .map(|(k, v)| (k.trim().to_string(), Self::value_to_text(v).trim().to_string()))
                .collect();

            let record = RawRecord::new(idx + 1, values);
            if !record.is_blank() {
                rows.push(record);
            }
        }

        Ok(ParsedRows::from_rows(rows))
    }
}

// ==========================================
// PDF Parser（示例数据）
// ==========================================
// 未接入文档抽取服务：返回固定的揽收示例行，并附带警告
pub struct PdfStubParser;

impl PdfStubParser {
    fn sample_row(row_number: usize, fields: &[(&str, &str)]) -> RawRecord {
        RawRecord::new(
            row_number,
            fields
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

impl FileParser for PdfStubParser {
    fn parse_to_raw_records(&self, file: &SourceFile) -> ImportResult<ParsedRows> {
        debug!(file_name = %file.name, bytes = file.bytes.len(), "PDF 使用示例数据");

        let rows = vec![
            Self::sample_row(
                1,
                &[
                    ("parceiro", "Cliente Exemplo Ltda"),
                    ("endereco_origem", "Av. Paulista, 1000 - São Paulo"),
                    ("data", "2025-01-20"),
                    ("codigo_produto", "PRD-001"),
                    ("quantidade", "2"),
                    ("valor_frete", "150.00"),
                    ("tipo", "coleta"),
                ],
            ),
            Self::sample_row(
                2,
                &[
                    ("parceiro", "Distribuidora Modelo SA"),
                    ("endereco_origem", "Rua XV de Novembro, 200 - Curitiba"),
                    ("data", "2025-01-21"),
                    ("codigo_produto", "PRD-002"),
                    ("quantidade", "1"),
                    ("valor_frete", "89.90"),
                    ("tipo", "entrega"),
                ],
            ),
        ];

        Ok(ParsedRows {
            rows,
            warnings: vec![ParseWarning::file_level(t("import.pdf_stub_warning"))],
        })
    }
}

// ==========================================
// 通用文件解析器（根据种类与扩展名选择）
// ==========================================
pub struct UniversalFileParser {
    csv_delimiter: u8,
    sheet_name: Option<String>,
}

impl UniversalFileParser {
    pub fn new(csv_delimiter: u8, sheet_name: Option<String>) -> Self {
        Self {
            csv_delimiter,
            sheet_name,
        }
    }

    pub fn parse(&self, kind: ImportKind, file: &SourceFile) -> ImportResult<ParsedRows> {
        let ext = file.extension();
        if !kind.accepts_extension(&ext) {
            return Err(ImportError::UnsupportedFormat {
                kind,
                extension: ext,
                accepted: kind.accepted_formats_label(),
            });
        }

        match ext.as_str() {
            "csv" => CsvParser::new(self.csv_delimiter).parse_to_raw_records(file),
            "xlsx" => ExcelParser::new(self.sheet_name.clone()).parse_to_raw_records(file),
            "json" => JsonParser.parse_to_raw_records(file),
            "pdf" => PdfStubParser.parse_to_raw_records(file),
            _ => Err(ImportError::UnsupportedFormat {
                kind,
                extension: ext,
                accepted: kind.accepted_formats_label(),
            }),
        }
    }
}

impl Default for UniversalFileParser {
    fn default() -> Self {
        Self::new(b',', None)
    }
}
