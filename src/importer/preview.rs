// ==========================================
// 物流管理系统 - 导入预览
// ==========================================
// 用途: 解析成功后、落库之前展示给用户的内容
// ==========================================

use crate::domain::{ImportKind, RecordBatch};
use crate::i18n::t_with_args;
use serde::{Deserialize, Serialize};

// ==========================================
// ParseWarning - 非致命解析警告
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub row_number: Option<usize>, // None 表示整个文件
    pub field: Option<String>,
    pub message: String,
}

impl ParseWarning {
    pub fn file_level(message: impl Into<String>) -> Self {
        Self {
            row_number: None,
            field: None,
            message: message.into(),
        }
    }

    pub fn for_field(row_number: usize, field: &str, message: impl Into<String>) -> Self {
        Self {
            row_number: Some(row_number),
            field: Some(field.to_string()),
            message: message.into(),
        }
    }
}

// ==========================================
// DiscardedRecord - 被校验丢弃的行
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscardedRecord {
    pub row_number: usize,
    pub missing_fields: Vec<String>,
}

// ==========================================
// ImportPreview
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub kind: ImportKind,
    pub file_name: String,
    pub batch: RecordBatch,
    pub warnings: Vec<ParseWarning>,
    pub discarded: Vec<DiscardedRecord>,
}

impl ImportPreview {
    pub fn valid_count(&self) -> usize {
        self.batch.len()
    }

    pub fn discarded_count(&self) -> usize {
        self.discarded.len()
    }

    /// 源文件中的非空数据行数
    pub fn total_rows(&self) -> usize {
        self.valid_count() + self.discarded_count()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    pub fn summary(&self) -> String {
        t_with_args(
            "import.parsed",
            &[
                ("count", self.valid_count().to_string().as_str()),
                ("discarded", self.discarded_count().to_string().as_str()),
            ],
        )
    }
}
