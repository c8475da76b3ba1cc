// ==========================================
// 物流管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约定: 每个错误在阶段边界转换为一条用户可见提示（user_message）
// ==========================================

use crate::domain::ImportKind;
use crate::i18n::{t, t_with_args};
use crate::repository::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件格式不支持: .{extension}（{kind} 仅支持 {accepted}）")]
    UnsupportedFormat {
        kind: ImportKind,
        extension: String,
        accepted: String,
    },

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("JSON 解析失败: {0}")]
    JsonParseError(String),

    // ===== 数据质量错误 =====
    #[error("没有有效记录 (kind={kind})")]
    NoValidRecords { kind: ImportKind },

    // ===== 写入错误 =====
    #[error("未登录，无法导入")]
    NotAuthenticated,

    /// 存储端拒绝整批写入，消息原样保留
    #[error("{0}")]
    Persistence(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 流程错误 =====
    #[error("导入会话状态错误: {0}")]
    InvalidSessionState(String),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 面向用户的提示文本（按当前语言）
    pub fn user_message(&self) -> String {
        match self {
            ImportError::UnsupportedFormat {
                kind,
                extension,
                accepted,
            } => t_with_args(
                "import.unsupported_format",
                &[
                    ("extension", extension.as_str()),
                    ("kind", kind.as_str()),
                    ("accepted", accepted.as_str()),
                ],
            ),
            ImportError::NoValidRecords { kind } => {
                t_with_args("import.no_valid_records", &[("kind", kind.as_str())])
            }
            ImportError::NotAuthenticated => t("import.not_authenticated"),
            ImportError::Persistence(message) => {
                t_with_args("import.persistence_failed", &[("message", message.as_str())])
            }
            other => t_with_args("import.parse_failed", &[("message", other.to_string().as_str())]),
        }
    }

    /// 是否属于解析阶段（会话回到上传阶段）
    pub fn is_parse_stage(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedFormat { .. }
                | ImportError::FileReadError(_)
                | ImportError::CsvParseError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::JsonParseError(_)
                | ImportError::NoValidRecords { .. }
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::XlsxError>
impl From<calamine::XlsxError> for ImportError {
    fn from(err: calamine::XlsxError) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

// 实现 From<serde_json::Error>
impl From<serde_json::Error> for ImportError {
    fn from(err: serde_json::Error) -> Self {
        ImportError::JsonParseError(err.to_string())
    }
}

// 存储错误统一视为整批被拒，保留存储端原始消息
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        ImportError::Persistence(err.store_message())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
