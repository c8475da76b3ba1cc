// ==========================================
// 物流管理系统 - 记录抽取（解析 → 映射 → 校验）
// ==========================================
// 职责: 串联阶段 0~2，产出导入预览
// 说明: 纯同步计算，由会话放到阻塞线程执行
// ==========================================

use crate::config::ImportSettings;
use crate::domain::ImportKind;
use crate::importer::error::ImportResult;
use crate::importer::field_mapper::RecordFieldMapper;
use crate::importer::file_parser::{SourceFile, UniversalFileParser};
use crate::importer::import_trait::{FieldMapper, RecordValidator};
use crate::importer::preview::ImportPreview;
use crate::importer::record_validator::RequiredFieldValidator;
use std::time::Instant;
use tracing::info;

pub struct RecordExtractor {
    parser: UniversalFileParser,
    mapper: RecordFieldMapper,
    validator: RequiredFieldValidator,
}

impl RecordExtractor {
    pub fn new(settings: &ImportSettings) -> Self {
        Self {
            parser: UniversalFileParser::new(
                settings.csv_delimiter,
                settings.excel_sheet_name.clone(),
            ),
            mapper: RecordFieldMapper::new(
                settings.default_collection_status,
                settings.default_collection_kind,
            ),
            validator: RequiredFieldValidator,
        }
    }

    pub fn extract(&self, kind: ImportKind, file: &SourceFile) -> ImportResult<ImportPreview> {
        let start = Instant::now();

        // 阶段 0: 文件解析
        let parsed = self.parser.parse(kind, file)?;
        let mut warnings = parsed.warnings;

        // 阶段 1: 字段映射
        let records = parsed
            .rows
            .iter()
            .map(|raw| self.mapper.map_record(kind, raw, &mut warnings))
            .collect::<Vec<_>>();
        let rows = records.len();

        // 阶段 2: 必填校验
        let outcome = self.validator.filter(kind, records)?;

        info!(
            kind = %kind,
            file_name = %file.name,
            rows,
            valid = outcome.batch.len(),
            discarded = outcome.discarded.len(),
            warnings = warnings.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "文件解析完成"
        );

        Ok(ImportPreview {
            kind,
            file_name: file.name.clone(),
            batch: outcome.batch,
            warnings,
            discarded: outcome.discarded,
        })
    }
}

impl Default for RecordExtractor {
    fn default() -> Self {
        Self::new(&ImportSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RecordBatch;
    use crate::importer::error::ImportError;

    #[test]
    fn test_extract_clients_csv() {
        let file = SourceFile::new(
            "clientes.csv",
            "nome,telefone,email\nACME,1199,a@acme.com\n,2288,\nBeta,,\n".as_bytes().to_vec(),
        );

        let preview = RecordExtractor::default()
            .extract(ImportKind::Clients, &file)
            .unwrap();

        assert_eq!(preview.valid_count(), 2);
        assert_eq!(preview.discarded_count(), 1);
        assert_eq!(preview.total_rows(), 3);
        assert_eq!(preview.discarded[0].row_number, 3);
        assert!(matches!(preview.batch, RecordBatch::Clients(_)));
    }

    #[test]
    fn test_extract_uses_configured_delimiter_and_defaults() {
        let settings = ImportSettings {
            csv_delimiter: b';',
            default_collection_kind: crate::domain::CollectionKind::Delivery,
            ..ImportSettings::default()
        };
        let file = SourceFile::new(
            "entregas.csv",
            "parceiro;endereco_origem;data\nACME;Rua A;2025-01-20\n".as_bytes().to_vec(),
        );

        let preview = RecordExtractor::new(&settings)
            .extract(ImportKind::Collections, &file)
            .unwrap();

        match preview.batch {
            RecordBatch::Collections(records) => {
                assert_eq!(records.len(), 1);
                assert_eq!(records[0].kind, crate::domain::CollectionKind::Delivery);
            }
            other => panic!("unexpected batch: {:?}", other),
        }
    }

    #[test]
    fn test_extract_pdf_carries_warning() {
        let file = SourceFile::new("coletas.pdf", b"%PDF-1.4".to_vec());
        let preview = RecordExtractor::default()
            .extract(ImportKind::Collections, &file)
            .unwrap();

        assert!(preview.valid_count() > 0);
        assert!(preview.has_warnings());
    }

    #[test]
    fn test_extract_all_invalid() {
        let file = SourceFile::new("produtos.csv", "codigo,descricao\n,Bomba\n".as_bytes().to_vec());
        let result = RecordExtractor::default().extract(ImportKind::Products, &file);
        assert!(matches!(result, Err(ImportError::NoValidRecords { .. })));
    }
}
