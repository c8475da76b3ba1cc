// ==========================================
// 物流管理系统 - 必填字段校验器
// ==========================================
// 阶段 2: 丢弃缺少必填字段的记录
// 红线: 不修改保留下来的记录
// ==========================================

use crate::domain::{ImportKind, ImportRecord, RecordBatch};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::import_trait::RecordValidator;
use crate::importer::preview::DiscardedRecord;
use tracing::{debug, warn};

/// 校验结果
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub batch: RecordBatch,
    pub discarded: Vec<DiscardedRecord>,
}

pub struct RequiredFieldValidator;

impl RecordValidator for RequiredFieldValidator {
    fn filter(
        &self,
        kind: ImportKind,
        records: Vec<ImportRecord>,
    ) -> ImportResult<ValidationOutcome> {
        let mut batch = RecordBatch::empty(kind);
        let mut discarded = Vec::new();

        for record in records {
            let missing = record.missing_required_fields();
            if !missing.is_empty() {
                debug!(row = record.row_number(), missing = ?missing, "丢弃缺少必填字段的记录");
                discarded.push(DiscardedRecord {
                    row_number: record.row_number(),
                    missing_fields: missing.into_iter().map(str::to_string).collect(),
                });
                continue;
            }

            if let Err(other) = batch.push(record) {
                // 映射器按种类产出记录，种类不符只可能是调用方混用
                warn!(
                    expected = %kind,
                    actual = %other.kind(),
                    row = other.row_number(),
                    "记录种类与批次不符，已丢弃"
                );
                discarded.push(DiscardedRecord {
                    row_number: other.row_number(),
                    missing_fields: Vec::new(),
                });
            }
        }

        if batch.is_empty() {
            return Err(ImportError::NoValidRecords { kind });
        }

        debug!(kind = %kind, valid = batch.len(), discarded = discarded.len(), "必填校验完成");
        Ok(ValidationOutcome { batch, discarded })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ClientRecord, ProductRecord};

    fn client(row_number: usize, name: Option<&str>) -> ImportRecord {
        ImportRecord::Client(ClientRecord {
            row_number,
            name: name.map(str::to_string),
            phone: Some("1199".to_string()),
            email: None,
            address: None,
            tax_id: None,
            contact_person: None,
        })
    }

    #[test]
    fn test_filter_drops_blank_names_without_mutation() {
        let records = vec![client(2, Some("ACME")), client(3, Some("  ")), client(4, Some("Beta"))];
        let expected_first = records[0].clone();

        let outcome = RequiredFieldValidator
            .filter(ImportKind::Clients, records)
            .unwrap();

        assert_eq!(outcome.batch.len(), 2);
        assert_eq!(outcome.batch.clone().into_records()[0], expected_first);
        assert_eq!(
            outcome.discarded,
            vec![DiscardedRecord {
                row_number: 3,
                missing_fields: vec!["name".to_string()],
            }]
        );
    }

    #[test]
    fn test_all_invalid_yields_no_valid_records() {
        let records = vec![ImportRecord::Product(ProductRecord {
            row_number: 2,
            code: None,
            description: Some("Bomba".to_string()),
            model: None,
            serial_number: None,
        })];

        let result = RequiredFieldValidator.filter(ImportKind::Products, records);
        assert!(matches!(
            result,
            Err(ImportError::NoValidRecords {
                kind: ImportKind::Products
            })
        ));
    }

    #[test]
    fn test_empty_input_yields_no_valid_records() {
        let result = RequiredFieldValidator.filter(ImportKind::Technicians, Vec::new());
        assert!(matches!(result, Err(ImportError::NoValidRecords { .. })));
    }

    #[test]
    fn test_mismatched_kind_is_discarded() {
        let outcome = RequiredFieldValidator
            .filter(
                ImportKind::Products,
                vec![
                    client(2, Some("ACME")),
                    ImportRecord::Product(ProductRecord {
                        row_number: 3,
                        code: Some("P-1".to_string()),
                        description: None,
                        model: None,
                        serial_number: None,
                    }),
                ],
            )
            .unwrap();

        assert_eq!(outcome.batch.len(), 1);
        assert_eq!(outcome.discarded[0].row_number, 2);
    }
}
