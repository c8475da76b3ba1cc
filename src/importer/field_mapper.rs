// ==========================================
// 物流管理系统 - 字段映射器实现
// ==========================================
// 职责: 源列名 → 标准字段映射 + 宽松类型转换
// 约定: 无法识别的值置空并记录警告，不拒绝整行
// ==========================================

use crate::domain::{
    ClientRecord, CollectionKind, CollectionRecord, CollectionStatus, ImportKind, ImportRecord,
    ProductRecord, ProfileRecord,
};
use crate::i18n::t_with_args;
use crate::importer::file_parser::RawRecord;
use crate::importer::import_trait::FieldMapper;
use crate::importer::preview::ParseWarning;
use chrono::{Duration, NaiveDate};
use std::collections::HashMap;

// ==========================================
// 列名别名（已折叠大小写与重音）
// ==========================================
const PARCEIRO: &[&str] = &["parceiro", "cliente", "nome_cliente", "partner", "client", "client_name"];
const ORIGIN_ADDRESS: &[&str] = &[
    "endereco_origem",
    "origem",
    "endereco_coleta",
    "origin_address",
    "origin",
    "endereco",
    "address",
];
const REQUESTED_DATE: &[&str] = &[
    "data",
    "data_solicitada",
    "data_coleta",
    "data_entrega",
    "requested_date",
    "date",
];
const ORIGIN_LAT: &[&str] = &["latitude_origem", "lat_origem", "origin_lat", "latitude", "lat"];
const ORIGIN_LNG: &[&str] = &["longitude_origem", "lng_origem", "origin_lng", "longitude", "lng"];
const DESTINATION_ADDRESS: &[&str] = &["endereco_destino", "destino", "destination_address", "destination"];
const DESTINATION_LAT: &[&str] = &["latitude_destino", "lat_destino", "destination_lat"];
const DESTINATION_LNG: &[&str] = &["longitude_destino", "lng_destino", "destination_lng"];
const PRODUCT_CODE: &[&str] = &["codigo_produto", "produto", "product_code", "product", "codigo", "code"];
const PRODUCT_DESCRIPTION: &[&str] = &["descricao_produto", "descricao", "product_description", "description"];
const QUANTITY: &[&str] = &["quantidade", "qtd", "quantity", "qty"];
const FREIGHT_VALUE: &[&str] = &["valor_frete", "frete", "freight_value", "freight", "valor"];
const STATUS: &[&str] = &["status", "situacao"];
const COLLECTION_KIND: &[&str] = &["tipo", "kind", "type"];

const CODE: &[&str] = &["codigo", "code", "codigo_produto", "product_code"];
const DESCRIPTION: &[&str] = &["descricao", "description"];
const MODEL: &[&str] = &["modelo", "model"];
const SERIAL_NUMBER: &[&str] = &["numero_serie", "numero_de_serie", "serie", "serial_number", "serial"];

const NAME: &[&str] = &["nome", "razao_social", "cliente", "name", "client", "client_name"];
const PHONE: &[&str] = &["telefone", "celular", "fone", "phone", "mobile"];
const EMAIL: &[&str] = &["email", "e_mail"];
const ADDRESS: &[&str] = &["endereco", "address"];
const TAX_ID: &[&str] = &["cnpj", "cpf", "cpf_cnpj", "documento", "tax_id"];
const CONTACT_PERSON: &[&str] = &["contato", "responsavel", "contact_person", "contact"];

const FIRST_NAME: &[&str] = &["nome", "primeiro_nome", "first_name", "name"];
const LAST_NAME: &[&str] = &["sobrenome", "ultimo_nome", "last_name", "surname"];
const ROLE: &[&str] = &["cargo", "funcao", "role", "position"];
const SUPERVISOR_ID: &[&str] = &["supervisor_id", "id_supervisor", "supervisor"];
const SHIFT: &[&str] = &["turno", "shift"];

/// Excel 日期序列号的起点（1900 日期系统）
const EXCEL_EPOCH: (i32, u32, u32) = (1899, 12, 30);
/// Excel 可表示的最大日期序列号（9999-12-31）
const EXCEL_MAX_SERIAL: f64 = 2_958_465.0;

/// 列名折叠：去首尾空白、小写、去重音、空格/连字符/点 → 下划线
pub fn fold_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            ' ' | '-' | '.' => '_',
            other => other,
        })
        .collect()
}

/// 宽松解析数字：去货币符号，兼容 "1.234,56" 与 "1234.56"
pub fn parse_loose_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .trim()
        .trim_start_matches("R$")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    let normalized = if cleaned.contains(',') && cleaned.contains('.') {
        cleaned.replace('.', "").replace(',', ".")
    } else {
        cleaned.replace(',', ".")
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// 日期规范化为 ISO `YYYY-MM-DD`
///
/// 支持 YYYY-MM-DD（可带时间）、DD/MM/YYYY、DD-MM-YYYY、YYYYMMDD、Excel 序列号；
/// 无法识别返回 None
pub fn normalize_date(value: &str) -> Option<String> {
    let value = value.trim();

    let date_part = value
        .split(|c| c == 'T' || c == ' ')
        .next()
        .unwrap_or(value);

    let parsed = NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d/%m/%Y"))
        .or_else(|_| NaiveDate::parse_from_str(date_part, "%d-%m-%Y"))
        .ok()
        .or_else(|| {
            if date_part.len() == 8 && date_part.chars().all(|c| c.is_ascii_digit()) {
                NaiveDate::parse_from_str(date_part, "%Y%m%d").ok()
            } else {
                None
            }
        })
        .or_else(|| excel_serial_to_date(value));

    parsed.map(|d| d.format("%Y-%m-%d").to_string())
}

fn excel_serial_to_date(value: &str) -> Option<NaiveDate> {
    let serial = value.parse::<f64>().ok()?;
    if !(1.0..=EXCEL_MAX_SERIAL).contains(&serial) {
        return None;
    }
    let (y, m, d) = EXCEL_EPOCH;
    NaiveDate::from_ymd_opt(y, m, d)?.checked_add_signed(Duration::days(serial.trunc() as i64))
}

// ==========================================
// RecordFieldMapper
// ==========================================
#[derive(Debug, Clone)]
pub struct RecordFieldMapper {
    default_status: CollectionStatus,
    default_kind: CollectionKind,
}

impl RecordFieldMapper {
    pub fn new(default_status: CollectionStatus, default_kind: CollectionKind) -> Self {
        Self {
            default_status,
            default_kind,
        }
    }
}

impl Default for RecordFieldMapper {
    fn default() -> Self {
        Self::new(CollectionStatus::Pending, CollectionKind::Collection)
    }
}

/// 单行取值上下文
struct RowReader<'a> {
    row_number: usize,
    values: HashMap<String, &'a str>,
    warnings: &'a mut Vec<ParseWarning>,
}

impl<'a> RowReader<'a> {
    fn new(raw: &'a RawRecord, warnings: &'a mut Vec<ParseWarning>) -> Self {
        let values = raw
            .values
            .iter()
            .map(|(k, v)| (fold_header(k), v.as_str()))
            .collect();
        Self {
            row_number: raw.row_number,
            values,
            warnings,
        }
    }

    /// 按别名顺序取第一个非空值
    fn get_string(&self, aliases: &[&str]) -> Option<String> {
        aliases.iter().find_map(|alias| {
            self.values
                .get(*alias)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        })
    }

    fn warn(&mut self, key: &str, field: &str, args: &[(&str, &str)]) {
        let row = self.row_number.to_string();
        let mut all_args = vec![("row", row.as_str()), ("field", field)];
        all_args.extend_from_slice(args);
        self.warnings.push(ParseWarning::for_field(
            self.row_number,
            field,
            t_with_args(key, &all_args),
        ));
    }

    fn parse_f64(&mut self, aliases: &[&str], field: &str) -> Option<f64> {
        let value = self.get_string(aliases)?;
        let parsed = parse_loose_number(&value);
        if parsed.is_none() {
            self.warn("import.invalid_number", field, &[("value", value.as_str())]);
        }
        parsed
    }

    /// 整数字段：允许 "2.0" 这类表格导出的整数值
    fn parse_i64(&mut self, aliases: &[&str], field: &str) -> Option<i64> {
        let value = self.get_string(aliases)?;
        let parsed = parse_loose_number(&value)
            .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
            .map(|v| v as i64);
        if parsed.is_none() {
            self.warn("import.invalid_number", field, &[("value", value.as_str())]);
        }
        parsed
    }

    /// 无法识别的日期保留原文（必填校验只看是否为空）
    fn parse_date(&mut self, aliases: &[&str], field: &str) -> Option<String> {
        let value = self.get_string(aliases)?;
        match normalize_date(&value) {
            Some(iso) => Some(iso),
            None => {
                self.warn("import.invalid_date", field, &[("value", value.as_str())]);
                Some(value)
            }
        }
    }

    fn parse_status(&mut self, default: CollectionStatus) -> CollectionStatus {
        match self.get_string(STATUS) {
            None => default,
            Some(value) => CollectionStatus::parse_loose(&value).unwrap_or_else(|| {
                self.warn(
                    "import.unknown_status",
                    "status",
                    &[("value", value.as_str()), ("default", default.as_str())],
                );
                default
            }),
        }
    }

    fn parse_kind(&mut self, default: CollectionKind) -> CollectionKind {
        match self.get_string(COLLECTION_KIND) {
            None => default,
            Some(value) => CollectionKind::parse_loose(&value).unwrap_or_else(|| {
                self.warn(
                    "import.unknown_kind",
                    "kind",
                    &[("value", value.as_str()), ("default", default.as_str())],
                );
                default
            }),
        }
    }

    fn profile(&mut self) -> ProfileRecord {
        ProfileRecord {
            row_number: self.row_number,
            first_name: self.get_string(FIRST_NAME),
            last_name: self.get_string(LAST_NAME),
            phone: self.get_string(PHONE),
            role: self.get_string(ROLE),
            supervisor_id: self.get_string(SUPERVISOR_ID),
            shift: self.get_string(SHIFT),
            address: self.get_string(ADDRESS),
        }
    }
}

impl FieldMapper for RecordFieldMapper {
    fn map_record(
        &self,
        kind: ImportKind,
        raw: &RawRecord,
        warnings: &mut Vec<ParseWarning>,
    ) -> ImportRecord {
        let mut row = RowReader::new(raw, warnings);

        match kind {
            ImportKind::Collections => ImportRecord::Collection(CollectionRecord {
                row_number: row.row_number,
                parceiro: row.get_string(PARCEIRO),
                origin_address: row.get_string(ORIGIN_ADDRESS),
                requested_date: row.parse_date(REQUESTED_DATE, "requested_date"),
                origin_lat: row.parse_f64(ORIGIN_LAT, "origin_lat"),
                origin_lng: row.parse_f64(ORIGIN_LNG, "origin_lng"),
                destination_address: row.get_string(DESTINATION_ADDRESS),
                destination_lat: row.parse_f64(DESTINATION_LAT, "destination_lat"),
                destination_lng: row.parse_f64(DESTINATION_LNG, "destination_lng"),
                product_code: row.get_string(PRODUCT_CODE),
                product_description: row.get_string(PRODUCT_DESCRIPTION),
                quantity: row.parse_i64(QUANTITY, "quantity"),
                freight_value: row.parse_f64(FREIGHT_VALUE, "freight_value"),
                status: row.parse_status(self.default_status),
                kind: row.parse_kind(self.default_kind),
            }),
            ImportKind::Products => ImportRecord::Product(ProductRecord {
                row_number: row.row_number,
                code: row.get_string(CODE),
                description: row.get_string(DESCRIPTION),
                model: row.get_string(MODEL),
                serial_number: row.get_string(SERIAL_NUMBER),
            }),
            ImportKind::Clients => ImportRecord::Client(ClientRecord {
                row_number: row.row_number,
                name: row.get_string(NAME),
                phone: row.get_string(PHONE),
                email: row.get_string(EMAIL),
                address: row.get_string(ADDRESS),
                tax_id: row.get_string(TAX_ID),
                contact_person: row.get_string(CONTACT_PERSON),
            }),
            ImportKind::Technicians => ImportRecord::Technician(row.profile()),
            ImportKind::Supervisors => ImportRecord::Supervisor(row.profile()),
        }
    }
}
