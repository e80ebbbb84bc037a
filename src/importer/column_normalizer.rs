// ==========================================
// 履约有效率系统 - 列标准化器
// ==========================================
// 职责: 源列名 → 标准字段 + 类型转换 + 文本默认值
// 规则:
// - 仅映射表与源表同时存在的列被保留；缺失列不报错
// - 日期按固定格式严格解析，失败为 None（不回退其他格式）
// - 数值解析失败为 None（不置 0，避免污染汇总）
// - 文本字段缺失为空串（永不为 None）
// - 订单号未通过校验的行被丢弃；全部丢弃时报内容结构错误
// ==========================================

use crate::domain::{CanonicalField, CanonicalRecord, CellValue, Country, RawRow};
use crate::importer::country_classifier::{classify, ClassifierInput};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::order_validator;
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeSet;
use tracing::{debug, info};

/// 源列名 → 标准字段
pub const COLUMN_MAPPING: &[(&str, CanonicalField)] = &[
    ("Order #", CanonicalField::OrderNumber),
    ("Shipping #", CanonicalField::ShippingNumber),
    ("Completed date", CanonicalField::CompletedDate),
    ("Customer", CanonicalField::Customer),
    ("Payment", CanonicalField::Payment),
    ("Sku", CanonicalField::Sku),
    ("Product name", CanonicalField::ProductName),
    ("Total revenues", CanonicalField::TotalRevenues),
    ("Quantity", CanonicalField::Quantity),
    ("Product cost", CanonicalField::ProductCost),
    ("Order status", CanonicalField::OrderStatus),
    ("Last tracking", CanonicalField::LastTracking),
    ("Last tracking date", CanonicalField::LastTrackingDate),
    ("Platform", CanonicalField::Platform),
    ("Zip", CanonicalField::ZipCode),
    ("Province code", CanonicalField::ProvinceCode),
];

/// completed_date 文本格式（日/月/年 时:分）
pub const COMPLETED_DATE_FORMAT: &str = "%d/%m/%Y %H:%M";
/// last_tracking_date 文本格式（日/月/年）
pub const LAST_TRACKING_DATE_FORMAT: &str = "%d/%m/%Y";

/// 诊断信息中保留的被拒订单号样例数
const REJECTED_SAMPLE_SIZE: usize = 5;

/// 标准化结果
#[derive(Debug, Clone)]
pub struct NormalizedBatch {
    pub records: Vec<CanonicalRecord>,
    pub present_fields: BTreeSet<CanonicalField>,
    pub rejected_rows: usize,
}

// ==========================================
// 单元格解析
// ==========================================

fn parse_completed_date(cell: &CellValue) -> Option<NaiveDateTime> {
    match cell {
        CellValue::DateTime(dt) => Some(*dt),
        CellValue::Text(s) => NaiveDateTime::parse_from_str(s.trim(), COMPLETED_DATE_FORMAT).ok(),
        _ => None,
    }
}

fn parse_last_tracking_date(cell: &CellValue) -> Option<NaiveDate> {
    match cell {
        CellValue::DateTime(dt) => Some(dt.date()),
        CellValue::Text(s) => NaiveDate::parse_from_str(s.trim(), LAST_TRACKING_DATE_FORMAT).ok(),
        _ => None,
    }
}

fn parse_decimal(cell: &CellValue) -> Option<f64> {
    let value = match cell {
        CellValue::Number(n) => Some(*n),
        CellValue::Text(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    value.filter(|v| v.is_finite())
}

fn parse_integer(cell: &CellValue) -> Option<i64> {
    parse_decimal(cell)
        .filter(|v| v.fract() == 0.0 && v.abs() < i64::MAX as f64)
        .map(|v| v as i64)
}

// ==========================================
// ColumnNormalizer
// ==========================================
pub struct ColumnNormalizer {
    /// 源表与映射表共有的列
    carried: Vec<(&'static str, CanonicalField)>,
}

impl ColumnNormalizer {
    /// 按源表表头确定保留列
    pub fn for_headers(headers: &[String]) -> Self {
        let carried = COLUMN_MAPPING
            .iter()
            .filter(|(label, _)| headers.iter().any(|h| h == label))
            .copied()
            .collect();
        Self { carried }
    }

    pub fn present_fields(&self) -> BTreeSet<CanonicalField> {
        self.carried.iter().map(|(_, field)| *field).collect()
    }

    fn cell<'r>(&self, row: &'r RawRow, field: CanonicalField) -> Option<&'r CellValue> {
        self.carried
            .iter()
            .find(|(_, f)| *f == field)
            .and_then(|(label, _)| row.get(label))
    }

    fn text(&self, row: &RawRow, field: CanonicalField) -> String {
        self.cell(row, field).map(CellValue::as_text).unwrap_or_default()
    }

    /// 单行标准化；订单号无效时返回 None
    pub fn normalize_row(
        &self,
        row: &RawRow,
        country_override: Option<Country>,
    ) -> Option<CanonicalRecord> {
        if !order_validator::is_valid_cell(self.cell(row, CanonicalField::OrderNumber)) {
            return None;
        }

        let mut record = CanonicalRecord::with_order_number(self.text(row, CanonicalField::OrderNumber));
        record.shipping_number = self.text(row, CanonicalField::ShippingNumber);
        record.completed_date = self
            .cell(row, CanonicalField::CompletedDate)
            .and_then(parse_completed_date);
        record.customer = self.text(row, CanonicalField::Customer);
        record.payment = self.text(row, CanonicalField::Payment);
        record.sku = self.text(row, CanonicalField::Sku);
        record.product_name = self.text(row, CanonicalField::ProductName);
        record.total_revenues = self.cell(row, CanonicalField::TotalRevenues).and_then(parse_decimal);
        record.quantity = self.cell(row, CanonicalField::Quantity).and_then(parse_integer);
        record.product_cost = self.cell(row, CanonicalField::ProductCost).and_then(parse_decimal);
        record.order_status = self.text(row, CanonicalField::OrderStatus);
        record.last_tracking = self.text(row, CanonicalField::LastTracking);
        record.last_tracking_date = self
            .cell(row, CanonicalField::LastTrackingDate)
            .and_then(parse_last_tracking_date);
        record.platform = self.text(row, CanonicalField::Platform);
        record.zip_code = self.text(row, CanonicalField::ZipCode);
        record.province_code = self.text(row, CanonicalField::ProvinceCode);

        record.pais = classify(ClassifierInput::from(&record), country_override);
        Some(record)
    }

    /// 批量标准化
    ///
    /// # 参数
    /// - headers: 源表表头（用于诊断）
    /// - rows: 已清理的原始行
    /// - country_override: 人工指定国家
    ///
    /// # 返回
    /// - Ok(NormalizedBatch): 至少一条有效记录
    /// - Err(StructuralContent): 全部行被过滤
    pub fn normalize(
        &self,
        headers: &[String],
        rows: &[RawRow],
        country_override: Option<Country>,
    ) -> ImportResult<NormalizedBatch> {
        let mut records = Vec::with_capacity(rows.len());
        let mut sample_rejected = Vec::new();
        let mut rejected_rows = 0;

        for row in rows {
            match self.normalize_row(row, country_override) {
                Some(record) => records.push(record),
                None => {
                    rejected_rows += 1;
                    if sample_rejected.len() < REJECTED_SAMPLE_SIZE {
                        sample_rejected.push(self.text(row, CanonicalField::OrderNumber));
                    }
                }
            }
        }

        debug!(
            valid = records.len(),
            rejected = rejected_rows,
            "订单号校验完成"
        );

        if records.is_empty() {
            return Err(ImportError::StructuralContent {
                total_rows: rows.len(),
                columns_found: headers.to_vec(),
                sample_rejected,
            });
        }

        info!(
            records = records.len(),
            rejected = rejected_rows,
            fields = self.carried.len(),
            "列标准化完成"
        );

        Ok(NormalizedBatch {
            records,
            present_fields: self.present_fields(),
            rejected_rows,
        })
    }
}
