// ==========================================
// 履约有效率系统 - 订单与上传批次实体
// ==========================================
// 职责: 原始行 / 标准订单记录 / 上传批次
// 红线: 批次一经写入不可修改，删除批次级联删除其记录
// ==========================================

use crate::domain::types::{CellValue, Country};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// RawRow - 原始行
// ==========================================
// 有序映射: 列名 → 单元格值（保持表头顺序）
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRow {
    cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: CellValue) {
        self.cells.push((column.into(), value));
    }

    /// 按列名取值（列名已 trim）
    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    /// 第一列的值
    pub fn first_cell(&self) -> Option<&CellValue> {
        self.cells.first().map(|(_, value)| value)
    }

    pub fn values(&self) -> impl Iterator<Item = &CellValue> {
        self.cells.iter().map(|(_, value)| value)
    }

    pub fn is_blank(&self) -> bool {
        self.values().all(CellValue::is_empty)
    }
}

impl<S: Into<String>> FromIterator<(S, CellValue)> for RawRow {
    fn from_iter<T: IntoIterator<Item = (S, CellValue)>>(iter: T) -> Self {
        Self {
            cells: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

// ==========================================
// RawTable - 原始表格（表头 + 数据行）
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<RawRow>) -> Self {
        Self { headers, rows }
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.headers.iter().any(|h| h == column)
    }
}

// ==========================================
// CanonicalRecord - 标准订单记录
// ==========================================
// 数值/日期字段解析失败为 None；文本字段缺失为空串，永不为 None
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub order_number: String,              // 订单号（非空，已通过校验）
    pub shipping_number: String,           // 运单号
    pub completed_date: Option<NaiveDateTime>, // 完成时间（None = 尚未完成）
    pub customer: String,
    pub payment: String,
    pub sku: String,
    pub product_name: String,
    pub total_revenues: Option<f64>,
    pub quantity: Option<i64>,
    pub product_cost: Option<f64>,
    pub order_status: String,
    pub last_tracking: String,
    pub last_tracking_date: Option<NaiveDate>,
    pub platform: String,
    pub zip_code: String,
    pub province_code: String,
    pub pais: Country,                     // 国家（必填，由分类器解析）
}

impl CanonicalRecord {
    /// 以订单号创建空记录（其余文本为空串，数值/日期为 None）
    pub fn with_order_number(order_number: impl Into<String>) -> Self {
        Self {
            order_number: order_number.into(),
            shipping_number: String::new(),
            completed_date: None,
            customer: String::new(),
            payment: String::new(),
            sku: String::new(),
            product_name: String::new(),
            total_revenues: None,
            quantity: None,
            product_cost: None,
            order_status: String::new(),
            last_tracking: String::new(),
            last_tracking_date: None,
            platform: String::new(),
            zip_code: String::new(),
            province_code: String::new(),
            pais: Country::Italia,
        }
    }
}

// ==========================================
// BatchPeriod - 批次周期
// ==========================================
// 批次内有效 completed_date 的最小/最大日期
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchPeriod {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

// ==========================================
// ChunkPolicy - 分块写入策略
// ==========================================
// 记录数超过阈值时改用较小分块

/// 单条多行 INSERT 的最大行数
///
/// SQLite 单语句最多 32766 个绑定参数，order_record 每行 18 个
pub const MAX_CHUNK_SIZE: usize = 32766 / 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkPolicy {
    pub chunk_size: usize,
    pub large_chunk_size: usize,
    pub large_batch_threshold: usize,
}

impl ChunkPolicy {
    pub fn chunk_size_for(&self, record_count: usize) -> usize {
        let size = if record_count > self.large_batch_threshold {
            self.large_chunk_size
        } else {
            self.chunk_size
        };
        size.clamp(1, MAX_CHUNK_SIZE)
    }
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_size: 500,
            large_chunk_size: 100,
            large_batch_threshold: 500,
        }
    }
}

// ==========================================
// NewUploadBatch - 待写入的批次元数据
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUploadBatch {
    pub name: String,
    pub period: Option<BatchPeriod>,
    pub record_count: usize,
}

// ==========================================
// UploadBatch - 上传批次
// ==========================================
// 对齐: upload_batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadBatch {
    pub batch_id: String,                  // 批次 ID（UUID）
    pub name: String,                      // 显示名称（不要求唯一）
    pub period_start: Option<NaiveDate>,
    pub period_end: Option<NaiveDate>,
    pub record_count: i64,
    pub created_at: DateTime<Utc>,
}

impl UploadBatch {
    pub fn period(&self) -> Option<BatchPeriod> {
        match (self.period_start, self.period_end) {
            (Some(start), Some(end)) => Some(BatchPeriod { start, end }),
            _ => None,
        }
    }
}

// ==========================================
// BatchSummary - 批次列表项（含国家范围内记录数）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch: UploadBatch,
    pub country: Option<Country>,
    pub scoped_record_count: i64,
}

impl BatchSummary {
    /// 展示标签: "<名称> (<起> - <止>) - <n> records[ (<国家>)]"
    pub fn display_label(&self) -> String {
        let mut label = self.batch.name.clone();
        if let Some(period) = self.batch.period() {
            label.push_str(&format!(
                " ({} - {})",
                period.start.format("%d/%m/%Y"),
                period.end.format("%d/%m/%Y")
            ));
        }
        match self.country {
            Some(country) => label.push_str(&format!(
                " - {} records ({})",
                self.scoped_record_count, country
            )),
            None => label.push_str(&format!(" - {} records", self.scoped_record_count)),
        }
        label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_batch(period: bool) -> UploadBatch {
        UploadBatch {
            batch_id: "b-1".to_string(),
            name: "Dados Abril 2025".to_string(),
            period_start: period.then(|| NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()),
            period_end: period.then(|| NaiveDate::from_ymd_opt(2025, 4, 30).unwrap()),
            record_count: 12,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_label_with_period() {
        let summary = BatchSummary {
            batch: sample_batch(true),
            country: None,
            scoped_record_count: 12,
        };
        assert_eq!(
            summary.display_label(),
            "Dados Abril 2025 (01/04/2025 - 30/04/2025) - 12 records"
        );
    }

    #[test]
    fn test_display_label_without_period_scoped() {
        let summary = BatchSummary {
            batch: sample_batch(false),
            country: Some(Country::Espanha),
            scoped_record_count: 3,
        };
        assert_eq!(summary.display_label(), "Dados Abril 2025 - 3 records (Espanha)");
    }

    #[test]
    fn test_raw_row_lookup() {
        let row: RawRow = vec![
            ("Order #", CellValue::from("#ITA1")),
            ("Zip", CellValue::Empty),
        ]
        .into_iter()
        .collect();

        assert_eq!(row.first_cell(), Some(&CellValue::Text("#ITA1".to_string())));
        assert_eq!(row.get("Zip"), Some(&CellValue::Empty));
        assert!(row.get("Sku").is_none());
        assert!(!row.is_blank());
    }

    #[test]
    fn test_chunk_policy_switches_on_large_batches() {
        let policy = ChunkPolicy::default();
        assert_eq!(policy.chunk_size_for(10), 500);
        assert_eq!(policy.chunk_size_for(500), 500);
        assert_eq!(policy.chunk_size_for(501), 100);

        let zero = ChunkPolicy {
            chunk_size: 0,
            large_chunk_size: 0,
            large_batch_threshold: 0,
        };
        assert_eq!(zero.chunk_size_for(5), 1);
    }

    #[test]
    fn test_chunk_size_capped_by_bind_limit() {
        let huge = ChunkPolicy {
            chunk_size: 5000,
            large_chunk_size: 2000,
            large_batch_threshold: 3000,
        };
        assert_eq!(MAX_CHUNK_SIZE, 1820);
        assert_eq!(huge.chunk_size_for(100), MAX_CHUNK_SIZE);
        assert_eq!(huge.chunk_size_for(4000), MAX_CHUNK_SIZE);
    }
}
