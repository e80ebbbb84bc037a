// ==========================================
// 履约有效率系统 - 行清理器
// ==========================================
// 职责: 去除重复表头行与表尾“合计”行
// 说明: 启发式规则，只裁剪不报错；漏判由订单号校验兜底
// ==========================================

use crate::domain::RawRow;
use crate::importer::column_normalizer::COLUMN_MAPPING;
use crate::importer::country_classifier::starts_with_order_marker;
use tracing::debug;

/// 合计行关键字（小写）
const TOTAL_MARKER: &str = "total";

/// 清理结果
#[derive(Debug, Clone, Default)]
pub struct SanitizedRows {
    pub rows: Vec<RawRow>,
    pub dropped_header: bool,
    pub dropped_total: bool,
}

pub struct RowSanitizer;

impl RowSanitizer {
    /// 首行首列是否为重复表头（或空）
    fn is_duplicated_header(row: &RawRow) -> bool {
        let first = row.first_cell().map(|c| c.as_text()).unwrap_or_default();
        if starts_with_order_marker(&first) {
            return false;
        }

        let normalized = first.trim().to_lowercase();
        normalized.is_empty()
            || COLUMN_MAPPING
                .iter()
                .any(|(label, _)| label.to_lowercase() == normalized)
    }

    /// 非空单元格拼接后是否含“total”
    fn is_total_row(row: &RawRow) -> bool {
        let joined = row
            .values()
            .filter(|c| !c.is_empty())
            .map(|c| c.as_text())
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        joined.contains(TOTAL_MARKER)
    }

    pub fn sanitize(&self, rows: Vec<RawRow>) -> SanitizedRows {
        let mut rows = rows;
        let mut outcome = SanitizedRows::default();

        if rows.first().map(Self::is_duplicated_header).unwrap_or(false) {
            rows.remove(0);
            outcome.dropped_header = true;
            debug!("移除重复表头行");
        }

        // 单行时不视为合计行
        if rows.len() > 1 && rows.last().map(Self::is_total_row).unwrap_or(false) {
            rows.pop();
            outcome.dropped_total = true;
            debug!("移除表尾合计行");
        }

        outcome.rows = rows;
        outcome
    }
}
