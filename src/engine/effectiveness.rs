// ==========================================
// 履约有效率系统 - 有效率聚合引擎
// ==========================================
// 职责: 按产品分组统计 总单数 / 已发货 / 妥投 / 退货 / 有效率
// 输入: 某批次（可按国家过滤）加载出的标准记录
// 输出: EffectivenessRow 序列（按产品名排序）
// 红线: 无状态引擎，不访问数据库
// ==========================================

use crate::domain::{CanonicalRecord, EffectivenessRow, EffectivenessSummary, StatusLabels};
use std::collections::BTreeMap;
use tracing::debug;

/// 百分比，保留 2 位小数；分母为 0 时返回 0
pub fn percentage(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    let pct = numerator as f64 / denominator as f64 * 100.0;
    (pct * 100.0).round() / 100.0
}

#[derive(Debug, Default)]
struct ProductTally {
    total: u64,
    shipped: u64,
    delivered: u64,
    returned: u64,
}

// ==========================================
// EffectivenessEngine - 有效率聚合引擎
// ==========================================
pub struct EffectivenessEngine {
    labels: StatusLabels,
}

impl Default for EffectivenessEngine {
    fn default() -> Self {
        Self::new(StatusLabels::default())
    }
}

impl EffectivenessEngine {
    pub fn new(labels: StatusLabels) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &StatusLabels {
        &self.labels
    }

    /// 按产品聚合
    ///
    /// 空产品名与总数为 0 的分组不输出
    pub fn compute(&self, records: &[CanonicalRecord]) -> Vec<EffectivenessRow> {
        let mut groups: BTreeMap<&str, ProductTally> = BTreeMap::new();

        for record in records {
            let product = record.product_name.as_str();
            if product.is_empty() {
                continue;
            }

            let tally = groups.entry(product).or_default();
            tally.total += 1;
            if !record.shipping_number.is_empty() {
                tally.shipped += 1;
            }
            if self.labels.is_delivered(&record.order_status) {
                tally.delivered += 1;
            } else if self.labels.is_returned(&record.order_status) {
                tally.returned += 1;
            }
        }

        let rows: Vec<EffectivenessRow> = groups
            .into_iter()
            .filter(|(_, t)| t.total > 0)
            .map(|(product, t)| EffectivenessRow {
                product: product.to_string(),
                total_orders: t.total,
                shipped: t.shipped,
                delivered: t.delivered,
                returned: t.returned,
                effectiveness: percentage(t.delivered, t.total),
            })
            .collect();

        debug!(records = records.len(), products = rows.len(), "有效率聚合完成");
        rows
    }

    /// 汇总（基于聚合输出，已排除空产品名）
    pub fn summarize(&self, rows: &[EffectivenessRow]) -> EffectivenessSummary {
        let total_orders: u64 = rows.iter().map(|r| r.total_orders).sum();
        let delivered: u64 = rows.iter().map(|r| r.delivered).sum();
        let returned: u64 = rows.iter().map(|r| r.returned).sum();

        EffectivenessSummary {
            total_orders,
            delivered,
            returned,
            overall_effectiveness: percentage(delivered, total_orders),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(product: &str, status: &str, shipping: &str) -> CanonicalRecord {
        let mut r = CanonicalRecord::with_order_number("#ITA1");
        r.product_name = product.to_string();
        r.order_status = status.to_string();
        r.shipping_number = shipping.to_string();
        r
    }

    #[test]
    fn test_widget_effectiveness() {
        let mut records = Vec::new();
        records.extend((0..6).map(|_| order("Widget", "Delivered", "TRK1")));
        records.extend((0..2).map(|_| order("Widget", "Returned", "TRK2")));
        records.extend((0..2).map(|_| order("Widget", "Shipped", "")));

        let rows = EffectivenessEngine::default().compute(&records);
        assert_eq!(rows.len(), 1);
        let w = &rows[0];
        assert_eq!(w.product, "Widget");
        assert_eq!(w.total_orders, 10);
        assert_eq!(w.shipped, 8);
        assert_eq!(w.delivered, 6);
        assert_eq!(w.returned, 2);
        assert_eq!(w.effectiveness, 60.00);
    }

    #[test]
    fn test_both_return_labels_are_summed() {
        let records = vec![
            order("Gadget", "Return", ""),
            order("Gadget", "Returned", ""),
            order("Gadget", "returned", ""), // 区分大小写，不计入
        ];
        let rows = EffectivenessEngine::default().compute(&records);
        assert_eq!(rows[0].returned, 2);
        assert_eq!(rows[0].delivered, 0);
        assert_eq!(rows[0].effectiveness, 0.0);
    }

    #[test]
    fn test_empty_product_excluded_and_sorted_output() {
        let records = vec![
            order("Zeta", "Delivered", ""),
            order("", "Delivered", ""),
            order("Alpha", "Shipped", ""),
        ];
        let rows = EffectivenessEngine::default().compute(&records);
        let names: Vec<&str> = rows.iter().map(|r| r.product.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "Zeta"]);
    }

    #[test]
    fn test_no_records_yields_no_rows() {
        let engine = EffectivenessEngine::default();
        assert!(engine.compute(&[]).is_empty());
        let summary = engine.summarize(&[]);
        assert_eq!(summary.total_orders, 0);
        assert_eq!(summary.overall_effectiveness, 0.0);
    }

    #[test]
    fn test_rounding_and_summary() {
        let records = vec![
            order("A", "Delivered", ""),
            order("A", "Shipped", ""),
            order("A", "Shipped", ""),
            order("B", "Delivered", ""),
        ];
        let engine = EffectivenessEngine::default();
        let rows = engine.compute(&records);
        assert_eq!(rows[0].effectiveness, 33.33);
        assert_eq!(rows[1].effectiveness, 100.0);

        let summary = engine.summarize(&rows);
        assert_eq!(summary.total_orders, 4);
        assert_eq!(summary.delivered, 2);
        assert_eq!(summary.overall_effectiveness, 50.0);
    }

    #[test]
    fn test_custom_labels() {
        let engine = EffectivenessEngine::new(StatusLabels {
            delivered: "Entregue".to_string(),
            returned: vec!["Devolvido".to_string()],
        });
        let records = vec![order("A", "Entregue", ""), order("A", "Devolvido", "")];
        let rows = engine.compute(&records);
        assert_eq!(rows[0].delivered, 1);
        assert_eq!(rows[0].returned, 1);
        assert_eq!(rows[0].effectiveness, 50.0);
    }

    #[test]
    fn test_overlapping_label_counts_as_delivered() {
        let engine = EffectivenessEngine::new(StatusLabels {
            delivered: "Done".to_string(),
            returned: vec!["Done".to_string()],
        });
        let rows = engine.compute(&[order("A", "Done", "")]);
        assert_eq!(rows[0].delivered, 1);
        assert_eq!(rows[0].returned, 0);
    }

    #[test]
    fn test_percentage_guard() {
        assert_eq!(percentage(5, 0), 0.0);
        assert_eq!(percentage(2, 3), 66.67);
    }
}
