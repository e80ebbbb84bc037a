// ==========================================
// 履约有效率系统 - 有效率指标（派生，不落库）
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// EffectivenessRow - 单产品有效率
// ==========================================
// 序列化列名即导出 CSV 的表头
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessRow {
    #[serde(rename = "Product")]
    pub product: String,
    #[serde(rename = "Total Orders")]
    pub total_orders: u64,
    #[serde(rename = "Shipped")]
    pub shipped: u64,
    #[serde(rename = "Delivered")]
    pub delivered: u64,
    #[serde(rename = "Returned")]
    pub returned: u64,
    /// delivered / total × 100，保留 2 位小数
    #[serde(rename = "Effectiveness")]
    pub effectiveness: f64,
}

// ==========================================
// EffectivenessSummary - 批次范围汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessSummary {
    pub total_orders: u64,
    pub delivered: u64,
    pub returned: u64,
    pub overall_effectiveness: f64,
}

// ==========================================
// StatusLabels - 状态口径
// ==========================================
// order_status 精确匹配（区分大小写）
// 两类标签互斥（ConfigApi 写入时校验）；若仍重叠，妥投优先
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusLabels {
    pub delivered: String,
    pub returned: Vec<String>,
}

impl StatusLabels {
    pub fn is_delivered(&self, status: &str) -> bool {
        status == self.delivered
    }

    pub fn is_returned(&self, status: &str) -> bool {
        self.returned.iter().any(|label| label == status)
    }
}

impl Default for StatusLabels {
    fn default() -> Self {
        Self {
            delivered: "Delivered".to_string(),
            returned: vec!["Return".to_string(), "Returned".to_string()],
        }
    }
}
