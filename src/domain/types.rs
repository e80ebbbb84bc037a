// ==========================================
// 履约有效率系统 - 领域类型定义
// ==========================================
// 职责: 国家代码 / 原始单元格值 / 标准字段名
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 国家 (Country)
// ==========================================
// 序列化格式与数据库 pais 列一致
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Country {
    Italia,
    Espanha,
    Polonia,
    Romania,
}

impl Country {
    /// 全部国家（用于 CLI 选项和过滤器）
    pub const ALL: [Country; 4] = [
        Country::Italia,
        Country::Espanha,
        Country::Polonia,
        Country::Romania,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Country::Italia => "Italia",
            Country::Espanha => "Espanha",
            Country::Polonia => "Polonia",
            Country::Romania => "Romania",
        }
    }
}

impl fmt::Display for Country {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Country {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "italia" => Ok(Country::Italia),
            "espanha" => Ok(Country::Espanha),
            "polonia" => Ok(Country::Polonia),
            "romania" => Ok(Country::Romania),
            other => Err(format!("未知国家: {}", other)),
        }
    }
}

// ==========================================
// 国家过滤器 (Country Filter)
// ==========================================
// All 对应“全部国家”，不附加 pais 条件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CountryFilter {
    All,
    Only(Country),
}

impl CountryFilter {
    pub fn country(&self) -> Option<Country> {
        match self {
            CountryFilter::All => None,
            CountryFilter::Only(c) => Some(*c),
        }
    }
}

impl From<Option<Country>> for CountryFilter {
    fn from(value: Option<Country>) -> Self {
        value.map(CountryFilter::Only).unwrap_or(CountryFilter::All)
    }
}

// ==========================================
// 原始单元格值 (Cell Value)
// ==========================================
// 表格读出的无类型标量，仅存在于导入过程中
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    #[default]
    Empty,
    Text(String),
    Number(f64),
    DateTime(NaiveDateTime),
}

impl CellValue {
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// 文本形式（整数值的浮点数去掉小数部分，空值为空串）
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Empty => String::new(),
            CellValue::Text(s) => s.trim().to_string(),
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    format!("{}", *n as i64)
                } else {
                    n.to_string()
                }
            }
            CellValue::DateTime(dt) => dt.format("%d/%m/%Y %H:%M").to_string(),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value.to_string())
        }
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

// ==========================================
// 标准字段 (Canonical Field)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CanonicalField {
    OrderNumber,
    ShippingNumber,
    CompletedDate,
    Customer,
    Payment,
    Sku,
    ProductName,
    TotalRevenues,
    Quantity,
    ProductCost,
    OrderStatus,
    LastTracking,
    LastTrackingDate,
    Platform,
    ZipCode,
    ProvinceCode,
}

impl CanonicalField {
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalField::OrderNumber => "order_number",
            CanonicalField::ShippingNumber => "shipping_number",
            CanonicalField::CompletedDate => "completed_date",
            CanonicalField::Customer => "customer",
            CanonicalField::Payment => "payment",
            CanonicalField::Sku => "sku",
            CanonicalField::ProductName => "product_name",
            CanonicalField::TotalRevenues => "total_revenues",
            CanonicalField::Quantity => "quantity",
            CanonicalField::ProductCost => "product_cost",
            CanonicalField::OrderStatus => "order_status",
            CanonicalField::LastTracking => "last_tracking",
            CanonicalField::LastTrackingDate => "last_tracking_date",
            CanonicalField::Platform => "platform",
            CanonicalField::ZipCode => "zip_code",
            CanonicalField::ProvinceCode => "province_code",
        }
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
