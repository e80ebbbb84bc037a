// ==========================================
// 履约有效率系统 - 国家识别器
// ==========================================
// 职责: 为每条记录解析唯一国家，永不为空
// 优先级（先命中者胜）:
// 1. 人工指定国家（整批覆盖）
// 2. 订单号前缀表
// 3. 西班牙省份缩写集合
// 4. 两字母省份代码 → 意大利
// 5. 纯数字邮编: 5 位 → 意大利, 6 位 → 罗马尼亚
// 6. 全局兜底 → 意大利
// 约束: 纯函数，无隐藏状态
// ==========================================

use crate::domain::{CanonicalRecord, Country};
use serde::{Deserialize, Serialize};

// ==========================================
// 静态规则表
// ==========================================

/// 订单号前缀 → 国家（按完整前缀精确匹配）
pub const ORDER_PREFIXES: &[(&str, Country)] = &[
    ("#ITA", Country::Italia),
    ("#ESP", Country::Espanha),
    ("#POL", Country::Polonia),
    ("#ROU", Country::Romania),
    ("#ROM", Country::Romania),
    ("LL", Country::Espanha), // 承运商前缀，历史上仅用于西班牙
];

/// 西班牙省份缩写
// 与意大利省份缩写重叠的代码不在此列（如 TO、BA、CA）
pub const SPANISH_PROVINCE_CODES: &[&str] = &[
    "A", "B", "C", "H", "J", "L", "M", "O", "P", "S", "T", "V", "Z", "AB", "BU", "CC", "CU",
    "GC", "GI", "GU", "HU", "MA", "ML", "MU", "PM", "SE", "SG", "TF", "ZA",
];

/// 两字母省份代码的默认国家
pub const TWO_LETTER_PROVINCE_COUNTRY: Country = Country::Italia;

/// 5 位 / 6 位纯数字邮编对应国家
pub const FIVE_DIGIT_POSTAL_COUNTRY: Country = Country::Italia;
pub const SIX_DIGIT_POSTAL_COUNTRY: Country = Country::Romania;

/// 全局兜底国家
pub const FALLBACK_COUNTRY: Country = Country::Italia;

// ==========================================
// 命中规则（用于审计与诊断）
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClassificationRule {
    Override,
    OrderPrefix,
    ProvinceSet,
    TwoLetterProvince,
    PostalCode,
    GlobalFallback,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub country: Country,
    pub rule: ClassificationRule,
}

// ==========================================
// 识别输入
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct ClassifierInput<'a> {
    pub order_number: &'a str,
    pub province_code: &'a str,
    pub zip_code: &'a str,
}

impl<'a> From<&'a CanonicalRecord> for ClassifierInput<'a> {
    fn from(record: &'a CanonicalRecord) -> Self {
        Self {
            order_number: &record.order_number,
            province_code: &record.province_code,
            zip_code: &record.zip_code,
        }
    }
}

/// 提取订单号前缀: '#' + 紧随字母，或开头连续字母（大写）
fn order_prefix(order_number: &str) -> String {
    let upper = order_number.trim().to_uppercase();
    let (marker, rest) = match upper.strip_prefix('#') {
        Some(rest) => ("#", rest),
        None => ("", upper.as_str()),
    };
    let letters: String = rest.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
    format!("{}{}", marker, letters)
}

/// 订单号前缀匹配
pub fn country_for_order_prefix(order_number: &str) -> Option<Country> {
    let prefix = order_prefix(order_number);
    if prefix.is_empty() || prefix == "#" {
        return None;
    }
    ORDER_PREFIXES
        .iter()
        .find(|(marker, _)| *marker == prefix)
        .map(|(_, country)| *country)
}

/// 是否以已知订单号标记开头（'#' 或前缀表中的前缀）
pub fn starts_with_order_marker(token: &str) -> bool {
    let token = token.trim();
    token.starts_with('#') || country_for_order_prefix(token).is_some()
}

/// 识别国家并返回命中规则
pub fn classify_with_rule(
    input: ClassifierInput<'_>,
    country_override: Option<Country>,
) -> Classification {
    let hit = |country, rule| Classification { country, rule };

    if let Some(country) = country_override {
        return hit(country, ClassificationRule::Override);
    }

    if let Some(country) = country_for_order_prefix(input.order_number) {
        return hit(country, ClassificationRule::OrderPrefix);
    }

    let province = input.province_code.trim().to_uppercase();
    if SPANISH_PROVINCE_CODES.contains(&province.as_str()) {
        return hit(Country::Espanha, ClassificationRule::ProvinceSet);
    }

    if province.len() == 2 && province.chars().all(|c| c.is_ascii_alphabetic()) {
        return hit(TWO_LETTER_PROVINCE_COUNTRY, ClassificationRule::TwoLetterProvince);
    }

    let zip = input.zip_code.trim();
    if !zip.is_empty() && zip.chars().all(|c| c.is_ascii_digit()) {
        match zip.len() {
            5 => return hit(FIVE_DIGIT_POSTAL_COUNTRY, ClassificationRule::PostalCode),
            6 => return hit(SIX_DIGIT_POSTAL_COUNTRY, ClassificationRule::PostalCode),
            _ => {}
        }
    }

    hit(FALLBACK_COUNTRY, ClassificationRule::GlobalFallback)
}

/// 识别国家
pub fn classify(input: ClassifierInput<'_>, country_override: Option<Country>) -> Country {
    classify_with_rule(input, country_override).country
}
