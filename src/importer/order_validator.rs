// ==========================================
// 履约有效率系统 - 订单号校验器
// ==========================================
// 职责: 判定原始订单号是否代表一条真实记录
// 规则顺序:
// 1. 缺失 / trim 后为空 / 长度 < 3 → 拒绝
// 2. 不含字母或不含数字 → 拒绝
// 3. 匹配已知国家前缀形态 → 接受
// 4. 仅由字母、数字、# - _ 组成且长度 ≥ 3 → 接受（新区域前缀的宽松兜底）
// ==========================================

use crate::domain::CellValue;
use once_cell::sync::Lazy;
use regex::Regex;

/// 最短有效订单号长度
pub const MIN_ORDER_NUMBER_LEN: usize = 3;

// 已知国家前缀形态
static KNOWN_SHAPES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"^#[A-Za-z]{2,3}[0-9]+$", // 符号前缀 + 2-3 字母 + 数字（#ITA123）
        r"^[A-Za-z]{2}[0-9]+$",    // 两字母前缀 + 数字（LL15278）
        r"^[0-9]+[A-Za-z]+$",      // 数字 + 字母
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

static PERMISSIVE_SHAPE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9#_-]{3,}$").ok());

/// 订单号是否有效
pub fn is_valid(token: &str) -> bool {
    let token = token.trim();
    if token.chars().count() < MIN_ORDER_NUMBER_LEN {
        return false;
    }

    let has_letter = token.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = token.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return false;
    }

    if KNOWN_SHAPES.iter().any(|re| re.is_match(token)) {
        return true;
    }

    PERMISSIVE_SHAPE
        .as_ref()
        .map(|re| re.is_match(token))
        .unwrap_or(false)
}

/// 单元格形式的订单号校验（缺失视为无效）
pub fn is_valid_cell(cell: Option<&CellValue>) -> bool {
    match cell {
        None => false,
        Some(value) => is_valid(&value.as_text()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundary_examples() {
        assert!(!is_valid("AB")); // 过短
        assert!(is_valid("LL15278"));
        assert!(!is_valid("12345")); // 无字母
        assert!(is_valid("#ITA123"));
    }

    #[test]
    fn test_reject_empty_and_whitespace() {
        assert!(!is_valid(""));
        assert!(!is_valid("   "));
        assert!(!is_valid(" A1 ")); // trim 后长度 2
    }

    #[test]
    fn test_reject_letters_only() {
        assert!(!is_valid("Order #"));
        assert!(!is_valid("Total"));
    }

    #[test]
    fn test_accept_known_shapes() {
        assert!(is_valid("#ES42"));
        assert!(is_valid("PL0001"));
        assert!(is_valid("123ABC"));
        assert!(is_valid("  #ROU77  "));
    }

    #[test]
    fn test_permissive_fallback() {
        // 未知前缀形态，但字符集合法
        assert!(is_valid("NEW-REG_2025"));
        assert!(is_valid("#PT-99"));
        // 含非法字符
        assert!(!is_valid("AB 123"));
        assert!(!is_valid("ORD/123"));
    }

    #[test]
    fn test_is_valid_cell() {
        assert!(!is_valid_cell(None));
        assert!(!is_valid_cell(Some(&CellValue::Empty)));
        assert!(!is_valid_cell(Some(&CellValue::Number(12345.0))));
        assert!(is_valid_cell(Some(&CellValue::Text("#ITA9".to_string()))));
    }
}
