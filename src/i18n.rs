// ==========================================
// 履约有效率系统 - 国际化
// ==========================================
// 操作员提示语（错误处理建议、CLI 输出）
// 语言包: locales/{zh-CN,en,pt-BR}.yml，缺省回退 zh-CN
// i18n! 宏在 lib.rs 中展开
// ==========================================

/// 支持的语言
pub const SUPPORTED_LOCALES: &[&str] = &["zh-CN", "en", "pt-BR"];

/// 获取当前语言
pub fn current_locale() -> String {
    rust_i18n::locale().to_string()
}

/// 设置语言（不支持的语言代码忽略，保持当前语言）
///
/// # 参数
/// - locale: 语言代码（"zh-CN" / "en" / "pt-BR"）
pub fn set_locale(locale: &str) -> bool {
    if !SUPPORTED_LOCALES.contains(&locale) {
        tracing::warn!(locale = %locale, "不支持的语言代码");
        return false;
    }
    rust_i18n::set_locale(locale);
    true
}

/// 翻译消息（无参数）
pub fn t(key: &str) -> String {
    rust_i18n::t!(key).to_string()
}

/// 指定语言翻译（不改变全局语言）
pub fn t_in(locale: &str, key: &str) -> String {
    rust_i18n::t!(key, locale = locale).to_string()
}

/// 翻译并替换 `%{name}` 占位符
///
/// # 示例
/// ```no_run
/// use delivery_effectiveness::i18n::t_with_args;
/// let msg = t_with_args("batch.deleted", &[("batch_id", "0b7c…")]);
/// ```
pub fn t_with_args(key: &str, args: &[(&str, &str)]) -> String {
    args.iter()
        .fold(t(key), |msg, (name, value)| {
            msg.replace(&format!("%{{{}}}", name), value)
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    // rust-i18n 的 locale 为全局状态，且 Rust 测试默认并行执行；
    // 为避免测试互相干扰，这里对 i18n 相关测试串行化。
    pub(crate) static LOCALE_TEST_LOCK: Mutex<()> = Mutex::new(());

    #[test]
    fn test_set_locale() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        assert!(set_locale("pt-BR"));
        assert_eq!(current_locale(), "pt-BR");

        assert!(!set_locale("fr"));
        assert_eq!(current_locale(), "pt-BR");

        // 恢复默认语言
        set_locale("zh-CN");
    }

    #[test]
    fn test_translate_simple() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        assert_eq!(t("common.success"), "操作成功");
        assert_eq!(t_in("en", "common.success"), "Operation successful");
        assert_eq!(current_locale(), "zh-CN");
    }

    #[test]
    fn test_translate_with_args() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        set_locale("zh-CN");
        let msg = t_with_args("batch.not_found", &[("batch_id", "b-42")]);
        assert!(msg.contains("b-42"));
        assert!(msg.contains("批次不存在"));

        set_locale("pt-BR");
        let msg = t_with_args("batch.not_found", &[("batch_id", "b-42")]);
        assert!(msg.contains("Lote não encontrado"));

        set_locale("zh-CN");
    }
}
