// ==========================================
// 履约有效率系统 - 日志
// ==========================================
// tracing-subscriber 初始化；RUST_LOG 覆盖默认级别
// 所有输出走 stderr，stdout 保留给 CLI 结果
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

/// 未设置 RUST_LOG 时的默认过滤器
pub const DEFAULT_FILTER: &str = "info";

/// 日志输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// 人类可读（终端）
    #[default]
    Pretty,
    /// 每行一个 JSON 对象（含当前 span 字段，如 batch_id）
    Json,
}

fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// 按格式初始化全局 subscriber
///
/// 重复调用时保持首次配置（try_init）
pub fn init_with(format: LogFormat) {
    let filter = env_filter(DEFAULT_FILTER);
    let builder = fmt().with_env_filter(filter).with_writer(std::io::stderr);

    let result = match format {
        LogFormat::Pretty => builder
            .with_target(true)
            .with_line_number(true)
            .try_init(),
        LogFormat::Json => builder.json().with_current_span(true).try_init(),
    };

    if result.is_err() {
        tracing::debug!("日志系统已初始化，忽略重复初始化");
    }
}

/// 终端日志
///
/// # 示例
/// ```no_run
/// delivery_effectiveness::logging::init();
/// ```
pub fn init() {
    init_with(LogFormat::Pretty);
}

/// JSON 行日志
pub fn init_json() {
    init_with(LogFormat::Json);
}

/// 测试日志（debug 级别，输出被测试框架捕获）
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repeated_init_is_harmless() {
        init_test();
        init_test();
        init();
        tracing::info!(records = 3, "日志初始化后可正常输出");
    }

    #[test]
    fn test_default_format_is_pretty() {
        assert_eq!(LogFormat::default(), LogFormat::Pretty);
    }
}
