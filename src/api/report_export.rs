// ==========================================
// 履约有效率系统 - 有效率报表导出
// ==========================================
// 职责: EffectivenessRow 序列化为 CSV（每个产品一行）
// 说明: 纯序列化，不含计算逻辑
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::EffectivenessRow;
use chrono::{DateTime, Local};
use csv::Writer;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// 报表列名（与 EffectivenessRow 的序列化列名一致）
pub const REPORT_HEADERS: [&str; 6] = [
    "Product",
    "Total Orders",
    "Shipped",
    "Delivered",
    "Returned",
    "Effectiveness",
];

/// 报表文件名: effectiveness_report_<YYYYmmdd_HHMMSS>.csv
pub fn report_file_name(now: DateTime<Local>) -> String {
    format!("effectiveness_report_{}.csv", now.format("%Y%m%d_%H%M%S"))
}

/// 写入任意 Writer
///
/// 无数据行时仍写出表头，保证文件布局稳定
pub fn write_report<W: Write>(writer: W, rows: &[EffectivenessRow]) -> ApiResult<()> {
    let mut wtr = Writer::from_writer(writer);
    if rows.is_empty() {
        wtr.write_record(REPORT_HEADERS)
            .map_err(|e| ApiError::Export(e.to_string()))?;
    }
    for row in rows {
        wtr.serialize(row)
            .map_err(|e| ApiError::Export(e.to_string()))?;
    }
    wtr.flush().map_err(|e| ApiError::Export(e.to_string()))?;
    Ok(())
}

/// 渲染为 CSV 字符串
pub fn render_report(rows: &[EffectivenessRow]) -> ApiResult<String> {
    let mut buf = Vec::new();
    write_report(&mut buf, rows)?;
    String::from_utf8(buf).map_err(|e| ApiError::Export(e.to_string()))
}

/// 导出到文件
///
/// # 参数
/// - target: 目录（按时间戳生成文件名）或完整文件路径
///
/// # 返回
/// - Ok(PathBuf): 实际写入的文件路径
pub fn export_report(target: &Path, rows: &[EffectivenessRow]) -> ApiResult<PathBuf> {
    let path = if target.is_dir() {
        target.join(report_file_name(Local::now()))
    } else {
        target.to_path_buf()
    };

    let file = File::create(&path)
        .map_err(|e| ApiError::Export(format!("{}: {}", path.display(), e)))?;
    write_report(file, rows)?;

    info!(path = %path.display(), rows = rows.len(), "有效率报表已导出");
    Ok(path)
}
