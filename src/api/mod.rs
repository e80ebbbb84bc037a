// ==========================================
// 履约有效率系统 - API 层
// ==========================================
// 职责: 提供对外业务接口，供 CLI 调用
// ==========================================

pub mod config_api;
pub mod effectiveness_api;
pub mod error;
pub mod report_export;

// 重导出核心类型
pub use config_api::{ConfigApi, ConfigItem};
pub use effectiveness_api::{EffectivenessApi, EffectivenessReport};
pub use error::{ApiError, ApiResult};
pub use report_export::{export_report, render_report, report_file_name};
