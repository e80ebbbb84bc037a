// ==========================================
// 履约有效率系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: 文件格式错误 / 内容结构错误 / 持久化错误
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件格式错误（无法作为表格解析）=====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("文件无表头或无工作表: {0}")]
    EmptyWorkbook(String),

    // ===== 内容结构错误（格式正确但无有效记录）=====
    #[error(
        "未找到有效订单记录 (共 {total_rows} 行): 识别到的列 {columns_found:?}, 被拒绝的订单号样例 {sample_rejected:?}"
    )]
    StructuralContent {
        total_rows: usize,
        columns_found: Vec<String>,
        sample_rejected: Vec<String>,
    },

    // ===== 输入参数错误 =====
    #[error("批次名称不能为空")]
    InvalidBatchName,

    // ===== 配置错误 =====
    #[error("配置读取失败: {0}")]
    ConfigError(String),

    // ===== 持久化错误（事务已整体回滚）=====
    #[error("批次写入失败: {0}")]
    Repository(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为文件格式类错误（发生在任何数据库写入之前）
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            ImportError::FileNotFound(_)
                | ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::EmptyWorkbook(_)
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_input_classification() {
        assert!(ImportError::UnsupportedFormat("pdf".to_string()).is_malformed_input());
        assert!(ImportError::ExcelParseError("bad zip".to_string()).is_malformed_input());
        assert!(!ImportError::StructuralContent {
            total_rows: 3,
            columns_found: vec![],
            sample_rejected: vec![],
        }
        .is_malformed_input());
        assert!(!ImportError::InvalidBatchName.is_malformed_input());
    }

    #[test]
    fn test_structural_content_message_lists_diagnostics() {
        let err = ImportError::StructuralContent {
            total_rows: 2,
            columns_found: vec!["Order #".to_string()],
            sample_rejected: vec!["12345".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Order #"));
        assert!(msg.contains("12345"));
    }
}
