// ==========================================
// 履约有效率系统 - API层错误类型
// ==========================================
// 职责: 将导入层/仓储层错误归类为面向操作员的错误，并附带处理建议
// 分类:
// - MalformedInput: 文件无法作为表格解析（未触库）
// - StructuralContent: 格式正确但无有效订单（未触库）
// - Persistence: 写入/查询失败（写入已整体回滚）
// ==========================================

use crate::i18n;
use crate::importer::error::ImportError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入错误
    // ==========================================
    #[error("文件无法解析: {0}")]
    MalformedInput(String),

    #[error("{message}")]
    StructuralContent {
        message: String,
        columns_found: Vec<String>,
        sample_rejected: Vec<String>,
    },

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    Persistence(String),

    // ==========================================
    // 导出错误
    // ==========================================
    #[error("报表导出失败: {0}")]
    Export(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ApiError {
    /// 面向操作员的处理建议（按当前语言）
    pub fn guidance(&self) -> String {
        let key = match self {
            ApiError::MalformedInput(_) => "guidance.malformed_input",
            ApiError::StructuralContent { .. } => "guidance.structural_content",
            ApiError::InvalidInput(_) => "guidance.invalid_input",
            ApiError::Persistence(_) => "guidance.persistence",
            ApiError::Export(_) => "guidance.export",
            ApiError::Internal(_) | ApiError::Other(_) => "guidance.internal",
        };
        i18n::t(key)
    }
}

// ==========================================
// 从 ImportError 转换
// ==========================================
impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        if err.is_malformed_input() {
            return ApiError::MalformedInput(err.to_string());
        }

        match err {
            ImportError::StructuralContent {
                columns_found,
                sample_rejected,
                total_rows,
            } => ApiError::StructuralContent {
                message: format!("未找到有效订单记录 (共 {} 行)", total_rows),
                columns_found,
                sample_rejected,
            },
            invalid @ ImportError::InvalidBatchName => ApiError::InvalidInput(invalid.to_string()),
            ImportError::ConfigError(msg) => ApiError::Internal(msg),
            ImportError::Repository(repo_err) => repo_err.into(),
            ImportError::Other(e) => ApiError::Other(e),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            corrupt @ RepositoryError::StoredValueCorrupt { .. } => {
                ApiError::Internal(corrupt.to_string())
            }
            RepositoryError::Other(e) => ApiError::Other(e),
            other => ApiError::Persistence(other.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::tests::LOCALE_TEST_LOCK;

    #[test]
    fn test_import_error_taxonomy() {
        let api_err: ApiError = ImportError::UnsupportedFormat("pdf".to_string()).into();
        assert!(matches!(api_err, ApiError::MalformedInput(_)));

        let api_err: ApiError = ImportError::StructuralContent {
            total_rows: 4,
            columns_found: vec!["Order #".to_string(), "Sku".to_string()],
            sample_rejected: vec!["12345".to_string()],
        }
        .into();
        match api_err {
            ApiError::StructuralContent {
                columns_found,
                sample_rejected,
                ..
            } => {
                assert_eq!(columns_found.len(), 2);
                assert_eq!(sample_rejected, vec!["12345"]);
            }
            other => panic!("Expected StructuralContent, got {:?}", other),
        }

        let api_err: ApiError = ImportError::InvalidBatchName.into();
        assert!(matches!(api_err, ApiError::InvalidInput(_)));

        let api_err: ApiError =
            ImportError::Repository(RepositoryError::CheckConstraintViolation("CHECK".into())).into();
        assert!(matches!(api_err, ApiError::Persistence(_)));
    }

    #[test]
    fn test_guidance_is_localized() {
        let _guard = LOCALE_TEST_LOCK.lock().unwrap();
        i18n::set_locale("en");
        let msg = ApiError::Persistence("x".to_string()).guidance();
        assert!(msg.contains("rolled back"));

        i18n::set_locale("zh-CN");
        let msg = ApiError::MalformedInput("x".to_string()).guidance();
        assert!(msg.contains(".xlsx"));
    }
}
