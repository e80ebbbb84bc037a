// ==========================================
// 履约有效率系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入与指标计算所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::domain::{ChunkPolicy, StatusLabels};
use async_trait::async_trait;
use std::error::Error;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    // ===== 写入配置 =====

    /// 获取分块写入策略
    ///
    /// # 默认值
    /// - chunk_size = 500
    /// - large_chunk_size = 100（记录数 > large_batch_threshold 时）
    /// - large_batch_threshold = 500
    async fn get_chunk_policy(&self) -> Result<ChunkPolicy, Box<dyn Error + Send + Sync>>;

    // ===== 指标口径 =====

    /// 获取妥投/退货状态标签
    ///
    /// # 默认值
    /// - delivered = "Delivered"
    /// - returned = ["Return", "Returned"]
    async fn get_status_labels(&self) -> Result<StatusLabels, Box<dyn Error + Send + Sync>>;
}
