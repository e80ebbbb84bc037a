// ==========================================
// 履约有效率系统 - 有效率 API
// ==========================================
// 职责: 对外查询接口
// - 上传预览 / 导入
// - 批次列表 / 按国家加载记录 / 删除批次
// - 有效率计算 / 汇总 / 报表导出
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::api::report_export;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::{
    BatchSummary, CanonicalRecord, Country, CountryFilter, EffectivenessRow,
    EffectivenessSummary, UploadBatch,
};
use crate::engine::EffectivenessEngine;
use crate::importer::{ImportOutcome, ImportPreview, OrderImporter, OrderImporterImpl};
use crate::repository::{UploadBatchRepository, UploadBatchRepositoryImpl};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};

/// 有效率报表（批次 + 国家范围）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EffectivenessReport {
    pub batch_id: String,
    pub country: Option<Country>,
    pub rows: Vec<EffectivenessRow>,
    pub summary: EffectivenessSummary,
}

// ==========================================
// EffectivenessApi
// ==========================================
pub struct EffectivenessApi {
    repo: Arc<UploadBatchRepositoryImpl>,
    config_manager: Arc<ConfigManager>,
    importer: OrderImporterImpl<UploadBatchRepositoryImpl, ConfigManager>,
}

impl EffectivenessApi {
    /// 创建新的 EffectivenessApi 实例
    pub fn new(repo: Arc<UploadBatchRepositoryImpl>, config_manager: Arc<ConfigManager>) -> Self {
        let importer = OrderImporterImpl::new(repo.clone(), config_manager.clone());
        Self {
            repo,
            config_manager,
            importer,
        }
    }

    // ==========================================
    // 上传
    // ==========================================

    /// 预览上传文件（不写库）
    pub async fn preview_upload(
        &self,
        file_path: &Path,
        country_override: Option<Country>,
    ) -> ApiResult<ImportPreview> {
        Ok(self.importer.preview_file(file_path, country_override).await?)
    }

    /// 导入上传文件为新批次
    ///
    /// # 返回
    /// - Err(MalformedInput / StructuralContent): 未触库
    /// - Err(Persistence): 已整体回滚
    pub async fn import_upload(
        &self,
        file_path: &Path,
        batch_name: &str,
        country_override: Option<Country>,
    ) -> ApiResult<ImportOutcome> {
        self.importer
            .import_file(file_path, batch_name, country_override)
            .await
            .map_err(|e| {
                warn!(error = %e, "上传导入失败");
                ApiError::from(e)
            })
    }

    // ==========================================
    // 批次查询
    // ==========================================

    /// 全部批次（创建时间倒序）
    pub async fn list_batches(&self) -> ApiResult<Vec<UploadBatch>> {
        Ok(self.repo.list_batches().await?)
    }

    /// 批次列表（按国家过滤，附记录数与展示标签）
    pub async fn list_batch_summaries(&self, filter: CountryFilter) -> ApiResult<Vec<BatchSummary>> {
        Ok(self.repo.list_batch_summaries(filter).await?)
    }

    /// 加载批次记录（未知批次返回空列表）
    pub async fn load_records(
        &self,
        batch_id: &str,
        filter: CountryFilter,
    ) -> ApiResult<Vec<CanonicalRecord>> {
        Ok(self.repo.load_records(batch_id, filter).await?)
    }

    /// 删除批次（不存在返回 false）
    pub async fn delete_batch(&self, batch_id: &str) -> ApiResult<bool> {
        let deleted = self.repo.delete_batch(batch_id).await?;
        info!(batch_id = %batch_id, deleted = deleted, "删除批次");
        Ok(deleted)
    }

    // ==========================================
    // 指标
    // ==========================================

    async fn engine(&self) -> ApiResult<EffectivenessEngine> {
        let labels = self
            .config_manager
            .get_status_labels()
            .await
            .map_err(|e| ApiError::Internal(format!("读取状态口径失败: {}", e)))?;
        Ok(EffectivenessEngine::new(labels))
    }

    /// 对已加载的记录计算有效率
    pub async fn compute_metrics(&self, records: &[CanonicalRecord]) -> ApiResult<Vec<EffectivenessRow>> {
        Ok(self.engine().await?.compute(records))
    }

    /// 批次（可按国家过滤）有效率报表
    pub async fn batch_report(&self, batch_id: &str, filter: CountryFilter) -> ApiResult<EffectivenessReport> {
        let records = self.repo.load_records(batch_id, filter).await?;
        let engine = self.engine().await?;
        let rows = engine.compute(&records);
        let summary = engine.summarize(&rows);

        Ok(EffectivenessReport {
            batch_id: batch_id.to_string(),
            country: filter.country(),
            rows,
            summary,
        })
    }

    /// 导出批次有效率报表为 CSV
    ///
    /// # 参数
    /// - target: 目录（自动命名）或完整文件路径
    pub async fn export_report(
        &self,
        batch_id: &str,
        filter: CountryFilter,
        target: &Path,
    ) -> ApiResult<PathBuf> {
        let report = self.batch_report(batch_id, filter).await?;
        report_export::export_report(target, &report.rows)
    }
}
