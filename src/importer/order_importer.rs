// ==========================================
// 履约有效率系统 - 订单导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 解析 → 行清理 → 列标准化(校验 + 国家识别) → 分块事务落库
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::{BatchPeriod, CanonicalField, CanonicalRecord, Country};
use crate::importer::batch_writer::{compute_period, validate_batch_name, BatchWriter};
use crate::importer::column_normalizer::{ColumnNormalizer, NormalizedBatch};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::order_importer_trait::{FileParser, OrderImporter};
use crate::importer::row_sanitizer::RowSanitizer;
use crate::repository::UploadBatchRepository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, instrument};

/// 预览中展示的样例记录数
pub const PREVIEW_SAMPLE_SIZE: usize = 3;

// ==========================================
// ImportPreview - 导入预览（不写库）
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportPreview {
    pub record_count: usize,
    pub rejected_rows: usize,
    pub dropped_header: bool,
    pub dropped_total: bool,
    pub present_fields: Vec<CanonicalField>,
    pub country_override: Option<Country>,
    pub countries: BTreeMap<Country, usize>,
    pub valid_completed_dates: usize,
    pub period: Option<BatchPeriod>,
    /// 出现次数最多的订单状态（并列时取首次出现者）
    pub top_status: Option<(String, usize)>,
    pub unique_products: usize,
    pub sample_records: Vec<CanonicalRecord>,
}

// ==========================================
// ImportOutcome - 导入结果
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportOutcome {
    pub batch_id: String,
    pub batch_name: String,
    pub record_count: usize,
    pub rejected_rows: usize,
    pub dropped_header: bool,
    pub dropped_total: bool,
    pub countries: BTreeMap<Country, usize>,
    pub period: Option<BatchPeriod>,
    pub elapsed_ms: u64,
}

/// 解析 + 清理 + 标准化的中间结果
struct StagedImport {
    batch: NormalizedBatch,
    dropped_header: bool,
    dropped_total: bool,
}

fn count_countries(records: &[CanonicalRecord]) -> BTreeMap<Country, usize> {
    let mut counts = BTreeMap::new();
    for record in records {
        *counts.entry(record.pais).or_insert(0) += 1;
    }
    counts
}

fn top_status(records: &[CanonicalRecord]) -> Option<(String, usize)> {
    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for status in records.iter().map(|r| r.order_status.as_str()).filter(|s| !s.is_empty()) {
        let count = counts.entry(status).or_insert(0);
        if *count == 0 {
            order.push(status);
        }
        *count += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for status in order {
        let count = counts[status];
        if best.map(|(_, c)| count > c).unwrap_or(true) {
            best = Some((status, count));
        }
    }
    best.map(|(s, c)| (s.to_string(), c))
}

// ==========================================
// OrderImporterImpl - 订单导入器实现
// ==========================================
pub struct OrderImporterImpl<R, C>
where
    R: UploadBatchRepository,
    C: ImportConfigReader,
{
    // 数据访问层
    repo: Arc<R>,

    // 配置读取器
    config: Arc<C>,

    // 导入组件
    file_parser: Box<dyn FileParser>,
    sanitizer: RowSanitizer,
}

impl<R, C> OrderImporterImpl<R, C>
where
    R: UploadBatchRepository,
    C: ImportConfigReader,
{
    /// 创建新的 OrderImporter 实例（默认按扩展名选择解析器）
    pub fn new(repo: Arc<R>, config: Arc<C>) -> Self {
        Self::with_parser(repo, config, Box::new(UniversalFileParser))
    }

    pub fn with_parser(repo: Arc<R>, config: Arc<C>, file_parser: Box<dyn FileParser>) -> Self {
        Self {
            repo,
            config,
            file_parser,
            sanitizer: RowSanitizer,
        }
    }

    pub fn repo(&self) -> &R {
        self.repo.as_ref()
    }

    /// 解析 → 清理 → 标准化（不写库）
    fn stage(&self, file_path: &Path, country_override: Option<Country>) -> ImportResult<StagedImport> {
        // === 步骤 1: 解析文件 ===
        let table = self.file_parser.parse_to_raw_table(file_path).map_err(|e| {
            error!(error = %e, "文件解析失败");
            e
        })?;
        info!(
            total_rows = table.rows.len(),
            columns = table.headers.len(),
            "文件解析完成"
        );

        // === 步骤 2: 行清理 ===
        let sanitized = self.sanitizer.sanitize(table.rows);
        debug!(
            rows = sanitized.rows.len(),
            dropped_header = sanitized.dropped_header,
            dropped_total = sanitized.dropped_total,
            "行清理完成"
        );

        // === 步骤 3: 列标准化 + 校验 + 国家识别 ===
        let normalizer = ColumnNormalizer::for_headers(&table.headers);
        let batch = normalizer.normalize(&table.headers, &sanitized.rows, country_override)?;

        Ok(StagedImport {
            batch,
            dropped_header: sanitized.dropped_header,
            dropped_total: sanitized.dropped_total,
        })
    }
}

#[async_trait]
impl<R, C> OrderImporter for OrderImporterImpl<R, C>
where
    R: UploadBatchRepository + Send + Sync,
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, file_path), fields(file = %file_path.display()))]
    async fn preview_file(
        &self,
        file_path: &Path,
        country_override: Option<Country>,
    ) -> ImportResult<ImportPreview> {
        let staged = self.stage(file_path, country_override)?;
        let records = &staged.batch.records;

        let unique_products: HashSet<&str> = records
            .iter()
            .map(|r| r.product_name.as_str())
            .filter(|p| !p.is_empty())
            .collect();

        Ok(ImportPreview {
            record_count: records.len(),
            rejected_rows: staged.batch.rejected_rows,
            dropped_header: staged.dropped_header,
            dropped_total: staged.dropped_total,
            present_fields: staged.batch.present_fields.iter().copied().collect(),
            country_override,
            countries: count_countries(records),
            valid_completed_dates: records.iter().filter(|r| r.completed_date.is_some()).count(),
            period: compute_period(records),
            top_status: top_status(records),
            unique_products: unique_products.len(),
            sample_records: records.iter().take(PREVIEW_SAMPLE_SIZE).cloned().collect(),
        })
    }

    #[instrument(skip(self, file_path), fields(file = %file_path.display(), batch_id = tracing::field::Empty))]
    async fn import_file(
        &self,
        file_path: &Path,
        batch_name: &str,
        country_override: Option<Country>,
    ) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        info!(batch_name = %batch_name, ?country_override, "开始导入订单数据");

        // 名称非法时不做任何解析与写入
        let batch_name = validate_batch_name(batch_name)?;

        let staged = self.stage(file_path, country_override)?;
        let records = &staged.batch.records;

        // === 步骤 4: 分块事务落库 ===
        let policy = self
            .config
            .get_chunk_policy()
            .await
            .map_err(|e| ImportError::ConfigError(e.to_string()))?;
        let batch_id = BatchWriter::new(self.repo.as_ref(), policy)
            .write(&batch_name, records)
            .await?;
        tracing::Span::current().record("batch_id", batch_id.as_str());

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            records = records.len(),
            rejected = staged.batch.rejected_rows,
            elapsed_ms = elapsed_ms,
            "订单导入完成"
        );

        Ok(ImportOutcome {
            batch_id,
            batch_name,
            record_count: records.len(),
            rejected_rows: staged.batch.rejected_rows,
            dropped_header: staged.dropped_header,
            dropped_total: staged.dropped_total,
            countries: count_countries(records),
            period: compute_period(records),
            elapsed_ms,
        })
    }
}
