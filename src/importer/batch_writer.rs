// ==========================================
// 履约有效率系统 - 批次写入器
// ==========================================
// 职责: 批次名称校验 / 周期计算 / 分块事务落库
// 红线: 全部成功或全部回滚，不存在半个批次
// ==========================================

use crate::domain::{BatchPeriod, CanonicalRecord, ChunkPolicy, NewUploadBatch};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::UploadBatchRepository;
use tracing::{error, info};

/// 校验并规整批次名称（trim 后非空）
pub fn validate_batch_name(name: &str) -> ImportResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ImportError::InvalidBatchName);
    }
    Ok(name.to_string())
}

/// 批次周期: 有效 completed_date 的最小/最大日期
///
/// 所有记录均无完成时间时返回 None
pub fn compute_period(records: &[CanonicalRecord]) -> Option<BatchPeriod> {
    let mut dates = records
        .iter()
        .filter_map(|r| r.completed_date)
        .map(|dt| dt.date());

    let first = dates.next()?;
    let (start, end) = dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d)));
    Some(BatchPeriod { start, end })
}

pub struct BatchWriter<'a, R: ?Sized> {
    repo: &'a R,
    policy: ChunkPolicy,
}

impl<'a, R> BatchWriter<'a, R>
where
    R: UploadBatchRepository + ?Sized,
{
    pub fn new(repo: &'a R, policy: ChunkPolicy) -> Self {
        Self { repo, policy }
    }

    /// 写入一个完整批次
    ///
    /// # 返回
    /// - Ok(String): 新批次 ID
    /// - Err(InvalidBatchName): 名称为空（未触库）
    /// - Err(Repository): 任一分块失败（已整体回滚）
    pub async fn write(&self, name: &str, records: &[CanonicalRecord]) -> ImportResult<String> {
        let name = validate_batch_name(name)?;
        let period = compute_period(records);
        let chunk_size = self.policy.chunk_size_for(records.len());

        info!(
            batch_name = %name,
            records = records.len(),
            chunk_size = chunk_size,
            chunks = records.len().div_ceil(chunk_size),
            "开始写入批次"
        );

        let batch = NewUploadBatch {
            name,
            period,
            record_count: records.len(),
        };

        let batch_id = self
            .repo
            .insert_batch_with_records(batch, records, chunk_size)
            .await
            .map_err(|e| {
                error!(error = %e, "批次写入失败，事务已回滚");
                ImportError::from(e)
            })?;

        Ok(batch_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record_on(day: Option<u32>) -> CanonicalRecord {
        let mut r = CanonicalRecord::with_order_number("#ITA1");
        r.completed_date = day.and_then(|d| {
            NaiveDate::from_ymd_opt(2025, 4, d).and_then(|date| date.and_hms_opt(10, 0, 0))
        });
        r
    }

    #[test]
    fn test_validate_batch_name() {
        assert_eq!(validate_batch_name("  Abril ").unwrap(), "Abril");
        assert!(matches!(
            validate_batch_name("   "),
            Err(ImportError::InvalidBatchName)
        ));
    }

    #[test]
    fn test_compute_period_ignores_missing_dates() {
        let records = vec![record_on(Some(12)), record_on(None), record_on(Some(3)), record_on(Some(28))];
        let period = compute_period(&records).unwrap();
        assert_eq!(period.start, NaiveDate::from_ymd_opt(2025, 4, 3).unwrap());
        assert_eq!(period.end, NaiveDate::from_ymd_opt(2025, 4, 28).unwrap());
    }

    #[test]
    fn test_compute_period_none_when_no_dates() {
        assert!(compute_period(&[record_on(None)]).is_none());
        assert!(compute_period(&[]).is_none());
    }
}
