// ==========================================
// 履约有效率系统 - 上传批次 Repository Trait
// ==========================================
// 职责: 定义批次与订单记录的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::{BatchSummary, CanonicalRecord, CountryFilter, NewUploadBatch, UploadBatch};
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;

// ==========================================
// UploadBatchRepository Trait
// ==========================================
// 实现者: UploadBatchRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait UploadBatchRepository: Send + Sync {
    // ===== 写入（事务化）=====

    /// 写入批次元数据及其全部记录
    ///
    /// # 参数
    /// - batch: 批次元数据
    /// - records: 已校验的标准记录
    /// - chunk_size: 每次多行 INSERT 的记录数
    ///
    /// # 返回
    /// - Ok(String): 新批次 ID
    /// - Err: 任一分块失败，整个事务回滚（批次行与已写分块均不保留）
    async fn insert_batch_with_records(
        &self,
        batch: NewUploadBatch,
        records: &[CanonicalRecord],
        chunk_size: usize,
    ) -> RepositoryResult<String>;

    // ===== 查询 =====

    /// 全部批次（创建时间倒序）
    async fn list_batches(&self) -> RepositoryResult<Vec<UploadBatch>>;

    /// 批次列表（可按国家过滤，附带国家范围内记录数）
    ///
    /// 指定国家时仅返回含该国家记录的批次
    async fn list_batch_summaries(
        &self,
        filter: CountryFilter,
    ) -> RepositoryResult<Vec<BatchSummary>>;

    /// 按 ID 查询批次
    async fn find_batch(&self, batch_id: &str) -> RepositoryResult<Option<UploadBatch>>;

    /// 加载批次记录（按写入顺序）
    ///
    /// 未知 batch_id 返回空列表
    async fn load_records(
        &self,
        batch_id: &str,
        filter: CountryFilter,
    ) -> RepositoryResult<Vec<CanonicalRecord>>;

    /// 批次记录数（可按国家过滤）
    async fn count_records(&self, batch_id: &str, filter: CountryFilter) -> RepositoryResult<i64>;

    // ===== 删除 =====

    /// 删除批次（记录级联删除）
    ///
    /// # 返回
    /// - Ok(true): 已删除
    /// - Ok(false): 批次不存在
    async fn delete_batch(&self, batch_id: &str) -> RepositoryResult<bool>;
}
