// ==========================================
// 履约有效率系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体与类型
// 红线: 不含数据访问逻辑,不含导入逻辑
// ==========================================

pub mod effectiveness;
pub mod order;
pub mod types;

// 重导出核心类型
pub use effectiveness::{EffectivenessRow, EffectivenessSummary, StatusLabels};
pub use order::{
    BatchPeriod, BatchSummary, CanonicalRecord, ChunkPolicy, NewUploadBatch, RawRow, RawTable,
    UploadBatch, MAX_CHUNK_SIZE,
};
pub use types::{CanonicalField, CellValue, Country, CountryFilter};
