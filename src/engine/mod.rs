// ==========================================
// 履约有效率系统 - 引擎层
// ==========================================
// 职责: 实现指标计算规则,不拼 SQL
// 红线: Engine 不拼 SQL, 不访问数据库
// ==========================================

pub mod effectiveness;

// 重导出核心引擎
pub use effectiveness::{percentage, EffectivenessEngine};
