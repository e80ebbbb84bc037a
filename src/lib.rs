// ==========================================
// 履约有效率系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 订单表格导入 + 按产品履约有效率统计
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 指标计算
pub mod engine;

// 导入层 - 表格导入
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    BatchSummary, CanonicalRecord, Country, CountryFilter, EffectivenessRow,
    EffectivenessSummary, UploadBatch,
};

// 引擎
pub use engine::EffectivenessEngine;

// API
pub use api::{ApiError, ApiResult, ConfigApi, EffectivenessApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "履约有效率系统";
