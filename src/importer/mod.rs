// ==========================================
// 履约有效率系统 - 导入层
// ==========================================
// 职责: 订单表格导入，生成标准订单记录并按批次落库
// 支持: Excel (.xlsx/.xls/.ods), CSV
// ==========================================

// 模块声明
pub mod batch_writer;
pub mod column_normalizer;
pub mod country_classifier;
pub mod error;
pub mod file_parser;
pub mod order_importer;
pub mod order_importer_trait;
pub mod order_validator;
pub mod row_sanitizer;

// 重导出核心类型
pub use batch_writer::{compute_period, validate_batch_name, BatchWriter};
pub use column_normalizer::{ColumnNormalizer, NormalizedBatch, COLUMN_MAPPING};
pub use country_classifier::{classify, classify_with_rule, ClassificationRule, ClassifierInput};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use order_importer::{ImportOutcome, ImportPreview, OrderImporterImpl};
pub use row_sanitizer::{RowSanitizer, SanitizedRows};

// 重导出 Trait 接口
pub use order_importer_trait::{FileParser, OrderImporter};
