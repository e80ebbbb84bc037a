// ==========================================
// 履约有效率系统 - 订单导入 Trait
// ==========================================
// 职责: 定义订单导入接口（不包含实现）
// ==========================================

use crate::domain::{Country, RawTable};
use crate::importer::error::ImportResult;
use crate::importer::order_importer::{ImportOutcome, ImportPreview};
use async_trait::async_trait;
use std::path::Path;

// ==========================================
// OrderImporter Trait
// ==========================================
// 用途: 订单导入主接口
// 实现者: OrderImporterImpl
#[async_trait]
pub trait OrderImporter: Send + Sync {
    /// 解析并标准化文件，不写库
    ///
    /// # 参数
    /// - file_path: 表格文件路径（.xlsx/.xls/.ods/.csv）
    /// - country_override: 人工指定国家（覆盖自动识别）
    ///
    /// # 返回
    /// - Ok(ImportPreview): 记录数、识别国家、有效日期数等预览信息
    /// - Err: 文件格式错误 / 内容结构错误
    async fn preview_file(
        &self,
        file_path: &Path,
        country_override: Option<Country>,
    ) -> ImportResult<ImportPreview>;

    /// 导入文件为一个上传批次
    ///
    /// # 导入流程
    /// 1. 文件读取与解析
    /// 2. 行清理（重复表头 / 合计行）
    /// 3. 列标准化 + 订单号校验 + 国家识别
    /// 4. 事务化分块落库
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 批次 ID 与统计
    /// - Err: 任一阶段失败；落库失败时整个批次已回滚
    async fn import_file(
        &self,
        file_path: &Path,
        batch_name: &str,
        country_override: Option<Country>,
    ) -> ImportResult<ImportOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: ExcelParser, CsvParser, UniversalFileParser
pub trait FileParser: Send + Sync {
    /// 解析文件为原始表格（表头 + 行）
    ///
    /// # 返回
    /// - Ok(RawTable): 已跳过完全空白的行
    /// - Err: 文件读取错误、格式错误
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable>;
}
