// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库、AppState 组装、订单 CSV 夹具生成
// ==========================================

#![allow(dead_code)]

use delivery_effectiveness::app::AppState;
use delivery_effectiveness::logging;
use std::error::Error;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// 订单表格表头（与上传文件一致）
pub const ORDER_HEADERS: [&str; 16] = [
    "Order #",
    "Shipping #",
    "Completed date",
    "Customer",
    "Payment",
    "Sku",
    "Product name",
    "Total revenues",
    "Quantity",
    "Product cost",
    "Order status",
    "Last tracking",
    "Last tracking date",
    "Platform",
    "Zip",
    "Province code",
];

/// 一行订单夹具
#[derive(Debug, Clone, Default)]
pub struct OrderRow {
    pub order: String,
    pub shipping: String,
    pub completed: String,
    pub product: String,
    pub status: String,
    pub zip: String,
    pub province: String,
}

impl OrderRow {
    pub fn new(order: &str, product: &str, status: &str) -> Self {
        Self {
            order: order.to_string(),
            product: product.to_string(),
            status: status.to_string(),
            ..Default::default()
        }
    }

    pub fn shipped(mut self, shipping: &str) -> Self {
        self.shipping = shipping.to_string();
        self
    }

    pub fn completed(mut self, completed: &str) -> Self {
        self.completed = completed.to_string();
        self
    }

    pub fn located(mut self, zip: &str, province: &str) -> Self {
        self.zip = zip.to_string();
        self.province = province.to_string();
        self
    }

    fn cells(&self) -> Vec<String> {
        vec![
            self.order.clone(),
            self.shipping.clone(),
            self.completed.clone(),
            "Cliente".to_string(),
            "COD".to_string(),
            "SKU-1".to_string(),
            self.product.clone(),
            "49.90".to_string(),
            "1".to_string(),
            "12.50".to_string(),
            self.status.clone(),
            String::new(),
            String::new(),
            "Shopify".to_string(),
            self.zip.clone(),
            self.province.clone(),
        ]
    }
}

/// 创建临时目录 + 初始化好的 AppState
///
/// # 返回
/// - TempDir: 临时目录（需要保持存活）
/// - AppState: 绑定到目录内数据库的应用状态
pub fn create_test_state() -> Result<(TempDir, AppState), Box<dyn Error>> {
    logging::init_test();
    let dir = tempfile::tempdir()?;
    let db_path = dir.path().join("test.db").to_string_lossy().to_string();
    let state = AppState::new(db_path)?;
    Ok((dir, state))
}

/// 写出订单 CSV 夹具
///
/// # 参数
/// - extra_rows: 追加在订单行之后的原样行（例如合计行）
/// - leading_header: 是否在数据首行重复一次表头
pub fn write_orders_csv(
    dir: &Path,
    file_name: &str,
    rows: &[OrderRow],
    leading_header: bool,
    extra_rows: &[Vec<String>],
) -> Result<PathBuf, Box<dyn Error>> {
    let path = dir.join(file_name);
    let mut writer = csv::Writer::from_path(&path)?;

    writer.write_record(ORDER_HEADERS)?;
    if leading_header {
        writer.write_record(ORDER_HEADERS)?;
    }
    for row in rows {
        writer.write_record(row.cells())?;
    }
    for extra in extra_rows {
        writer.write_record(extra)?;
    }
    writer.flush()?;

    Ok(path)
}

/// 合计行: 首列为 "Total"，其余为空
pub fn total_row() -> Vec<String> {
    let mut cells = vec![String::new(); ORDER_HEADERS.len()];
    cells[0] = "Total".to_string();
    cells[7] = "499.00".to_string();
    cells
}

/// 标准夹具: 10 条 Widget（8 条有运单，6 妥投 / 2 退回）+ 2 条西班牙 Gadget
pub fn widget_rows() -> Vec<OrderRow> {
    let mut rows = Vec::new();
    for i in 0..10 {
        let status = match i {
            0..=5 => "Delivered",
            6 | 7 => "Returned",
            _ => "Pending",
        };
        let mut row = OrderRow::new(&format!("#ITA{}", 100 + i), "Widget", status)
            .completed(&format!("{:02}/03/2025 10:00", i + 1))
            .located("20100", "MI");
        if i < 8 {
            row = row.shipped(&format!("SHP{}", i));
        }
        rows.push(row);
    }
    rows.push(
        OrderRow::new("LL15278", "Gadget", "Delivered")
            .shipped("SHPES1")
            .completed("15/03/2025 09:30")
            .located("28001", "M"),
    );
    rows.push(
        OrderRow::new("#ESP2", "Gadget", "Return")
            .shipped("SHPES2")
            .located("08001", "B"),
    );
    rows
}
