// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 临时数据库初始化、商品/用户种子数据、Shopify 导出行构造
// ==========================================

#![allow(dead_code)]

use order_sheet_import::db::{init_schema, open_sqlite_connection};
use order_sheet_import::Row;
use rusqlite::{params, Connection};
use std::error::Error;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

/// Shopify 订单导出表头（21 列）
pub const SHOPIFY_HEADER: [&str; 21] = [
    "Name",
    "Email",
    "Financial Status",
    "Paid at",
    "Fulfillment Status",
    "Fulfilled at",
    "Accepts Marketing",
    "Currency",
    "Subtotal",
    "Shipping",
    "Taxes",
    "Total",
    "Discount Code",
    "Discount Amount",
    "Shipping Method",
    "Created at",
    "Lineitem quantity",
    "Lineitem name",
    "Lineitem price",
    "Lineitem compare at price",
    "Lineitem sku",
];

/// 创建临时测试数据库并初始化 schema + 种子数据
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_string_lossy().into_owned();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    seed_catalog(&conn)?;

    Ok((temp_file, db_path))
}

/// 打开共享连接（供 Runner / ConfigManager 使用）
pub fn open_shared(db_path: &str) -> Arc<Mutex<Connection>> {
    let conn = open_sqlite_connection(db_path).expect("Failed to open test database");
    Arc::new(Mutex::new(conn))
}

/// 种子数据: 商品 A1/B2/C3，用户 ann@example.com
pub fn seed_catalog(conn: &Connection) -> Result<(), Box<dyn Error>> {
    let variants = [
        ("A1", "Widget", "10.00", 5),
        ("B2", "Gadget", "4.50", 0),
        ("C3", "Gizmo", "1.25", 100),
    ];
    for (sku, name, price, on_hand) in variants {
        conn.execute(
            "INSERT INTO variants (sku, name, price, count_on_hand) VALUES (?1, ?2, ?3, ?4)",
            params![sku, name, price, on_hand],
        )?;
    }

    conn.execute(
        "INSERT INTO users (email) VALUES (?1)",
        params!["ann@example.com"],
    )?;
    Ok(())
}

pub fn header_row() -> Row {
    Row::from_strs(&SHOPIFY_HEADER)
}

/// 订单行（订单号/邮箱/支付状态 + 本行明细）
pub fn order_row(number: &str, email: &str, status: &str, qty: &str, price: &str, sku: &str) -> Row {
    Row::from_strs(&order_cells(number, email, status, qty, price, sku))
}

/// 续行（只有明细列）
pub fn line_row(qty: &str, price: &str, sku: &str) -> Row {
    order_row("", "", "", qty, price, sku)
}

pub fn blank_row() -> Row {
    Row::from_strs(&[""; 21])
}

/// 订单行的原始单元格（可在构造 Row 前改写任意列）
pub fn order_cells(number: &str, email: &str, status: &str, qty: &str, price: &str, sku: &str) -> Vec<String> {
    let mut cells = vec![String::new(); 21];
    cells[0] = number.to_string();
    cells[1] = email.to_string();
    cells[2] = status.to_string();
    cells[16] = qty.to_string();
    cells[18] = price.to_string();
    cells[20] = sku.to_string();
    cells
}

/// 将行写成 CSV 临时文件
pub fn write_csv(rows: &[Row]) -> Result<NamedTempFile, Box<dyn Error>> {
    let mut file = tempfile::Builder::new().suffix(".csv").tempfile()?;
    {
        let mut writer = csv::Writer::from_writer(file.as_file_mut());
        for row in rows {
            let record: Vec<&str> = (0..21).map(|i| row.cell(i).unwrap_or("")).collect();
            writer.write_record(&record)?;
        }
        writer.flush()?;
    }
    file.as_file_mut().flush()?;
    Ok(file)
}

pub fn count_rows(conn: &Arc<Mutex<Connection>>, table: &str) -> i64 {
    let conn = conn.lock().unwrap();
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |r| r.get(0))
        .unwrap()
}

/// 订单明细数量列表（按插入顺序）
pub fn line_item_quantities(conn: &Arc<Mutex<Connection>>, number: &str) -> Vec<i64> {
    let conn = conn.lock().unwrap();
    let mut stmt = conn
        .prepare(
            "SELECT li.quantity FROM line_items li JOIN orders o ON o.id = li.order_id \
             WHERE o.number = ?1 ORDER BY li.id",
        )
        .unwrap();
    let rows = stmt
        .query_map(params![number], |r| r.get::<_, i64>(0))
        .unwrap();
    rows.map(|r| r.unwrap()).collect()
}
