// ==========================================
// 配置驱动导入测试
// ==========================================
// 测试目标: config_kv 覆写列布局/运行选项后，导入按新配置执行
// ==========================================

mod test_helpers;

use order_sheet_import::config::{config_keys, ConfigManager, ImportConfigReader};
use order_sheet_import::domain::RunOutcome;
use order_sheet_import::importer::ImportError;
use order_sheet_import::{logging, OrderImportRunner, Row};
use test_helpers::{count_rows, create_test_db, header_row, line_item_quantities, open_shared};

#[test]
fn test_runner_uses_overridden_header_row_and_currency() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let config = ConfigManager::from_connection(conn.clone());

    config
        .set_global_config_value(config_keys::HEADER_ROW_INDEX, "1")
        .unwrap();
    config
        .set_global_config_value(config_keys::DEFAULT_CURRENCY, "eur")
        .unwrap();

    let runner = OrderImportRunner::from_config(conn.clone(), &config).unwrap();
    assert_eq!(runner.options().header_row_index, 1);
    assert_eq!(runner.options().default_currency, "EUR");

    let mut first = vec![String::new(); 21];
    first[0] = "#1001".to_string();
    first[2] = "paid".to_string();
    first[16] = "2".to_string();
    first[18] = "10.00".to_string();
    first[20] = "A1".to_string();

    let rows = vec![
        Row::from_strs(&["Orders export 2015-08"]),
        header_row(),
        Row::from_strs(&first),
    ];

    let report = runner.run(&rows, None).unwrap();

    assert_eq!(report.outcome, RunOutcome::Committed);
    assert_eq!(report.processed_count, 1);
    assert_eq!(line_item_quantities(&conn, "#1001"), vec![2]);

    let guard = conn.lock().unwrap();
    let currency: String = guard
        .query_row("SELECT currency FROM line_items", [], |r| r.get(0))
        .unwrap();
    assert_eq!(currency, "EUR");
}

#[test]
fn test_runner_uses_overridden_columns() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let config = ConfigManager::from_connection(conn.clone());

    // 紧凑布局: 订单号 / 邮箱 / 状态 / SKU / 数量 / 单价
    for (key, value) in [
        (config_keys::COLUMN_SKU, "3"),
        (config_keys::COLUMN_QUANTITY, "4"),
        (config_keys::COLUMN_PRICE, "5"),
    ] {
        config.set_global_config_value(key, value).unwrap();
    }

    let runner = OrderImportRunner::from_config(conn.clone(), &config).unwrap();
    let rows = vec![
        Row::from_strs(&["Name", "Email", "Financial Status", "SKU", "Qty", "Price"]),
        Row::from_strs(&["#2001", "", "paid", "C3", "4", "1.25"]),
        Row::from_strs(&["", "", "", "A1", "1", "10.00"]),
    ];

    let report = runner.run(&rows, None).unwrap();

    assert_eq!(report.processed_count, 1);
    assert!(report.failures.is_empty());
    assert_eq!(line_item_quantities(&conn, "#2001"), vec![4, 1]);
}

#[test]
fn test_invalid_config_value_is_reported() {
    logging::init_test();
    let (_tmp, db_path) = create_test_db().unwrap();
    let conn = open_shared(&db_path);
    let config = ConfigManager::from_connection(conn.clone());

    config
        .set_global_config_value(config_keys::TRACK_INVENTORY_LEVELS, "sometimes")
        .unwrap();

    let result = config.import_options();

    assert!(matches!(result, Err(ImportError::ConfigValueError { .. })));
    assert!(OrderImportRunner::from_config(conn.clone(), &config).is_err());
    assert_eq!(count_rows(&conn, "import_run"), 0);
}
