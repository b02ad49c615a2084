// ==========================================
// 订单表格导入系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::column_layout::{ColumnLayout, ImportOptions};
use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::importer::error::{ImportError, ImportResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| ImportError::DatabaseConnectionError(e.to_string()))?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// 获取所有 global 配置的快照（JSON格式）
    pub fn get_config_snapshot(&self) -> ImportResult<String> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        let read_err = |e: rusqlite::Error| ImportError::ConfigReadError {
            key: "*".to_string(),
            message: e.to_string(),
        };

        let mut stmt = conn
            .prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")
            .map_err(read_err)?;

        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(read_err)?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let (key, value) = row.map_err(read_err)?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        serde_json::to_string(&json_value).map_err(|e| ImportError::InternalError(e.to_string()))
    }

    /// 读取并解析配置值，不存在时使用默认值
    fn get_parsed_or<T: FromStr>(&self, key: &str, default: T) -> ImportResult<T>
    where
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|e| ImportError::ConfigValueError {
                    key: key.to_string(),
                    value: raw.clone(),
                    message: e.to_string(),
                }),
        }
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
impl ImportConfigReader for ConfigManager {
    fn column_layout(&self) -> ImportResult<ColumnLayout> {
        let d = ColumnLayout::default();
        let layout = ColumnLayout {
            order_number: self.get_parsed_or(config_keys::COLUMN_ORDER_NUMBER, d.order_number)?,
            email: self.get_parsed_or(config_keys::COLUMN_EMAIL, d.email)?,
            financial_status: self
                .get_parsed_or(config_keys::COLUMN_FINANCIAL_STATUS, d.financial_status)?,
            order_key: self.get_parsed_or(config_keys::COLUMN_ORDER_KEY, d.order_key)?,
            quantity: self.get_parsed_or(config_keys::COLUMN_QUANTITY, d.quantity)?,
            price: self.get_parsed_or(config_keys::COLUMN_PRICE, d.price)?,
            sku: self.get_parsed_or(config_keys::COLUMN_SKU, d.sku)?,
        };
        layout.validate()?;
        Ok(layout)
    }

    fn import_options(&self) -> ImportResult<ImportOptions> {
        let d = ImportOptions::default();

        let default_currency = self
            .get_global_config_value(config_keys::DEFAULT_CURRENCY)?
            .map(|v| v.trim().to_uppercase())
            .filter(|v| !v.is_empty())
            .unwrap_or(d.default_currency);

        Ok(ImportOptions {
            dry_run: false,
            header_row_index: self
                .get_parsed_or(config_keys::HEADER_ROW_INDEX, d.header_row_index)?,
            default_currency,
            track_inventory_levels: self
                .get_parsed_or(config_keys::TRACK_INVENTORY_LEVELS, d.track_inventory_levels)?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 运行选项
    pub const HEADER_ROW_INDEX: &str = "import.header_row_index";
    pub const DEFAULT_CURRENCY: &str = "import.default_currency";
    pub const TRACK_INVENTORY_LEVELS: &str = "import.track_inventory_levels";

    // 列布局
    pub const COLUMN_ORDER_NUMBER: &str = "import.column.order_number";
    pub const COLUMN_EMAIL: &str = "import.column.email";
    pub const COLUMN_FINANCIAL_STATUS: &str = "import.column.financial_status";
    pub const COLUMN_ORDER_KEY: &str = "import.column.order_key";
    pub const COLUMN_QUANTITY: &str = "import.column.quantity";
    pub const COLUMN_PRICE: &str = "import.column.price";
    pub const COLUMN_SKU: &str = "import.column.sku";
}
