// ==========================================
// 订单表格导入系统 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::config::column_layout::{ColumnLayout, ImportOptions};
use crate::importer::error::ImportResult;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 用途: 导入模块所需的配置读取接口
// 实现者: ConfigManager（从 config_kv 表读取）
pub trait ImportConfigReader {
    /// 获取列布局
    ///
    /// # 默认值
    /// - ColumnLayout::default()（Shopify 导出格式）
    ///
    /// # 错误
    /// - 配置值无法解析为列号
    /// - 列位置冲突
    fn column_layout(&self) -> ImportResult<ColumnLayout>;

    /// 获取导入选项
    ///
    /// # 默认值
    /// - header_row_index = 0
    /// - default_currency = "USD"
    /// - track_inventory_levels = false
    /// - dry_run 永远为 false（只能由调用方显式开启）
    fn import_options(&self) -> ImportResult<ImportOptions>;
}
