// ==========================================
// 订单表格导入系统 - 配置层
// ==========================================
// 职责: 列布局、运行选项、config_kv 覆写
// 存储: config_kv 表
// ==========================================

pub mod column_layout;
pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置
pub use column_layout::{ColumnLayout, ImportOptions};
pub use config_manager::{config_keys, ConfigManager};
pub use import_config_trait::ImportConfigReader;
