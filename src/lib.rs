// ==========================================
// 订单表格导入系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 电商订单导出表 → 订单/明细 批量对账导入
// 运行模型: 单线程顺序处理，一次运行一个事务
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 表格对账
pub mod importer;

// 配置层 - 列布局与运行选项
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域实体
pub use domain::{
    FailureKind, FinancialStatus, ImportReport, LineItem, Order, OrderState, Row, RowIndex,
    RunOutcome, StopReason, User, Variant,
};

// 导入
pub use importer::{ImportError, ImportResult, OrderImportRunner, RunAborted};

// 配置
pub use config::{ColumnLayout, ConfigManager, ImportOptions};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "订单表格导入系统";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
