// ==========================================
// 订单表格导入系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、导入报告
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod catalog;
pub mod order;
pub mod report;
pub mod types;

// 重导出核心类型
pub use catalog::{User, Variant};
pub use order::{FinancialStatus, LineItem, Order, OrderState};
pub use report::{FailureKind, ImportReport, RowFailure, RowWarning, RunOutcome, StopReason};
pub use types::{Row, RowIndex};
