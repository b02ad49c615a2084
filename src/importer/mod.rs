// ==========================================
// 订单表格导入系统 - 导入层
// ==========================================
// 职责: 表格行 → 订单/明细
// 支持: Excel (.xlsx/.xlsm/.xls/.ods), CSV
// 组件: 读取 → 分类 → 字段映射 → 明细构建 → 对账 → 运行控制
// ==========================================

// 模块声明
pub mod error;
pub mod field_mapper;
pub mod inventory_resolver;
pub mod line_item_builder;
pub mod order_reconciler;
pub mod row_classifier;
pub mod run_controller;
pub mod sheet_reader;

// 重导出核心类型
pub use error::{ImportError, ImportResult};
pub use field_mapper::{FieldMapper, OrderField, OrderFieldMapper};
pub use inventory_resolver::InventoryResolver;
pub use line_item_builder::{LineItemBuilder, LineItemOutcome};
pub use order_reconciler::{OrderReconciler, ReconcilerState, RowOutcome, RunContext};
pub use row_classifier::{is_end_of_data, RowClassifier, RowKind};
pub use run_controller::{OrderImportRunner, RunAborted};
pub use sheet_reader::{CsvSheetReader, ExcelSheetReader, SheetReader, UniversalSheetReader};
