// ==========================================
// 订单表格导入系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分类: is_fatal() 是唯一的致命/行级判定点
//   - 行级: 记录后跳过，不中断运行
//   - 致命: 中断运行，整事务回滚后向上抛出
// ==========================================

use crate::domain::report::FailureKind;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误 =====
    #[error("文件不存在: {0}")]
    FileNotFound(String),

    #[error("文件格式不支持: {0}（仅支持 .xlsx/.xlsm/.xls/.ods/.csv）")]
    UnsupportedFormat(String),

    #[error("文件读取失败: {0}")]
    FileReadError(String),

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    #[error("表头行不存在: 行 {0}")]
    HeaderRowMissing(usize),

    // ===== 行级错误 =====
    #[error("找不到 SKU 对应的商品 [{sku}]")]
    VariantNotFound { sku: String },

    #[error("找不到邮箱对应的用户 [{email}]")]
    UserNotFound { email: String },

    #[error("明细校验失败 (SKU {sku}): {}", .messages.join("; "))]
    LineItemInvalid { sku: String, messages: Vec<String> },

    #[error("字段映射失败 (行 {row}, 列 {column}): {message}")]
    FieldMapping {
        row: usize,
        column: String,
        message: String,
    },

    #[error("订单号重复: {number}")]
    DuplicateOrder { number: String },

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("配置值格式错误 (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 数据库错误 =====
    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

    #[error(transparent)]
    Storage(#[from] RepositoryError),

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为致命错误（中断整次运行）
    pub fn is_fatal(&self) -> bool {
        match self {
            ImportError::VariantNotFound { .. }
            | ImportError::UserNotFound { .. }
            | ImportError::LineItemInvalid { .. }
            | ImportError::FieldMapping { .. }
            | ImportError::DuplicateOrder { .. } => false,
            // 约束违反属于数据问题，语句失败后事务仍可继续
            ImportError::Storage(e) => !e.is_constraint_violation(),
            _ => true,
        }
    }

    /// 行级错误在报告中的分类
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            ImportError::VariantNotFound { .. } => FailureKind::VariantNotFound,
            ImportError::LineItemInvalid { .. } => FailureKind::Validation,
            ImportError::FieldMapping { .. } => FailureKind::FieldMapping,
            _ => FailureKind::RowProcessing,
        }
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::Storage(RepositoryError::from(err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;
