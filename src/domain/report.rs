// ==========================================
// 订单表格导入系统 - 导入报告
// ==========================================
// 职责: 单次导入运行的统计、行级失败、告警、最终结果
// 约定: 无论成功/失败/演练，报告总会生成
// ==========================================

use crate::domain::types::RowIndex;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{info, warn};

// ==========================================
// FailureKind - 行级失败分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    VariantNotFound, // SKU 不存在
    Validation,      // 明细校验失败（未落库）
    FieldMapping,    // 订单字段映射失败
    RowProcessing,   // 其他行级异常
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FailureKind::VariantNotFound => "VARIANT_NOT_FOUND",
            FailureKind::Validation => "VALIDATION",
            FailureKind::FieldMapping => "FIELD_MAPPING",
            FailureKind::RowProcessing => "ROW_PROCESSING",
        };
        write!(f, "{}", s)
    }
}

/// 行级失败记录（按发生顺序）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowFailure {
    pub row_index: RowIndex,
    pub kind: FailureKind,
    pub message: String,
}

/// 行级告警（不影响订单处理，如用户未匹配）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowWarning {
    pub row_index: RowIndex,
    pub message: String,
}

// ==========================================
// RunOutcome - 事务最终结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunOutcome {
    Pending,    // 运行中
    Committed,  // 已提交
    RolledBack, // 已回滚（演练模式）
    Aborted,    // 致命错误，已回滚
}

impl RunOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunOutcome::Pending => "PENDING",
            RunOutcome::Committed => "COMMITTED",
            RunOutcome::RolledBack => "ROLLED_BACK",
            RunOutcome::Aborted => "ABORTED",
        }
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// StopReason - 扫描终止原因
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "reason")]
pub enum StopReason {
    EndOfSheet,                        // 读完所有行
    BlankRow { row_index: RowIndex },  // 遇到整行为空
    NoOrderData { row_index: RowIndex }, // 订单行无可识别字段
    Fatal { row_index: Option<RowIndex> },
}

// ==========================================
// ImportReport - 导入报告
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub run_id: String,
    pub file_name: Option<String>,
    pub dry_run: bool,
    /// 已读取的行数（含表头及其上方的标题行，不含终止运行的空行）
    pub rows_read: usize,
    pub processed_count: usize,    // 成功处理的订单行数
    pub orders_created: usize,
    pub line_items_created: usize,
    pub failures: Vec<RowFailure>,
    pub warnings: Vec<RowWarning>,
    pub outcome: RunOutcome,
    pub stop_reason: Option<StopReason>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl ImportReport {
    pub fn new(run_id: impl Into<String>, file_name: Option<String>, dry_run: bool) -> Self {
        Self {
            run_id: run_id.into(),
            file_name,
            dry_run,
            rows_read: 0,
            processed_count: 0,
            orders_created: 0,
            line_items_created: 0,
            failures: Vec::new(),
            warnings: Vec::new(),
            outcome: RunOutcome::Pending,
            stop_reason: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn record_failure(&mut self, row_index: RowIndex, kind: FailureKind, message: impl Into<String>) {
        self.failures.push(RowFailure {
            row_index,
            kind,
            message: message.into(),
        });
    }

    pub fn record_warning(&mut self, row_index: RowIndex, message: impl Into<String>) {
        self.warnings.push(RowWarning {
            row_index,
            message: message.into(),
        });
    }

    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    pub fn finish(&mut self, outcome: RunOutcome) {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
    }

    /// 人类可读的单行汇总
    pub fn summary_line(&self) -> String {
        format!(
            "导入{}: 处理订单 {} 个, 新建订单 {} 个, 新建明细 {} 条, 失败 {} 行, 告警 {} 条, 结果 {}",
            if self.dry_run { "(演练)" } else { "" },
            self.processed_count,
            self.orders_created,
            self.line_items_created,
            self.failures.len(),
            self.warnings.len(),
            self.outcome
        )
    }

    /// 输出报告到日志
    pub fn log_summary(&self) {
        info!(
            run_id = %self.run_id,
            dry_run = self.dry_run,
            rows_read = self.rows_read,
            processed = self.processed_count,
            orders = self.orders_created,
            line_items = self.line_items_created,
            failures = self.failures.len(),
            warnings = self.warnings.len(),
            outcome = %self.outcome,
            "{}",
            self.summary_line()
        );

        for failure in &self.failures {
            warn!(
                row_index = failure.row_index,
                kind = %failure.kind,
                "行处理失败: {}",
                failure.message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_records_in_order() {
        let mut report = ImportReport::new("run-1", None, false);
        report.record_failure(3, FailureKind::VariantNotFound, "sku ZZZZ");
        report.record_failure(5, FailureKind::Validation, "price");
        report.record_warning(1, "user");

        assert_eq!(report.failure_count(), 2);
        assert_eq!(report.failures[0].row_index, 3);
        assert_eq!(report.failures[1].kind, FailureKind::Validation);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_report_finish_sets_outcome() {
        let mut report = ImportReport::new("run-1", Some("orders.csv".to_string()), true);
        assert_eq!(report.outcome, RunOutcome::Pending);

        report.finish(RunOutcome::RolledBack);
        assert_eq!(report.outcome, RunOutcome::RolledBack);
        assert!(report.finished_at.is_some());
        assert!(report.summary_line().contains("演练"));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let mut report = ImportReport::new("run-1", None, false);
        report.stop_reason = Some(StopReason::BlankRow { row_index: 4 });
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["outcome"], "PENDING");
        assert_eq!(json["stop_reason"]["reason"], "BLANK_ROW");
        assert_eq!(json["stop_reason"]["row_index"], 4);
    }
}
