// ==========================================
// 订单表格导入系统 - 运行控制器
// ==========================================
// 职责: 一次导入运行 = 一个数据库事务
//   - 正常结束: 提交（演练模式无条件回滚）
//   - 致命错误: 回滚，报告仍随错误返回
//   - 运行日志: 事务结束后写入 import_run（尽力而为，演练也记录）
// ==========================================

use crate::config::{ColumnLayout, ImportConfigReader, ImportOptions};
use crate::domain::{ImportReport, Row, RunOutcome, StopReason};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::OrderFieldMapper;
use crate::importer::order_reconciler::{OrderReconciler, RunContext};
use crate::importer::sheet_reader::{SheetReader, UniversalSheetReader};
use crate::repository::{ImportRunRepository, SqliteOrderImportRepository};
use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// 致命中止（携带已生成的报告）
#[derive(Error, Debug)]
#[error("导入运行中止 (run_id {}): {source}", .report.run_id)]
pub struct RunAborted {
    pub report: ImportReport,
    pub source: ImportError,
}

// ==========================================
// OrderImportRunner
// ==========================================
pub struct OrderImportRunner {
    conn: Arc<Mutex<Connection>>,
    layout: ColumnLayout,
    options: ImportOptions,
}

impl OrderImportRunner {
    pub fn new(conn: Arc<Mutex<Connection>>, layout: ColumnLayout, options: ImportOptions) -> Self {
        Self {
            conn,
            layout,
            options,
        }
    }

    /// 从配置读取列布局与运行选项
    pub fn from_config<C: ImportConfigReader>(
        conn: Arc<Mutex<Connection>>,
        config: &C,
    ) -> ImportResult<Self> {
        Ok(Self::new(conn, config.column_layout()?, config.import_options()?))
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// 读取表格文件并导入
    pub fn run_file(&self, file_path: &Path) -> Result<ImportReport, RunAborted> {
        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());

        match UniversalSheetReader.read_rows(file_path) {
            Ok(rows) => self.run(&rows, file_name),
            Err(e) => {
                error!(file = %file_path.display(), error = %e, "表格读取失败");
                let report = ImportReport::new(
                    Uuid::new_v4().to_string(),
                    file_name,
                    self.options.dry_run,
                );
                Err(self.abort(report, e))
            }
        }
    }

    /// 对已读取的行执行一次导入运行
    ///
    /// # 返回
    /// - Ok(report): 运行完成（已提交或演练回滚），行级失败在报告中
    /// - Err(RunAborted): 致命错误，事务已回滚
    #[instrument(skip(self, rows), fields(run_id, dry_run = self.options.dry_run))]
    pub fn run(&self, rows: &[Row], file_name: Option<String>) -> Result<ImportReport, RunAborted> {
        let run_id = Uuid::new_v4().to_string();
        tracing::Span::current().record("run_id", run_id.as_str());
        info!(
            run_id = %run_id,
            file = ?file_name,
            total_rows = rows.len(),
            header_row = self.options.header_row_index,
            "开始导入订单"
        );

        let report = ImportReport::new(run_id, file_name, self.options.dry_run);
        let mut ctx = RunContext::new(report, self.options.default_currency.clone());

        let result = self.execute(rows, &mut ctx);
        let mut report = ctx.report;
        match result {
            Ok(outcome) => {
                report.finish(outcome);
                self.record_run(&report);
                report.log_summary();
                Ok(report)
            }
            Err(e) => Err(self.abort(report, e)),
        }
    }

    /// 事务内执行对账
    fn execute(&self, rows: &[Row], ctx: &mut RunContext) -> ImportResult<RunOutcome> {
        self.layout.validate()?;

        let header_row_index = self.options.header_row_index;
        let header = rows
            .get(header_row_index)
            .ok_or(ImportError::HeaderRowMissing(header_row_index))?;
        let mapper = OrderFieldMapper::from_header_row(header, &self.layout);

        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::DatabaseConnectionError(format!("锁获取失败: {}", e)))?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;

        let repo = SqliteOrderImportRepository::new(&tx);
        let reconciler = OrderReconciler::new(&repo, &mapper, &self.layout, &self.options);

        if let Err(e) = reconciler.reconcile(rows, ctx) {
            if let Err(rb) = tx.rollback() {
                error!(error = %rb, "事务回滚失败");
            }
            return Err(e);
        }

        if self.options.dry_run {
            tx.rollback()
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
            info!("演练模式，事务已回滚");
            Ok(RunOutcome::RolledBack)
        } else {
            tx.commit()
                .map_err(|e| ImportError::DatabaseTransactionError(e.to_string()))?;
            info!("事务已提交");
            Ok(RunOutcome::Committed)
        }
    }

    /// 致命中止：补全报告并记录
    fn abort(&self, mut report: ImportReport, e: ImportError) -> RunAborted {
        error!(run_id = %report.run_id, error = %e, "导入运行中止，事务已回滚");
        if report.stop_reason.is_none() {
            report.stop_reason = Some(StopReason::Fatal { row_index: None });
        }
        report.finish(RunOutcome::Aborted);
        self.record_run(&report);
        report.log_summary();
        RunAborted { report, source: e }
    }

    /// 写运行日志（失败只告警，不影响运行结果）
    fn record_run(&self, report: &ImportReport) {
        let conn = match self.conn.lock() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "运行日志写入失败: 锁获取失败");
                return;
            }
        };

        if let Err(e) = ImportRunRepository::new(&conn).record(report) {
            warn!(run_id = %report.run_id, error = %e, "运行日志写入失败");
        }
    }
}
