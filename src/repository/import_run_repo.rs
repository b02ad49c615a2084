// ==========================================
// 订单表格导入系统 - 导入运行日志 Repository
// ==========================================
// 职责: import_run 表的写入与查询（审计记录，演练也会写入）
// ==========================================

use crate::domain::ImportReport;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Connection, OptionalExtension};

/// 导入运行日志行
#[derive(Debug, Clone)]
pub struct ImportRunRecord {
    pub run_id: String,
    pub file_name: Option<String>,
    pub dry_run: bool,
    pub outcome: String,
    pub processed_count: i64,
    pub failure_count: i64,
    pub warning_count: i64,
    pub report_json: String,
}

pub struct ImportRunRepository<'c> {
    conn: &'c Connection,
}

impl<'c> ImportRunRepository<'c> {
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// 写入（或覆盖）一次运行记录
    pub fn record(&self, report: &ImportReport) -> RepositoryResult<()> {
        let report_json = serde_json::to_string(report)
            .map_err(|e| anyhow::anyhow!("报告序列化失败: {}", e))?;

        self.conn.execute(
            r#"
            INSERT OR REPLACE INTO import_run (
                run_id, file_name, dry_run, outcome, processed_count,
                failure_count, warning_count, report_json, started_at, finished_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                report.run_id,
                report.file_name,
                report.dry_run as i32,
                report.outcome.as_str(),
                report.processed_count as i64,
                report.failures.len() as i64,
                report.warnings.len() as i64,
                report_json,
                report.started_at,
                report.finished_at,
            ],
        )?;
        Ok(())
    }

    pub fn find(&self, run_id: &str) -> RepositoryResult<Option<ImportRunRecord>> {
        let record = self
            .conn
            .query_row(
                r#"
                SELECT run_id, file_name, dry_run, outcome, processed_count,
                       failure_count, warning_count, report_json
                  FROM import_run WHERE run_id = ?1
                "#,
                params![run_id],
                |row| {
                    Ok(ImportRunRecord {
                        run_id: row.get(0)?,
                        file_name: row.get(1)?,
                        dry_run: row.get::<_, i32>(2)? != 0,
                        outcome: row.get(3)?,
                        processed_count: row.get(4)?,
                        failure_count: row.get(5)?,
                        warning_count: row.get(6)?,
                        report_json: row.get(7)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }
}
