// ==========================================
// 订单表格导入系统 - 订单对账器（逐行状态机）
// ==========================================
// 状态: Idle（无当前订单）→ BuildingOrder（订单构建中）
//       RowFailed（瞬态，立即复位为 Idle）
// 流程（按表格顺序，跳过表头行）:
//   1. 整行为空 → 数据结束
//   2. 续行 → 为当前订单追加明细；失败只记录，不影响当前订单
//   3. 新订单行 → 替换当前订单 → 字段映射 → 关联用户 → 本行明细
//      任一步失败 → 记录、丢弃半成品订单、复位为空订单
//   4. 新订单行无可识别字段 → 数据结束
//   5. 成功 → 计数 + 保存订单
// 红线: 行级错误在行边界被吸收，只有致命错误向上传播
// ==========================================

use crate::config::{ColumnLayout, ImportOptions};
use crate::domain::{FailureKind, ImportReport, Order, Row, RowIndex, StopReason};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::field_mapper::FieldMapper;
use crate::importer::line_item_builder::{LineItemBuilder, LineItemOutcome};
use crate::importer::row_classifier::{is_end_of_data, RowClassifier, RowKind};
use crate::repository::{OrderImportRepository, RepositoryError};
use tracing::{debug, error, info, warn};

// ==========================================
// ReconcilerState - 对账状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilerState {
    Idle,
    BuildingOrder,
    RowFailed,
}

// ==========================================
// RowOutcome - 单行处理结果
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowOutcome {
    /// 新订单行处理成功
    OrderStarted,
    /// 续行处理完成（明细已添加/跳过/校验未通过）
    Continued,
    /// 行级失败，已记录
    Failed,
}

// ==========================================
// RunContext - 单次运行的可变状态
// ==========================================
// 所有权: 独占当前构建中的订单，直到其被保存或丢弃
#[derive(Debug)]
pub struct RunContext {
    pub row_index: RowIndex,
    pub current_row: Option<Row>,
    pub current_order: Order,
    pub contains_data: bool,
    pub state: ReconcilerState,
    pub report: ImportReport,
    default_currency: String,
}

impl RunContext {
    pub fn new(report: ImportReport, default_currency: impl Into<String>) -> Self {
        let default_currency = default_currency.into();
        Self {
            row_index: 0,
            current_row: None,
            current_order: Order::new(default_currency.clone()),
            contains_data: false,
            state: ReconcilerState::Idle,
            report,
            default_currency,
        }
    }

    pub fn has_current_order(&self) -> bool {
        self.current_order.is_persisted()
    }

    pub fn processed_count(&self) -> usize {
        self.report.processed_count
    }

    /// 替换为全新的空订单
    fn reset_order(&mut self) -> Order {
        self.contains_data = false;
        self.state = ReconcilerState::Idle;
        std::mem::replace(
            &mut self.current_order,
            Order::new(self.default_currency.clone()),
        )
    }
}

// ==========================================
// OrderReconciler
// ==========================================
pub struct OrderReconciler<'r, R: OrderImportRepository, M: FieldMapper> {
    repo: &'r R,
    mapper: &'r M,
    classifier: RowClassifier,
    builder: LineItemBuilder<'r, R>,
    header_row_index: usize,
}

impl<'r, R: OrderImportRepository, M: FieldMapper> OrderReconciler<'r, R, M> {
    pub fn new(repo: &'r R, mapper: &'r M, layout: &ColumnLayout, options: &ImportOptions) -> Self {
        Self {
            repo,
            mapper,
            classifier: RowClassifier::new(layout),
            builder: LineItemBuilder::new(repo, layout, options.track_inventory_levels),
            header_row_index: options.header_row_index,
        }
    }

    /// 逐行对账
    ///
    /// # 返回
    /// - Ok(()): 扫描结束（终止原因写入 ctx.report.stop_reason）
    /// - Err: 致命错误（调用方负责回滚）
    pub fn reconcile(&self, rows: &[Row], ctx: &mut RunContext) -> ImportResult<()> {
        let mut stop_reason = StopReason::EndOfSheet;

        for (idx, row) in rows.iter().enumerate() {
            ctx.row_index = idx;

            // 表头行（及其上方的标题行）不是数据
            if idx <= self.header_row_index {
                ctx.report.rows_read = idx + 1;
                continue;
            }

            // 终止空行不计入已读行数
            if is_end_of_data(row, None) {
                info!(row_index = idx, "遇到空行，数据结束");
                stop_reason = StopReason::BlankRow { row_index: idx };
                break;
            }
            ctx.report.rows_read = idx + 1;

            info!(row_index = idx, row = %row, "处理行");
            ctx.current_row = Some(row.clone());

            let outcome = self.process_row(row, idx, ctx).map_err(|e| {
                ctx.report.stop_reason = Some(StopReason::Fatal { row_index: Some(idx) });
                e
            })?;

            if outcome != RowOutcome::OrderStarted {
                continue;
            }

            if is_end_of_data(row, Some(ctx.contains_data)) {
                info!(row_index = idx, "订单行无可识别字段，视为数据结束");
                self.discard_current(ctx)?;
                stop_reason = StopReason::NoOrderData { row_index: idx };
                break;
            }

            ctx.report.processed_count += 1;
            self.save_and_report(ctx)?;
        }

        self.finalize_current(ctx)?;
        ctx.report.stop_reason = Some(stop_reason);
        Ok(())
    }

    /// 处理单行（分类 → 续行/新订单）
    pub fn process_row(&self, row: &Row, idx: RowIndex, ctx: &mut RunContext) -> ImportResult<RowOutcome> {
        match self.classifier.classify(row, ctx.has_current_order()) {
            RowKind::Continuation => self.process_continuation(row, idx, ctx),
            RowKind::NewOrder => self.process_new_order(row, idx, ctx),
        }
    }

    fn process_continuation(&self, row: &Row, idx: RowIndex, ctx: &mut RunContext) -> ImportResult<RowOutcome> {
        debug!(row_index = idx, order = %ctx.current_order.label(), "续行，追加明细");

        match self.builder.build(row, idx, &mut ctx.current_order) {
            Ok(outcome) => {
                record_line_item_outcome(outcome, idx, &mut ctx.report);
                Ok(RowOutcome::Continued)
            }
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                // 当前订单上下文保持不变，该行无其他数据
                warn!(
                    row_index = idx,
                    order = %ctx.current_order.label(),
                    error = %e,
                    "续行明细添加失败"
                );
                ctx.report.record_failure(idx, e.failure_kind(), e.to_string());
                Ok(RowOutcome::Failed)
            }
        }
    }

    fn process_new_order(&self, row: &Row, idx: RowIndex, ctx: &mut RunContext) -> ImportResult<RowOutcome> {
        self.finalize_current(ctx)?;
        ctx.reset_order();
        ctx.state = ReconcilerState::BuildingOrder;

        match self.populate_new_order(row, idx, ctx) {
            Ok(()) => Ok(RowOutcome::OrderStarted),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                self.process_row_failure(e, idx, ctx)?;
                Ok(RowOutcome::Failed)
            }
        }
    }

    /// 新订单行：字段映射 → 用户关联 → 落库 → 本行明细
    fn populate_new_order(&self, row: &Row, idx: RowIndex, ctx: &mut RunContext) -> ImportResult<()> {
        let assigned = self.mapper.apply_fields(row, idx, &mut ctx.current_order)?;
        ctx.contains_data = assigned > 0;
        ctx.current_order.ensure_number();

        self.assign_user(idx, ctx)?;

        let order_id = self.repo.insert_order(&ctx.current_order).map_err(|e| match e {
            RepositoryError::UniqueConstraintViolation(_) => ImportError::DuplicateOrder {
                number: ctx.current_order.number.clone().unwrap_or_default(),
            },
            other => ImportError::Storage(other),
        })?;
        ctx.current_order.id = Some(order_id);
        ctx.report.orders_created += 1;
        debug!(row_index = idx, order = %ctx.current_order.label(), "订单已创建");

        // 订单行同时携带本订单的第一条明细
        let outcome = self.builder.build(row, idx, &mut ctx.current_order)?;
        record_line_item_outcome(outcome, idx, &mut ctx.report);
        Ok(())
    }

    /// 按邮箱关联用户（找不到只告警，订单照常处理）
    fn assign_user(&self, idx: RowIndex, ctx: &mut RunContext) -> ImportResult<()> {
        let email = match ctx.current_order.email.clone() {
            Some(email) => email,
            None => {
                debug!(row_index = idx, "订单无邮箱，跳过用户关联");
                return Ok(());
            }
        };

        info!(row_index = idx, email = %email, "订单关联用户");
        match self.repo.find_user_by_email(&email)? {
            Some(user) => ctx.current_order.user_id = Some(user.id),
            None => {
                let err = ImportError::UserNotFound { email };
                warn!(
                    row_index = idx,
                    order = %ctx.current_order.label(),
                    "无法关联用户: {}",
                    err
                );
                ctx.report.record_warning(idx, err.to_string());
            }
        }
        Ok(())
    }

    /// 行级失败：记录 → 丢弃半成品订单 → 复位为空订单
    fn process_row_failure(&self, e: ImportError, idx: RowIndex, ctx: &mut RunContext) -> ImportResult<()> {
        ctx.state = ReconcilerState::RowFailed;
        error!(
            row_index = idx,
            order = %ctx.current_order.label(),
            error = %e,
            "订单行处理失败"
        );
        ctx.report.record_failure(idx, e.failure_kind(), e.to_string());

        // 下一行不能挂到失败的订单上
        self.discard_current(ctx)
    }

    /// 丢弃当前订单（含已落库明细）并复位上下文
    fn discard_current(&self, ctx: &mut RunContext) -> ImportResult<()> {
        let broken = ctx.reset_order();
        if let Some(order_id) = broken.id {
            self.repo.discard_order(order_id)?;
            ctx.report.orders_created = ctx.report.orders_created.saturating_sub(1);
            ctx.report.line_items_created = ctx
                .report
                .line_items_created
                .saturating_sub(broken.line_items.len());
            debug!(order = %broken.label(), "已丢弃订单");
        }
        Ok(())
    }

    /// 保存并输出进度
    fn save_and_report(&self, ctx: &mut RunContext) -> ImportResult<()> {
        self.repo.update_order(&ctx.current_order)?;
        info!(
            order = %ctx.current_order.label(),
            line_items = ctx.current_order.line_items.len(),
            processed = ctx.report.processed_count,
            "订单已保存"
        );
        Ok(())
    }

    /// 订单离开上下文前写回合计（续行追加的明细）
    fn finalize_current(&self, ctx: &mut RunContext) -> ImportResult<()> {
        if ctx.current_order.is_persisted() {
            self.repo.update_order(&ctx.current_order)?;
        }
        Ok(())
    }
}

fn record_line_item_outcome(outcome: LineItemOutcome, idx: RowIndex, report: &mut ImportReport) {
    match outcome {
        LineItemOutcome::Added(_) => report.line_items_created += 1,
        LineItemOutcome::Skipped => {}
        LineItemOutcome::Rejected { item, messages } => {
            let err = ImportError::LineItemInvalid {
                sku: item.sku,
                messages,
            };
            report.record_failure(idx, FailureKind::Validation, err.to_string());
        }
    }
}
