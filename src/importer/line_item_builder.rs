// ==========================================
// 订单表格导入系统 - 订单明细构建器
// ==========================================
// 流程: 取 SKU/数量/单价 → 解析 SKU → 数量门槛 → 构造 → 校验 → 落库
// 单价: 单元格为空时取库存单元目录价；填写了但无法解析则校验失败
// 红线: 数量 <= 0 不构造、不报错（导出表中合法存在）
// 红线: SKU 不存在一律报错（即使数量为 0）
// 红线: 校验失败的明细永不落库
// ==========================================

use crate::config::ColumnLayout;
use crate::domain::{LineItem, Order, Row, RowIndex};
use crate::importer::error::ImportResult;
use crate::importer::inventory_resolver::InventoryResolver;
use crate::repository::OrderImportRepository;
use rust_decimal::Decimal;
use std::str::FromStr;
use tracing::{debug, error, info};

/// 明细构建结果
#[derive(Debug, Clone)]
pub enum LineItemOutcome {
    /// 已落库并追加到订单
    Added(LineItem),
    /// 数量 <= 0，正常跳过
    Skipped,
    /// 校验失败，未落库
    Rejected { item: LineItem, messages: Vec<String> },
}

// ==========================================
// LineItemBuilder
// ==========================================
pub struct LineItemBuilder<'r, R: OrderImportRepository> {
    repo: &'r R,
    resolver: InventoryResolver<'r, R>,
    quantity_column: usize,
    price_column: usize,
    sku_column: usize,
    track_inventory_levels: bool,
}

impl<'r, R: OrderImportRepository> LineItemBuilder<'r, R> {
    pub fn new(repo: &'r R, layout: &ColumnLayout, track_inventory_levels: bool) -> Self {
        Self {
            repo,
            resolver: InventoryResolver::new(repo),
            quantity_column: layout.quantity,
            price_column: layout.price,
            sku_column: layout.sku,
            track_inventory_levels,
        }
    }

    /// 从行构建明细并挂到订单
    ///
    /// # 错误
    /// - VariantNotFound: SKU 不存在（行级）
    /// - Storage: 落库失败
    pub fn build(&self, row: &Row, row_index: RowIndex, order: &mut Order) -> ImportResult<LineItemOutcome> {
        let sku = row.cell(self.sku_column).unwrap_or("");
        let variant = self.resolver.resolve(sku)?;

        let quantity = parse_quantity(row.cell(self.quantity_column));
        if quantity <= 0 {
            debug!(row_index, sku = %variant.sku, quantity, "数量不大于 0，跳过明细");
            return Ok(LineItemOutcome::Skipped);
        }

        let mut item = LineItem {
            id: None,
            order_id: order.id,
            variant_id: variant.id,
            sku: variant.sku.clone(),
            quantity,
            price: match row.cell(self.price_column) {
                Some(raw) => parse_price(raw),
                None => variant.price,
            },
            currency: order.currency.clone(),
        };

        let mut messages = item.validation_errors(order);
        if self.track_inventory_levels && variant.count_on_hand < quantity {
            messages.push(format!(
                "库存不足: 现有 {}，需要 {}",
                variant.count_on_hand, quantity
            ));
        }

        if !messages.is_empty() {
            error!(row_index, sku = %item.sku, errors = ?messages, "明细校验失败");
            error!(order = %order.label(), "无法为订单添加明细");
            return Ok(LineItemOutcome::Rejected { item, messages });
        }

        item.id = Some(self.repo.insert_line_item(&item)?);
        order.line_items.push(item.clone());

        info!(
            row_index,
            sku = %item.sku,
            quantity,
            order = %order.label(),
            "明细已添加到订单"
        );
        Ok(LineItemOutcome::Added(item))
    }
}

/// 宽松整数解析：取前导符号与数字，其余忽略；无数字视为 0
///
/// `"2"` → 2, `"2.0"` → 2, `" -3"` → -3, `"abc"` → 0, 缺失 → 0
pub fn parse_quantity(raw: Option<&str>) -> i64 {
    let s = match raw {
        Some(s) => s.trim(),
        None => return 0,
    };

    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    match digits[..end].parse::<i64>() {
        Ok(n) if negative => -n,
        Ok(n) => n,
        Err(_) => 0,
    }
}

/// 单价解析（无法解析返回 None，由校验拦截）
pub fn parse_price(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw.trim()).ok()
}
