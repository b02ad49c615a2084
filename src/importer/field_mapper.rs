// ==========================================
// 订单表格导入系统 - 订单字段映射器
// ==========================================
// 职责: 按可配置字典把表格列赋值到 Order 属性 + 类型转换
// 约定: 返回成功赋值的字段数（>0 即“订单含数据”）
// 字典: 表头标题（忽略大小写/首尾空格）→ OrderField
// ==========================================

use crate::config::ColumnLayout;
use crate::domain::{FinancialStatus, Order, Row, RowIndex};
use crate::importer::error::{ImportError, ImportResult};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::debug;

// ==========================================
// FieldMapper Trait
// ==========================================
// 用途: 行 → 目标对象 的字段赋值能力
// 实现者: OrderFieldMapper
pub trait FieldMapper {
    /// 将行中可识别的列赋值到订单
    ///
    /// # 返回
    /// - Ok(n): 成功赋值的字段数
    /// - Err(FieldMapping): 值无法转换（行级失败）
    fn apply_fields(&self, row: &Row, row_index: RowIndex, target: &mut Order) -> ImportResult<usize>;
}

// ==========================================
// OrderField - 可映射的订单属性
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderField {
    Number,
    Email,
    FinancialStatus,
    FulfillmentStatus,
    Currency,
    Total,
    PlacedAt,
}

impl OrderField {
    pub fn name(&self) -> &'static str {
        match self {
            OrderField::Number => "number",
            OrderField::Email => "email",
            OrderField::FinancialStatus => "financial_status",
            OrderField::FulfillmentStatus => "fulfillment_status",
            OrderField::Currency => "currency",
            OrderField::Total => "total",
            OrderField::PlacedAt => "placed_at",
        }
    }
}

/// 默认字典（Shopify 订单导出表头）
pub fn default_dictionary() -> HashMap<String, OrderField> {
    [
        ("name", OrderField::Number),
        ("order", OrderField::Number),
        ("order number", OrderField::Number),
        ("email", OrderField::Email),
        ("financial status", OrderField::FinancialStatus),
        ("fulfillment status", OrderField::FulfillmentStatus),
        ("currency", OrderField::Currency),
        ("total", OrderField::Total),
        ("created at", OrderField::PlacedAt),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect()
}

fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

// ==========================================
// OrderFieldMapper - 字典驱动的订单映射器
// ==========================================
#[derive(Debug, Clone)]
pub struct OrderFieldMapper {
    columns: Vec<(usize, OrderField)>,
}

impl OrderFieldMapper {
    /// 直接指定 列号 → 字段
    pub fn new(mut columns: Vec<(usize, OrderField)>) -> Self {
        columns.sort_by_key(|(col, _)| *col);
        columns.dedup_by_key(|(col, _)| *col);
        Self { columns }
    }

    /// 从表头行构建（默认字典）
    pub fn from_header_row(header: &Row, layout: &ColumnLayout) -> Self {
        Self::from_header_row_with_dictionary(header, layout, &default_dictionary())
    }

    /// 从表头行构建（自定义字典）
    ///
    /// 列布局中的固定列（订单号/邮箱/支付状态）总会被映射，即使表头标题不在字典中
    pub fn from_header_row_with_dictionary(
        header: &Row,
        layout: &ColumnLayout,
        dictionary: &HashMap<String, OrderField>,
    ) -> Self {
        let normalized: HashMap<String, OrderField> = dictionary
            .iter()
            .map(|(k, v)| (normalize_title(k), *v))
            .collect();

        let mut columns = vec![
            (layout.order_number, OrderField::Number),
            (layout.email, OrderField::Email),
            (layout.financial_status, OrderField::FinancialStatus),
        ];

        for (col, title) in header.filled_cells() {
            if let Some(field) = normalized.get(&normalize_title(title)) {
                // 固定列优先，同一字段不重复映射
                if columns.iter().any(|(c, f)| *c == col || f == field) {
                    continue;
                }
                columns.push((col, *field));
            }
        }

        debug!(mapped = columns.len(), "订单字段映射表构建完成");
        Self::new(columns)
    }

    pub fn columns(&self) -> &[(usize, OrderField)] {
        &self.columns
    }

    fn assign(
        &self,
        field: OrderField,
        value: &str,
        row_index: RowIndex,
        target: &mut Order,
    ) -> ImportResult<()> {
        let mapping_err = |message: String| ImportError::FieldMapping {
            row: row_index,
            column: field.name().to_string(),
            message,
        };

        match field {
            OrderField::Number => target.number = Some(value.to_string()),
            OrderField::Email => target.email = Some(value.to_lowercase()),
            OrderField::FinancialStatus => {
                target.financial_status = Some(FinancialStatus::parse(value))
            }
            OrderField::FulfillmentStatus => target.fulfillment_status = Some(value.to_string()),
            OrderField::Currency => {
                let code = value.to_uppercase();
                if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                    return Err(mapping_err(format!("无效币种代码: {}", value)));
                }
                target.currency = code;
            }
            OrderField::Total => {
                let total = Decimal::from_str(value)
                    .map_err(|_| mapping_err(format!("无法解析为金额: {}", value)))?;
                target.total = Some(total);
            }
            OrderField::PlacedAt => {
                let placed_at = parse_timestamp(value)
                    .ok_or_else(|| mapping_err(format!("日期时间格式错误: {}", value)))?;
                target.placed_at = Some(placed_at);
            }
        }
        Ok(())
    }
}

impl FieldMapper for OrderFieldMapper {
    fn apply_fields(&self, row: &Row, row_index: RowIndex, target: &mut Order) -> ImportResult<usize> {
        let mut assigned = 0;
        for (col, field) in &self.columns {
            if let Some(value) = row.cell(*col) {
                self.assign(*field, value, row_index, target)?;
                assigned += 1;
            }
        }
        Ok(assigned)
    }
}

/// 解析时间戳
///
/// 支持:
/// - `2015-08-01 10:22:33 +0100`（导出表格式）
/// - `2015-08-01 10:22:33`（按 UTC）
/// - RFC 3339
/// - `2015-08-01`（当日 00:00 UTC）
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S %z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn header() -> Row {
        Row::from_strs(&[
            "Name",
            "Email",
            "Financial Status",
            "Paid at",
            "Fulfillment Status",
            "Fulfilled at",
            "Accepts Marketing",
            "Currency",
            "Subtotal",
            "Shipping",
            "Taxes",
            "Total",
            "Discount Code",
            "Discount Amount",
            "Shipping Method",
            "Created at",
            "Lineitem quantity",
            "Lineitem name",
            "Lineitem price",
            "Lineitem compare at price",
            "Lineitem sku",
        ])
    }

    fn row(values: &[(usize, &str)]) -> Row {
        let mut cells = vec![String::new(); 21];
        for (idx, v) in values {
            cells[*idx] = v.to_string();
        }
        Row::from_strs(&cells)
    }

    #[test]
    fn test_mapper_built_from_shopify_header() {
        let mapper = OrderFieldMapper::from_header_row(&header(), &ColumnLayout::default());
        let fields: Vec<OrderField> = mapper.columns().iter().map(|(_, f)| *f).collect();

        assert_eq!(mapper.columns().len(), 7);
        assert!(fields.contains(&OrderField::Currency));
        assert!(fields.contains(&OrderField::PlacedAt));
        assert_eq!(mapper.columns()[0], (0, OrderField::Number));
    }

    #[test]
    fn test_apply_fields_counts_assignments() {
        let mapper = OrderFieldMapper::from_header_row(&header(), &ColumnLayout::default());
        let mut order = Order::new("USD");

        let assigned = mapper
            .apply_fields(
                &row(&[
                    (0, "#1001"),
                    (1, "Ann@Example.com"),
                    (2, "paid"),
                    (7, "gbp"),
                    (11, "20.00"),
                    (15, "2015-08-01 10:22:33 +0100"),
                ]),
                1,
                &mut order,
            )
            .unwrap();

        assert_eq!(assigned, 6);
        assert_eq!(order.number.as_deref(), Some("#1001"));
        assert_eq!(order.email.as_deref(), Some("ann@example.com"));
        assert_eq!(order.financial_status, Some(FinancialStatus::Paid));
        assert_eq!(order.currency, "GBP");
        assert_eq!(order.total, Some(Decimal::from_str("20.00").unwrap()));
        let placed_at = order.placed_at.unwrap();
        assert_eq!(placed_at.day(), 1);
        assert_eq!(placed_at.hour(), 9);
    }

    #[test]
    fn test_apply_fields_on_line_item_only_row() {
        let mapper = OrderFieldMapper::from_header_row(&header(), &ColumnLayout::default());
        let mut order = Order::new("USD");

        let assigned = mapper
            .apply_fields(&row(&[(16, "1"), (20, "A1")]), 2, &mut order)
            .unwrap();

        assert_eq!(assigned, 0);
    }

    #[test]
    fn test_invalid_total_is_mapping_error() {
        let mapper = OrderFieldMapper::from_header_row(&header(), &ColumnLayout::default());
        let mut order = Order::new("USD");

        let result = mapper.apply_fields(&row(&[(0, "#1"), (11, "twenty")]), 3, &mut order);

        match result {
            Err(ImportError::FieldMapping { row, column, .. }) => {
                assert_eq!(row, 3);
                assert_eq!(column, "total");
            }
            other => panic!("expected FieldMapping, got {:?}", other),
        }
    }

    #[test]
    fn test_custom_dictionary() {
        let mut dictionary = HashMap::new();
        dictionary.insert("Order Total".to_string(), OrderField::Total);
        let header = Row::from_strs(&["Name", "Email", "Status", "Order Total"]);

        let mapper = OrderFieldMapper::from_header_row_with_dictionary(
            &header,
            &ColumnLayout::default(),
            &dictionary,
        );

        assert!(mapper.columns().contains(&(3, OrderField::Total)));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        assert!(parse_timestamp("2015-08-01 10:22:33 +0100").is_some());
        assert!(parse_timestamp("2015-08-01T10:22:33Z").is_some());
        assert!(parse_timestamp("2015-08-01 10:22:33").is_some());
        assert!(parse_timestamp("2015-08-01").is_some());
        assert!(parse_timestamp("01/08/2015").is_none());
    }
}
