// ==========================================
// 订单表格导入系统 - 行分类器
// ==========================================
// 规则: 已有当前订单 且 订单标识列为空 → 续行；否则 → 新订单行
// 约束: 纯函数，无副作用
// ==========================================

use crate::config::ColumnLayout;
use crate::domain::Row;

/// 行分类结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    NewOrder,     // 开启新订单（替换当前订单上下文）
    Continuation, // 仅为当前订单追加一条明细
}

// ==========================================
// RowClassifier
// ==========================================
#[derive(Debug, Clone, Copy)]
pub struct RowClassifier {
    order_key_column: usize,
}

impl RowClassifier {
    pub fn new(layout: &ColumnLayout) -> Self {
        Self {
            order_key_column: layout.order_key,
        }
    }

    pub fn classify(&self, row: &Row, has_current_order: bool) -> RowKind {
        if has_current_order && row.is_blank_at(self.order_key_column) {
            RowKind::Continuation
        } else {
            RowKind::NewOrder
        }
    }
}

/// 数据结束判定（两条启发式规则集中于此）
///
/// - 整行为空 → 数据结束
/// - 传入了当前订单的“含数据”标志且为 false → 订单行没有任何可识别字段，视为已越过真实数据
///
/// 导出格式没有可靠的行数时只能依赖这两条规则；中途出现的稀疏行会被误判为结束
pub fn is_end_of_data(row: &Row, order_contains_data: Option<bool>) -> bool {
    row.is_blank() || order_contains_data == Some(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> RowClassifier {
        RowClassifier::new(&ColumnLayout::default())
    }

    #[test]
    fn test_filled_order_key_is_always_new_order() {
        let row = Row::from_strs(&["#1001", "a@x.com", "paid"]);

        assert_eq!(classifier().classify(&row, false), RowKind::NewOrder);
        assert_eq!(classifier().classify(&row, true), RowKind::NewOrder);
    }

    #[test]
    fn test_blank_order_key_continues_current_order() {
        let row = Row::from_strs(&["#1001", "a@x.com", ""]);

        assert_eq!(classifier().classify(&row, true), RowKind::Continuation);
    }

    #[test]
    fn test_blank_order_key_without_current_order_is_new_order() {
        let row = Row::from_strs(&["", "", ""]);

        assert_eq!(classifier().classify(&row, false), RowKind::NewOrder);
    }

    #[test]
    fn test_short_row_treated_as_blank_key() {
        let row = Row::from_strs(&["#1001"]);

        assert_eq!(classifier().classify(&row, true), RowKind::Continuation);
    }

    #[test]
    fn test_end_of_data_predicate() {
        let blank = Row::from_strs(&["", ""]);
        let filled = Row::from_strs(&["#1", "", "paid"]);

        assert!(is_end_of_data(&blank, None));
        assert!(!is_end_of_data(&filled, None));
        assert!(!is_end_of_data(&filled, Some(true)));
        assert!(is_end_of_data(&filled, Some(false)));
    }
}
