// ==========================================
// 订单表格导入系统 - 列布局与导入选项
// ==========================================
// 职责: 固定列位置（按导出格式版本固定，不自动识别）+ 运行选项
// 默认值: Shopify 订单导出表
//   0 Name / 1 Email / 2 Financial Status / 16 Lineitem quantity
//   18 Lineitem price / 20 Lineitem sku
// ==========================================

use crate::importer::error::{ImportError, ImportResult};
use serde::{Deserialize, Serialize};

// ==========================================
// ColumnLayout - 固定列位置
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub order_number: usize,     // 订单号
    pub email: usize,            // 下单邮箱
    pub financial_status: usize, // 支付状态
    pub order_key: usize,        // 判定续行的订单标识列（为空 = 续行）
    pub quantity: usize,         // 明细数量
    pub price: usize,            // 明细单价
    pub sku: usize,              // 明细 SKU
}

impl Default for ColumnLayout {
    fn default() -> Self {
        Self {
            order_number: 0,
            email: 1,
            financial_status: 2,
            // 明细续行的 Financial Status 为空，订单号列在部分导出中会重复填写
            order_key: 2,
            quantity: 16,
            price: 18,
            sku: 20,
        }
    }
}

impl ColumnLayout {
    /// 校验列位置（明细列互不重叠，订单标识列不落在明细列上）
    pub fn validate(&self) -> ImportResult<()> {
        let line_item_columns = [
            ("quantity", self.quantity),
            ("price", self.price),
            ("sku", self.sku),
        ];

        for (i, (name_a, col_a)) in line_item_columns.iter().enumerate() {
            for (name_b, col_b) in line_item_columns.iter().skip(i + 1) {
                if col_a == col_b {
                    return Err(ImportError::ConfigValueError {
                        key: format!("{}/{}", name_a, name_b),
                        value: col_a.to_string(),
                        message: "明细列位置重复".to_string(),
                    });
                }
            }
            if *col_a == self.order_key {
                return Err(ImportError::ConfigValueError {
                    key: "order_key".to_string(),
                    value: self.order_key.to_string(),
                    message: format!("订单标识列与明细列 {} 重叠", name_a),
                });
            }
        }

        Ok(())
    }
}

// ==========================================
// ImportOptions - 运行选项
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportOptions {
    /// 演练模式：全流程执行，结束时无条件回滚
    pub dry_run: bool,
    /// 表头行号（始终跳过）
    pub header_row_index: usize,
    /// 表中无币种时的订单币种
    pub default_currency: String,
    /// 库存跟踪（作用域 = 本次运行事务）；导入时默认关闭
    pub track_inventory_levels: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            header_row_index: 0,
            default_currency: "USD".to_string(),
            track_inventory_levels: false,
        }
    }
}
