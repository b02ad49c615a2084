// ==========================================
// 订单表格导入系统 - 外部只读实体
// ==========================================
// 职责: Variant（库存单元）/ User（下单用户）
// 红线: 导入器只读，不调整库存、不创建用户
// ==========================================

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ==========================================
// Variant - 库存单元（按 SKU 精确匹配）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    pub id: i64,
    pub sku: String,
    pub name: Option<String>,
    pub price: Option<Decimal>, // 目录价（明细单价为空时使用）
    pub count_on_hand: i64,     // 当前库存（仅在开启库存跟踪时参与校验）
}

// ==========================================
// User - 用户（按邮箱精确匹配）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
}
