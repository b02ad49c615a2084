// ==========================================
// 订单表格导入系统 - 订单领域模型
// ==========================================
// 职责: Order / LineItem 实体及其校验规则
// 红线: LineItem 数量必须 > 0 才允许落库
// 红线: Order 独占其 LineItem 集合（插入顺序 = 行顺序）
// ==========================================

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ==========================================
// FinancialStatus - 支付状态
// ==========================================
// 来源: 导出表 Financial Status 列（小写 snake_case）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FinancialStatus {
    Pending,
    Authorized,
    Paid,
    PartiallyPaid,
    Refunded,
    PartiallyRefunded,
    Voided,
    Other(String),
}

impl FinancialStatus {
    /// 解析导出表中的状态文本（大小写、空格不敏感）
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "pending" => FinancialStatus::Pending,
            "authorized" => FinancialStatus::Authorized,
            "paid" => FinancialStatus::Paid,
            "partially_paid" => FinancialStatus::PartiallyPaid,
            "refunded" => FinancialStatus::Refunded,
            "partially_refunded" => FinancialStatus::PartiallyRefunded,
            "voided" => FinancialStatus::Voided,
            _ => FinancialStatus::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FinancialStatus::Pending => "pending",
            FinancialStatus::Authorized => "authorized",
            FinancialStatus::Paid => "paid",
            FinancialStatus::PartiallyPaid => "partially_paid",
            FinancialStatus::Refunded => "refunded",
            FinancialStatus::PartiallyRefunded => "partially_refunded",
            FinancialStatus::Voided => "voided",
            FinancialStatus::Other(raw) => raw.as_str(),
        }
    }

    /// 是否已发生过付款（决定订单是否视为已完成）
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            FinancialStatus::Authorized
                | FinancialStatus::Paid
                | FinancialStatus::PartiallyPaid
                | FinancialStatus::Refunded
                | FinancialStatus::PartiallyRefunded
        )
    }
}

impl fmt::Display for FinancialStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// OrderState - 订单状态
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderState {
    Cart,     // 未付款
    Complete, // 已付款/已完成
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Cart => "CART",
            OrderState::Complete => "COMPLETE",
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// Order - 订单
// ==========================================
// 生命周期: 构造 → 表头行字段填充 → 续行追加明细 → 保存
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Option<i64>,                       // 落库后回填
    pub number: Option<String>,                // 订单号（导出表 Name 列，如 #1001）
    pub email: Option<String>,                 // 下单邮箱
    pub user_id: Option<i64>,                  // 关联用户（按邮箱匹配，可为空）
    pub currency: String,                      // 币种（明细继承）
    pub financial_status: Option<FinancialStatus>,
    pub fulfillment_status: Option<String>,
    pub total: Option<Decimal>,                // 导出表订单总额（仅记录）
    pub placed_at: Option<DateTime<Utc>>,      // 下单时间
    pub line_items: Vec<LineItem>,             // 已落库明细（行顺序）
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// 创建空订单
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            id: None,
            number: None,
            email: None,
            user_id: None,
            currency: currency.into(),
            financial_status: None,
            fulfillment_status: None,
            total: None,
            placed_at: None,
            line_items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    pub fn state(&self) -> OrderState {
        match &self.financial_status {
            Some(status) if status.is_settled() => OrderState::Complete,
            _ => OrderState::Cart,
        }
    }

    /// 明细件数合计
    pub fn item_count(&self) -> i64 {
        self.line_items.iter().map(|li| li.quantity).sum()
    }

    /// 明细金额合计（单价 × 数量）
    pub fn item_total(&self) -> Decimal {
        self.line_items.iter().map(LineItem::amount).sum()
    }

    /// 订单号缺失时生成（R + 9 位数字）
    pub fn ensure_number(&mut self) -> &str {
        self.number.get_or_insert_with(generate_order_number)
    }

    /// 日志展示用标识
    pub fn label(&self) -> String {
        match (&self.number, self.id) {
            (Some(number), Some(id)) => format!("{} ({})", number, id),
            (Some(number), None) => number.clone(),
            (None, Some(id)) => format!("({})", id),
            (None, None) => "<new>".to_string(),
        }
    }
}

/// 生成订单号: R + 9 位数字（取自 UUID v4）
pub fn generate_order_number() -> String {
    let n = Uuid::new_v4().as_u128() % 1_000_000_000;
    format!("R{:09}", n)
}

// ==========================================
// LineItem - 订单明细
// ==========================================
// 红线: quantity <= 0 的明细不构造、不落库
// 说明: 构造与落库是两个独立步骤，校验失败的明细永不提交
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub id: Option<i64>,
    pub order_id: Option<i64>, // 所属订单
    pub variant_id: i64,       // 已解析的库存单元
    pub sku: String,
    pub quantity: i64,
    pub price: Option<Decimal>, // 单价（解析失败为 None，校验不通过）
    pub currency: String,       // 继承自订单
}

impl LineItem {
    pub fn amount(&self) -> Decimal {
        self.price.unwrap_or_default() * Decimal::from(self.quantity)
    }

    /// 校验明细，返回全部错误信息（空 = 通过）
    pub fn validation_errors(&self, order: &Order) -> Vec<String> {
        let mut errors = Vec::new();

        if self.quantity <= 0 {
            errors.push(format!("quantity 必须大于 0，实际 {}", self.quantity));
        }

        match self.price {
            None => errors.push("price 缺失（且无目录价）或无法解析".to_string()),
            Some(p) if p.is_sign_negative() => errors.push(format!("price 不能为负数: {}", p)),
            Some(_) => {}
        }

        if self.currency.trim().is_empty() {
            errors.push("currency 不能为空".to_string());
        } else if self.currency != order.currency {
            errors.push(format!(
                "currency 与订单不一致: {} != {}",
                self.currency, order.currency
            ));
        }

        if self.order_id.is_none() || self.order_id != order.id {
            errors.push("order 未落库或不匹配".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn persisted_order() -> Order {
        let mut order = Order::new("USD");
        order.id = Some(7);
        order
    }

    fn item(order: &Order, quantity: i64, price: Option<&str>) -> LineItem {
        LineItem {
            id: None,
            order_id: order.id,
            variant_id: 1,
            sku: "A1".to_string(),
            quantity,
            price: price.map(|p| Decimal::from_str(p).unwrap()),
            currency: order.currency.clone(),
        }
    }

    #[test]
    fn test_financial_status_parse() {
        assert_eq!(FinancialStatus::parse("Paid"), FinancialStatus::Paid);
        assert_eq!(
            FinancialStatus::parse("partially refunded"),
            FinancialStatus::PartiallyRefunded
        );
        assert_eq!(
            FinancialStatus::parse("on-hold"),
            FinancialStatus::Other("on-hold".to_string())
        );
    }

    #[test]
    fn test_order_state_follows_financial_status() {
        let mut order = Order::new("USD");
        assert_eq!(order.state(), OrderState::Cart);

        order.financial_status = Some(FinancialStatus::Paid);
        assert_eq!(order.state(), OrderState::Complete);

        order.financial_status = Some(FinancialStatus::Voided);
        assert_eq!(order.state(), OrderState::Cart);
    }

    #[test]
    fn test_order_totals() {
        let mut order = persisted_order();
        order.line_items.push(item(&order, 2, Some("10.00")));
        order.line_items.push(item(&order, 1, Some("4.50")));

        assert_eq!(order.item_count(), 3);
        assert_eq!(order.item_total(), Decimal::from_str("24.50").unwrap());
    }

    #[test]
    fn test_ensure_number_keeps_existing() {
        let mut order = Order::new("USD");
        order.number = Some("#1001".to_string());
        assert_eq!(order.ensure_number(), "#1001");

        let mut blank = Order::new("USD");
        let generated = blank.ensure_number().to_string();
        assert!(generated.starts_with('R'));
        assert_eq!(generated.len(), 10);
    }

    #[test]
    fn test_line_item_validation() {
        let order = persisted_order();

        assert!(item(&order, 1, Some("3.00")).validation_errors(&order).is_empty());
        assert_eq!(item(&order, 1, None).validation_errors(&order).len(), 1);
        assert_eq!(item(&order, 1, Some("-1")).validation_errors(&order).len(), 1);

        let mut wrong_currency = item(&order, 1, Some("3.00"));
        wrong_currency.currency = "EUR".to_string();
        assert_eq!(wrong_currency.validation_errors(&order).len(), 1);

        let unsaved = Order::new("USD");
        assert!(!item(&unsaved, 1, Some("3.00"))
            .validation_errors(&unsaved)
            .is_empty());
    }
}
