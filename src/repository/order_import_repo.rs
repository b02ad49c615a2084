// ==========================================
// 订单表格导入系统 - 订单导入 Repository Trait
// ==========================================
// 职责: 定义导入所需的持久化能力（不包含实现）
// 红线: Repository 不含业务规则，只做数据 CRUD
// 红线: Variant / User 只读
// ==========================================

use crate::domain::{LineItem, Order, User, Variant};
use crate::repository::error::RepositoryResult;

// ==========================================
// OrderImportRepository Trait
// ==========================================
// 用途: 对账器访问持久层的唯一入口
// 实现者: SqliteOrderImportRepository（在运行事务内借用连接）
// 说明: 事务的开启/提交/回滚由 OrderImportRunner 负责，这里的所有写操作
//       都发生在调用方的事务内
pub trait OrderImportRepository {
    /// 插入订单，返回新订单 ID
    ///
    /// # 说明
    /// - number 为空时由调用方预先生成
    /// - 订单号重复返回 UniqueConstraintViolation
    fn insert_order(&self, order: &Order) -> RepositoryResult<i64>;

    /// 更新订单头（用户、状态、件数/金额合计）
    fn update_order(&self, order: &Order) -> RepositoryResult<()>;

    /// 丢弃订单（级联删除其明细），返回删除的订单行数
    fn discard_order(&self, order_id: i64) -> RepositoryResult<usize>;

    /// 插入订单明细，返回新明细 ID
    fn insert_line_item(&self, item: &LineItem) -> RepositoryResult<i64>;

    /// 按 SKU 精确查询库存单元
    fn find_variant_by_sku(&self, sku: &str) -> RepositoryResult<Option<Variant>>;

    /// 按邮箱精确查询用户
    fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;

    /// 订单总数
    fn count_orders(&self) -> RepositoryResult<i64>;

    /// 明细总数
    fn count_line_items(&self) -> RepositoryResult<i64>;
}
