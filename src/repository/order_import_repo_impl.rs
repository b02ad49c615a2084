// ==========================================
// 订单表格导入系统 - 订单导入 Repository 实现
// ==========================================
// 职责: 实现导入相关数据访问（使用 rusqlite）
// 说明: 借用调用方的连接（通常是 Transaction 解引用得到的 Connection），
//       因此所有写入都落在同一个运行事务内
// ==========================================

use crate::domain::{LineItem, Order, User, Variant};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::order_import_repo::OrderImportRepository;
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::str::FromStr;

fn parse_decimal_column(field: &str, raw: Option<String>) -> RepositoryResult<Option<Decimal>> {
    match raw {
        None => Ok(None),
        Some(v) => Decimal::from_str(&v)
            .map(Some)
            .map_err(|e| RepositoryError::FieldValueError {
                field: field.to_string(),
                message: format!("无法解析金额 {}: {}", v, e),
            }),
    }
}

// ==========================================
// SqliteOrderImportRepository
// ==========================================
pub struct SqliteOrderImportRepository<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteOrderImportRepository<'c> {
    /// 基于已有连接（或事务）创建 Repository
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }
}

impl OrderImportRepository for SqliteOrderImportRepository<'_> {
    fn insert_order(&self, order: &Order) -> RepositoryResult<i64> {
        let number = order.number.as_deref().ok_or_else(|| RepositoryError::FieldValueError {
            field: "number".to_string(),
            message: "订单号为空".to_string(),
        })?;

        self.conn.execute(
            r#"
            INSERT INTO orders (
                number, email, user_id, currency, financial_status, fulfillment_status,
                state, item_count, item_total, total, placed_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
            params![
                number,
                order.email,
                order.user_id,
                order.currency,
                order.financial_status.as_ref().map(|s| s.as_str().to_string()),
                order.fulfillment_status,
                order.state().as_str(),
                order.item_count(),
                order.item_total().to_string(),
                order.total.map(|t| t.to_string()),
                order.placed_at,
                order.created_at,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn update_order(&self, order: &Order) -> RepositoryResult<()> {
        let id = order.id.ok_or_else(|| RepositoryError::NotFound {
            entity: "Order".to_string(),
            id: order.label(),
        })?;

        let affected = self.conn.execute(
            r#"
            UPDATE orders
               SET user_id = ?1, state = ?2, item_count = ?3, item_total = ?4
             WHERE id = ?5
            "#,
            params![
                order.user_id,
                order.state().as_str(),
                order.item_count(),
                order.item_total().to_string(),
                id,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "Order".to_string(),
                id: id.to_string(),
            });
        }
        Ok(())
    }

    fn discard_order(&self, order_id: i64) -> RepositoryResult<usize> {
        // line_items 通过 ON DELETE CASCADE 级联删除
        let affected = self
            .conn
            .execute("DELETE FROM orders WHERE id = ?1", params![order_id])?;
        Ok(affected)
    }

    fn insert_line_item(&self, item: &LineItem) -> RepositoryResult<i64> {
        let order_id = item.order_id.ok_or_else(|| RepositoryError::FieldValueError {
            field: "order_id".to_string(),
            message: "明细未关联已落库订单".to_string(),
        })?;
        let price = item.price.ok_or_else(|| RepositoryError::FieldValueError {
            field: "price".to_string(),
            message: "明细单价为空".to_string(),
        })?;

        self.conn.execute(
            r#"
            INSERT INTO line_items (order_id, variant_id, quantity, price, currency)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                order_id,
                item.variant_id,
                item.quantity,
                price.to_string(),
                item.currency,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    fn find_variant_by_sku(&self, sku: &str) -> RepositoryResult<Option<Variant>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, sku, name, price, count_on_hand FROM variants WHERE sku = ?1",
                params![sku],
                |row| {
                    Ok((
                        row.get::<_, i64>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, Option<String>>(2)?,
                        row.get::<_, Option<String>>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?;

        match row {
            None => Ok(None),
            Some((id, sku, name, price, count_on_hand)) => Ok(Some(Variant {
                id,
                sku,
                name,
                price: parse_decimal_column("variants.price", price)?,
                count_on_hand,
            })),
        }
    }

    fn find_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let user = self
            .conn
            .query_row(
                "SELECT id, email FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(User {
                        id: row.get(0)?,
                        email: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(user)
    }

    fn count_orders(&self) -> RepositoryResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM orders", [], |row| row.get(0))?)
    }

    fn count_line_items(&self) -> RepositoryResult<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM line_items", [], |row| row.get(0))?)
    }
}
