// ==========================================
// 订单表格导入系统 - 库存单元解析
// ==========================================
// 规则: SKU 精确匹配，无模糊匹配/回退
// 约束: 只读查询
// ==========================================

use crate::domain::Variant;
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::OrderImportRepository;
use tracing::debug;

pub struct InventoryResolver<'r, R: OrderImportRepository> {
    repo: &'r R,
}

impl<'r, R: OrderImportRepository> InventoryResolver<'r, R> {
    pub fn new(repo: &'r R) -> Self {
        Self { repo }
    }

    /// 按 SKU 解析库存单元
    ///
    /// # 错误
    /// - VariantNotFound: 无匹配（含 SKU 为空）
    /// - Storage: 查询失败（致命）
    pub fn resolve(&self, sku: &str) -> ImportResult<Variant> {
        if sku.is_empty() {
            return Err(ImportError::VariantNotFound { sku: String::new() });
        }

        match self.repo.find_variant_by_sku(sku)? {
            Some(variant) => {
                debug!(sku = %variant.sku, name = ?variant.name, "找到库存单元");
                Ok(variant)
            }
            None => Err(ImportError::VariantNotFound {
                sku: sku.to_string(),
            }),
        }
    }
}
