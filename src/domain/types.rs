// ==========================================
// 订单表格导入系统 - 领域类型定义
// ==========================================
// 职责: 表格行（按列位置寻址）及通用类型
// 红线: 列位置固定，由 ColumnLayout 决定，不做自动识别
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 表格行号（0 基，与读取器返回的物理行顺序一致）
pub type RowIndex = usize;

// ==========================================
// Row - 表格物理行
// ==========================================
// 用途: 读取器输出 → 对账器输入
// 约定: 单元格已 trim，空字符串统一为 None
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    cells: Vec<Option<String>>,
}

impl Row {
    pub fn new(cells: Vec<Option<String>>) -> Self {
        let cells = cells
            .into_iter()
            .map(|c| c.and_then(normalize_cell))
            .collect();
        Self { cells }
    }

    /// 从字符串切片构造（空串视为空单元格），主要供测试与 CSV 读取使用
    pub fn from_strs<S: AsRef<str>>(values: &[S]) -> Self {
        Self::new(
            values
                .iter()
                .map(|v| Some(v.as_ref().to_string()))
                .collect(),
        )
    }

    /// 读取指定列（越界或空单元格返回 None）
    pub fn cell(&self, column: usize) -> Option<&str> {
        self.cells.get(column).and_then(|c| c.as_deref())
    }

    /// 指定列是否为空（越界视为空）
    pub fn is_blank_at(&self, column: usize) -> bool {
        self.cell(column).is_none()
    }

    /// 整行是否为空（无单元格或所有单元格为空）
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_none())
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// 遍历 (列号, 非空值)
    pub fn filled_cells(&self) -> impl Iterator<Item = (usize, &str)> {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| c.as_deref().map(|v| (idx, v)))
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self
            .cells
            .iter()
            .map(|c| c.as_deref().unwrap_or(""))
            .collect();
        write!(f, "[{}]", parts.join(", "))
    }
}

fn normalize_cell(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
