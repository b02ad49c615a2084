// ==========================================
// 订单表格导入系统 - 表格读取器实现
// ==========================================
// 支持: Excel (.xlsx/.xlsm/.xls/.ods) / CSV (.csv)
// 输出: 按物理顺序的定位行（含表头行、保留空行）
// 说明: 空行必须保留，对账器依赖首个空行判定数据结束
// ==========================================

use crate::domain::Row;
use crate::importer::error::{ImportError, ImportResult};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;
use tracing::debug;

// ==========================================
// SheetReader Trait
// ==========================================
pub trait SheetReader {
    /// 读取第一个工作表的全部行
    fn read_rows(&self, file_path: &Path) -> ImportResult<Vec<Row>>;
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvSheetReader;

impl SheetReader for CsvSheetReader {
    fn read_rows(&self, file_path: &Path) -> ImportResult<Vec<Row>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false) // 表头行由 header_row_index 决定，按普通行读出
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            rows.push(Row::new(
                record.iter().map(|v| Some(v.to_string())).collect(),
            ));
        }

        debug!(file = %file_path.display(), rows = rows.len(), "CSV 读取完成");
        Ok(rows)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelSheetReader;

impl SheetReader for ExcelSheetReader {
    fn read_rows(&self, file_path: &Path) -> ImportResult<Vec<Row>> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !matches!(ext.as_str(), "xlsx" | "xlsm" | "xls" | "ods") {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;

        // calamine 的 Range 从第一个非空单元格开始，需要补齐前导空行/空列以保持列位置
        let (start_row, start_col) = range.start().unwrap_or((0, 0));
        let mut rows: Vec<Row> = (0..start_row).map(|_| Row::default()).collect();

        for data_row in range.rows() {
            let mut cells: Vec<Option<String>> = vec![None; start_col as usize];
            cells.extend(data_row.iter().map(cell_to_string));
            rows.push(Row::new(cells));
        }

        debug!(
            file = %file_path.display(),
            sheet = %sheet_name,
            rows = rows.len(),
            "Excel 读取完成"
        );
        Ok(rows)
    }
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        other => Some(other.to_string()),
    }
}

// ==========================================
// 通用读取器（根据扩展名自动选择）
// ==========================================
pub struct UniversalSheetReader;

impl SheetReader for UniversalSheetReader {
    fn read_rows(&self, file_path: &Path) -> ImportResult<Vec<Row>> {
        match extension_of(file_path).as_str() {
            "csv" => CsvSheetReader.read_rows(file_path),
            "xlsx" | "xlsm" | "xls" | "ods" => ExcelSheetReader.read_rows(file_path),
            other => Err(ImportError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(lines: &[&str]) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        for line in lines {
            writeln!(temp_file, "{}", line).unwrap();
        }
        temp_file
    }

    #[test]
    fn test_csv_reader_keeps_header_and_positions() {
        let temp_file = csv_file(&["Name,Email,Financial Status", "#1001,a@x.com,paid", ",,"]);

        let rows = CsvSheetReader.read_rows(temp_file.path()).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].cell(2), Some("Financial Status"));
        assert_eq!(rows[1].cell(0), Some("#1001"));
        assert!(rows[2].is_blank());
    }

    #[test]
    fn test_csv_reader_flexible_row_lengths() {
        let temp_file = csv_file(&["a,b,c", "1", "1,2,3,4"]);

        let rows = CsvSheetReader.read_rows(temp_file.path()).unwrap();

        assert_eq!(rows[1].len(), 1);
        assert_eq!(rows[2].cell(3), Some("4"));
    }

    #[test]
    fn test_reader_file_not_found() {
        let result = CsvSheetReader.read_rows(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_reader_rejects_unknown_extension() {
        let temp_file = Builder::new().suffix(".txt").tempfile().unwrap();
        let result = UniversalSheetReader.read_rows(temp_file.path());
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_cell_to_string() {
        assert_eq!(cell_to_string(&Data::Empty), None);
        assert_eq!(cell_to_string(&Data::String("A1".to_string())), Some("A1".to_string()));
        assert_eq!(cell_to_string(&Data::Int(2)), Some("2".to_string()));
    }
}
