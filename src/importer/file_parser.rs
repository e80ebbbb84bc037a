// ==========================================
// 履约有效率系统 - 文件解析器实现
// ==========================================
// 阶段 0: 文件读取与解析
// 支持: Excel (.xlsx/.xls/.ods) / CSV (.csv)
// ==========================================

use crate::domain::{CellValue, RawRow, RawTable};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::order_importer_trait::FileParser;
use calamine::{open_workbook_auto, Data, DataType, Reader};
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use std::fs::File;
use std::path::Path;

const SPREADSHEET_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "ods"];

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

fn ensure_exists(path: &Path) -> ImportResult<()> {
    if !path.exists() {
        return Err(ImportError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

/// 按表头组装一行；行长不足时补空值
fn assemble_row(headers: &[String], cells: Vec<CellValue>) -> RawRow {
    let mut cells = cells.into_iter();
    headers
        .iter()
        .map(|h| (h.clone(), cells.next().unwrap_or_default()))
        .collect()
}

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if ext != "csv" {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let file = File::open(file_path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyWorkbook(file_path.display().to_string()));
        }

        // 读取所有行
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let cells = record.iter().map(CellValue::from).collect();
            let row = assemble_row(&headers, cells);

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        Ok(RawTable::new(headers, rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// calamine 单元格 → 无类型标量
    fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => CellValue::from(s.as_str()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(_) => match cell.as_datetime() {
                Some(dt) => CellValue::DateTime(dt),
                None => CellValue::Empty,
            },
            Data::DateTimeIso(s) => cell
                .as_datetime()
                .or_else(|| s.parse::<NaiveDateTime>().ok())
                .or_else(|| Self::parse_iso_date(s))
                .map(CellValue::DateTime)
                .unwrap_or_else(|| CellValue::from(s.as_str())),
            Data::DurationIso(s) => CellValue::from(s.as_str()),
        }
    }

    /// ODS 纯日期单元格（"2025-04-02"）按当日零点处理
    fn parse_iso_date(s: &str) -> Option<NaiveDateTime> {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
    }
}

impl FileParser for ExcelParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        ensure_exists(file_path)?;

        let ext = extension_of(file_path);
        if !SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            return Err(ImportError::UnsupportedFormat(ext));
        }

        let mut workbook = open_workbook_auto(file_path)?;

        // 读取第一个 sheet
        let sheet_name = workbook
            .sheet_names()
            .first()
            .cloned()
            .ok_or_else(|| ImportError::EmptyWorkbook("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 提取表头（第一行）
        let mut rows_iter = range.rows();
        let header_row = rows_iter
            .next()
            .ok_or_else(|| ImportError::EmptyWorkbook("Excel 文件无数据行".to_string()))?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| Self::convert_cell(cell).as_text())
            .collect();

        // 读取数据行
        let mut rows = Vec::new();
        for data_row in rows_iter {
            let cells = data_row.iter().map(Self::convert_cell).collect();
            let row = assemble_row(&headers, cells);

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }
            rows.push(row);
        }

        Ok(RawTable::new(headers, rows))
    }
}

// ==========================================
// 通用文件解析器（根据扩展名自动选择）
// ==========================================
pub struct UniversalFileParser;

impl FileParser for UniversalFileParser {
    fn parse_to_raw_table(&self, file_path: &Path) -> ImportResult<RawTable> {
        let ext = extension_of(file_path);

        match ext.as_str() {
            "csv" => CsvParser.parse_to_raw_table(file_path),
            e if SPREADSHEET_EXTENSIONS.contains(&e) => ExcelParser.parse_to_raw_table(file_path),
            _ => Err(ImportError::UnsupportedFormat(ext)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn csv_file(content: &str) -> tempfile::NamedTempFile {
        let mut temp_file = Builder::new().suffix(".csv").tempfile().unwrap();
        write!(temp_file, "{}", content).unwrap();
        temp_file
    }

    #[test]
    fn test_csv_parser_valid_file() {
        let temp_file = csv_file("Order #,Product name,Zip\n#ITA1,Widget,20100\nLL22,Gadget,28001\n");

        let table = CsvParser.parse_to_raw_table(temp_file.path()).unwrap();

        assert_eq!(table.headers, vec!["Order #", "Product name", "Zip"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(
            table.rows[0].get("Order #"),
            Some(&CellValue::Text("#ITA1".to_string()))
        );
        assert_eq!(
            table.rows[1].get("Zip"),
            Some(&CellValue::Text("28001".to_string()))
        );
    }

    #[test]
    fn test_csv_parser_short_rows_padded() {
        let temp_file = csv_file("Order #,Product name,Zip\n#ITA1\n");

        let table = CsvParser.parse_to_raw_table(temp_file.path()).unwrap();

        assert_eq!(table.rows.len(), 1);
        assert_eq!(table.rows[0].get("Zip"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_csv_parser_skip_empty_rows() {
        let temp_file = csv_file("Order #,Zip\n#ITA1,1\n,\n#ITA2,2\n");

        let table = CsvParser.parse_to_raw_table(temp_file.path()).unwrap();

        // 应跳过空行
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn test_csv_parser_file_not_found() {
        let result = CsvParser.parse_to_raw_table(Path::new("non_existent.csv"));
        assert!(matches!(result, Err(ImportError::FileNotFound(_))));
    }

    #[test]
    fn test_universal_parser_rejects_unknown_extension() {
        let result = UniversalFileParser.parse_to_raw_table(Path::new("report.pdf"));
        assert!(matches!(result, Err(ImportError::UnsupportedFormat(ext)) if ext == "pdf"));
    }

    #[test]
    fn test_excel_parser_corrupt_file_is_malformed() {
        let mut temp_file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        write!(temp_file, "this is not a zip archive").unwrap();

        let err = ExcelParser.parse_to_raw_table(temp_file.path()).unwrap_err();
        assert!(err.is_malformed_input());
    }

    #[test]
    fn test_convert_cell_variants() {
        assert_eq!(ExcelParser::convert_cell(&Data::Empty), CellValue::Empty);
        assert_eq!(ExcelParser::convert_cell(&Data::Int(7)), CellValue::Number(7.0));
        assert_eq!(
            ExcelParser::convert_cell(&Data::String("  ".to_string())),
            CellValue::Empty
        );
        assert_eq!(
            ExcelParser::convert_cell(&Data::DateTimeIso("2025-04-02T10:30:00".to_string())),
            CellValue::DateTime(
                NaiveDateTime::parse_from_str("2025-04-02 10:30:00", "%Y-%m-%d %H:%M:%S").unwrap()
            )
        );
    }

    #[test]
    fn test_convert_iso_date_and_fractional_seconds() {
        let midnight = NaiveDate::from_ymd_opt(2025, 4, 2)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .unwrap();
        assert_eq!(
            ExcelParser::convert_cell(&Data::DateTimeIso("2025-04-02".to_string())),
            CellValue::DateTime(midnight)
        );

        let fractional = NaiveDate::from_ymd_opt(2025, 4, 2)
            .and_then(|d| d.and_hms_milli_opt(10, 30, 0, 500))
            .unwrap();
        assert_eq!(
            ExcelParser::convert_cell(&Data::DateTimeIso("2025-04-02T10:30:00.500".to_string())),
            CellValue::DateTime(fractional)
        );

        // 非日期文本保持原样
        assert_eq!(
            ExcelParser::convert_cell(&Data::DateTimeIso("soon".to_string())),
            CellValue::Text("soon".to_string())
        );
    }
}
