// ==========================================
// 教务管理系统 - 表格读取器实现
// ==========================================
// 阶段 0: 上传字节流 → 原始行
// 支持: Excel (.xlsx/.xls，仅第一个工作表) / CSV (.csv)
// 约束: 只做结构提取，不做内容校验
// ==========================================

use crate::domain::import::RawRow;
use crate::domain::types::CellValue;
use crate::importer::error::{ImportError, ImportOutcome};
use crate::importer::importer_trait::SheetReader;
use calamine::{Data, Range, Reader, Xls, Xlsx};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};
use std::io::{Cursor, Read, Seek};
use std::path::Path;

// ==========================================
// SheetFormat - 上传文件格式
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SheetFormat {
    Xlsx,
    Xls,
    Csv,
}

impl SheetFormat {
    /// 按文件扩展名识别格式
    pub fn from_file_name(file_name: &str) -> ImportOutcome<Self> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "xlsx" | "xlsm" => Ok(SheetFormat::Xlsx),
            "xls" => Ok(SheetFormat::Xls),
            "csv" => Ok(SheetFormat::Csv),
            _ => Err(ImportError::UnsupportedFormat(if ext.is_empty() {
                file_name.to_string()
            } else {
                ext
            })),
        }
    }
}

// ==========================================
// CSV Reader 实现
// ==========================================
pub struct CsvSheetReader;

impl CsvSheetReader {
    /// 法语环境导出的 CSV 常用分号分隔
    fn detect_delimiter(text: &str) -> u8 {
        let first_line = text.lines().next().unwrap_or("");
        let semicolons = first_line.matches(';').count();
        let commas = first_line.matches(',').count();
        if semicolons > commas {
            b';'
        } else {
            b','
        }
    }
}

impl SheetReader for CsvSheetReader {
    fn parse_to_raw_rows(&self, bytes: &[u8]) -> ImportOutcome<Vec<RawRow>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| ImportError::CsvParseError(format!("not valid UTF-8: {}", e)))?;
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);

        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .delimiter(Self::detect_delimiter(text))
            .from_reader(text.as_bytes());

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptySheet);
        }

        // 读取所有行
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row = RawRow::new();

            for (col_idx, value) in record.iter().enumerate() {
                if let Some(header) = headers.get(col_idx).filter(|h| !h.is_empty()) {
                    let value = value.trim();
                    let cell = if value.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(value.to_string())
                    };
                    row.push(header.clone(), cell);
                }
            }

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }

            rows.push(row);
        }

        Ok(rows)
    }
}

// ==========================================
// Excel Reader 实现
// ==========================================
pub struct ExcelSheetReader {
    format: SheetFormat,
}

impl ExcelSheetReader {
    pub fn xlsx() -> Self {
        Self {
            format: SheetFormat::Xlsx,
        }
    }

    pub fn xls() -> Self {
        Self {
            format: SheetFormat::Xls,
        }
    }

    fn first_sheet<RS, R>(workbook: &mut R) -> ImportOutcome<Range<Data>>
    where
        RS: Read + Seek,
        R: Reader<RS>,
        R::Error: std::fmt::Display,
    {
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("workbook has no sheets".to_string()))?;

        workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))
    }

    fn to_cell_value(cell: &Data) -> CellValue {
        match cell {
            Data::Empty => CellValue::Empty,
            Data::String(s) if s.trim().is_empty() => CellValue::Empty,
            Data::String(s) => CellValue::Text(s.trim().to_string()),
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            other => CellValue::Text(other.to_string()),
        }
    }

    fn range_to_rows(range: &Range<Data>) -> ImportOutcome<Vec<RawRow>> {
        // 提取表头（第一行）
        let mut rows = range.rows();
        let header_row = rows.next().ok_or(ImportError::EmptySheet)?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| cell.to_string().trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptySheet);
        }

        // 读取数据行
        let mut records = Vec::new();
        for data_row in rows {
            let mut row = RawRow::new();

            for (col_idx, cell) in data_row.iter().enumerate() {
                if let Some(header) = headers.get(col_idx).filter(|h| !h.is_empty()) {
                    row.push(header.clone(), Self::to_cell_value(cell));
                }
            }

            // 跳过完全空白的行
            if row.is_blank() {
                continue;
            }

            records.push(row);
        }

        Ok(records)
    }
}

impl SheetReader for ExcelSheetReader {
    fn parse_to_raw_rows(&self, bytes: &[u8]) -> ImportOutcome<Vec<RawRow>> {
        let cursor = Cursor::new(bytes);

        let range = match self.format {
            SheetFormat::Xls => {
                let mut workbook: Xls<_> = Xls::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                Self::first_sheet(&mut workbook)?
            }
            _ => {
                let mut workbook: Xlsx<_> = Xlsx::new(cursor)
                    .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;
                Self::first_sheet(&mut workbook)?
            }
        };

        Self::range_to_rows(&range)
    }
}

// ==========================================
// 通用读取器（按格式分派）
// ==========================================
pub struct UniversalSheetReader;

impl UniversalSheetReader {
    pub fn parse(&self, bytes: &[u8], format: SheetFormat) -> ImportOutcome<Vec<RawRow>> {
        match format {
            SheetFormat::Csv => CsvSheetReader.parse_to_raw_rows(bytes),
            SheetFormat::Xlsx => ExcelSheetReader::xlsx().parse_to_raw_rows(bytes),
            SheetFormat::Xls => ExcelSheetReader::xls().parse_to_raw_rows(bytes),
        }
    }
}
