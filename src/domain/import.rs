// ==========================================
// 教务管理系统 - 导入管道数据模型
// ==========================================
// 职责: 原始行 / 标准化行 / 校验错误 / 候选记录 / 导入结果
// ==========================================

use crate::domain::records::ImportRecord;
use crate::domain::types::{CellValue, ImportTarget};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// 非字段级错误使用的字段名
pub const GENERAL_FIELD: &str = "general";

/// 表头行占用第 1 行，首个数据行为第 2 行
pub const HEADER_ROW_OFFSET: usize = 2;

// ==========================================
// RawRow - 原始行（表头 → 单元格，保持列顺序）
// ==========================================
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawRow {
    pub cells: Vec<(String, CellValue)>,
}

impl RawRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, header: impl Into<String>, value: CellValue) {
        self.cells.push((header.into(), value));
    }

    pub fn get(&self, header: &str) -> Option<&CellValue> {
        self.cells
            .iter()
            .find(|(h, _)| h == header)
            .map(|(_, v)| v)
    }

    /// 整行为空（所有单元格为空）
    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|(_, v)| v.is_empty())
    }
}

impl<S: Into<String>> FromIterator<(S, CellValue)> for RawRow {
    fn from_iter<I: IntoIterator<Item = (S, CellValue)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().map(|(h, v)| (h.into(), v)).collect(),
        }
    }
}

// ==========================================
// NormalizedRow - 标准化行（标准字段名 → 单元格）
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedRow {
    pub row_number: usize,
    values: HashMap<String, CellValue>,
}

impl NormalizedRow {
    pub fn new(row_number: usize, values: HashMap<String, CellValue>) -> Self {
        Self { row_number, values }
    }

    pub fn get(&self, field: &str) -> Option<&CellValue> {
        self.values.get(field)
    }
}

// ==========================================
// ValidationError - 行级 / 字段级错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row_number: usize,
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(row_number: usize, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            row_number,
            field: field.into(),
            message: message.into(),
        }
    }

    /// 非字段级错误（批次失败 / 文件不可读 / 取消）
    pub fn general(row_number: usize, message: impl Into<String>) -> Self {
        Self::new(row_number, GENERAL_FIELD, message)
    }
}

// ==========================================
// CandidateRecord - 通过全部字段校验的候选记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    pub row_number: usize,
    pub record: ImportRecord,
}

impl CandidateRecord {
    pub fn new(row_number: usize, record: ImportRecord) -> Self {
        Self { row_number, record }
    }

    pub fn key(&self) -> &str {
        self.record.key()
    }
}

// ==========================================
// StageOutcome - 去重 / 冲突检查阶段输出
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutcome {
    pub valid: Vec<CandidateRecord>,
    pub errors: Vec<ValidationError>,
}

// ==========================================
// ImportPreview - 仅校验结果（未落库）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportPreview {
    pub target: ImportTarget,
    pub valid: Vec<CandidateRecord>,
    pub errors: Vec<ValidationError>,
    pub total_rows: usize,
}

impl ImportPreview {
    /// 错误涉及的行号（去重）
    pub fn rows_with_errors(&self) -> BTreeSet<usize> {
        distinct_rows(&self.errors)
    }
}

// ==========================================
// ImportResult - 完整导入结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportResult {
    pub import_id: String,
    pub target: ImportTarget,
    pub success: bool,
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<ValidationError>,
}

// ==========================================
// ImportBatchRecord - 导入批次审计记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatchRecord {
    pub import_id: String,
    pub target: ImportTarget,
    pub total_rows: usize,
    pub imported: usize,
    pub skipped: usize,
    pub error_count: usize,
    pub success: bool,
    pub elapsed_ms: i64,
    pub imported_at: DateTime<Utc>,
    pub errors_json: String,
}

/// 错误列表按行号稳定排序（同一行内保持产生顺序）
pub fn sort_errors(errors: &mut [ValidationError]) {
    errors.sort_by_key(|e| e.row_number);
}

pub fn distinct_rows(errors: &[ValidationError]) -> BTreeSet<usize> {
    errors.iter().map(|e| e.row_number).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_row_blank() {
        let row: RawRow = vec![
            ("Code", CellValue::Empty),
            ("Nom", CellValue::Text("  ".to_string())),
        ]
        .into_iter()
        .collect();

        assert!(row.is_blank());
    }

    #[test]
    fn test_sort_errors_stable() {
        let mut errors = vec![
            ValidationError::new(5, "code", "b"),
            ValidationError::new(3, "name", "a1"),
            ValidationError::new(3, "code", "a2"),
        ];
        sort_errors(&mut errors);

        assert_eq!(errors[0].message, "a1");
        assert_eq!(errors[1].message, "a2");
        assert_eq!(errors[2].row_number, 5);
    }
}
