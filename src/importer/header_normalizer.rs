// ==========================================
// 教务管理系统 - 表头标准化
// ==========================================
// 阶段 1: 本地化表头 → 标准字段名
// 约束: 不会失败；未知表头原样透传，由校验器忽略或报必填缺失
// ==========================================

use crate::domain::import::{NormalizedRow, RawRow, HEADER_ROW_OFFSET};
use crate::domain::types::CellValue;
use crate::schema::TargetSchema;
use std::collections::HashMap;
use tracing::debug;

pub struct HeaderNormalizer;

impl HeaderNormalizer {
    /// 标准化全部原始行，row_number = 序号 + 2
    pub fn normalize(&self, schema: &TargetSchema, raw_rows: Vec<RawRow>) -> Vec<NormalizedRow> {
        raw_rows
            .into_iter()
            .enumerate()
            .map(|(idx, raw)| self.normalize_row(schema, raw, idx + HEADER_ROW_OFFSET))
            .collect()
    }

    fn normalize_row(&self, schema: &TargetSchema, raw: RawRow, row_number: usize) -> NormalizedRow {
        let mut values: HashMap<String, CellValue> = HashMap::new();

        for (header, value) in raw.cells {
            let field = match schema.canonical_field(&header) {
                Some(field) => field.to_string(),
                None => header.trim().to_string(),
            };

            // 多列映射到同一字段时，取第一个非空值
            match values.get(&field) {
                Some(existing) if !existing.is_empty() => {
                    debug!(row_number, field = %field, header = %header, "重复映射列已忽略");
                }
                _ => {
                    values.insert(field, value);
                }
            }
        }

        NormalizedRow::new(row_number, values)
    }
}
