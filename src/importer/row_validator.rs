// ==========================================
// 教务管理系统 - 行校验器实现
// ==========================================
// 阶段 2: 标准化行 → 候选记录 | 字段级错误列表
// 约束:
// - 同一行全部规则都执行，不在第一个违规处短路
// - 必填字段缺失只报一条 "<field> is required"，不再执行该字段其他规则
// - 校验通过后经 DataCleaner 显式清洗（TRIM / 代码转大写）再构造记录
// ==========================================

use crate::domain::import::{CandidateRecord, NormalizedRow, ValidationError};
use crate::domain::types::CellValue;
use crate::importer::data_cleaner::DataCleaner as DataCleanerImpl;
use crate::importer::importer_trait::{DataCleaner, RowValidator};
use crate::schema::{FieldRule, FieldSpec, FieldValue, RowRule, TargetSchema, ValidatedFields};
use tracing::debug;

pub struct SchemaRowValidator {
    schema: TargetSchema,
    cleaner: Box<dyn DataCleaner>,
}

impl SchemaRowValidator {
    pub fn new(schema: TargetSchema) -> Self {
        Self::with_cleaner(schema, Box::new(DataCleanerImpl))
    }

    pub fn with_cleaner(schema: TargetSchema, cleaner: Box<dyn DataCleaner>) -> Self {
        Self { schema, cleaner }
    }

    pub fn schema(&self) -> &TargetSchema {
        &self.schema
    }

    /// 校验单个字段
    ///
    /// # 返回
    /// - Ok(Some(value)): 通过，已清洗
    /// - Ok(None): 可选字段为空
    /// - Err(message): 违规描述
    fn check_field(&self, spec: &FieldSpec, cell: Option<&CellValue>) -> Result<Option<FieldValue>, String> {
        let cell = match cell.filter(|c| !c.is_empty()) {
            Some(cell) => cell,
            None if spec.required => return Err(format!("{} is required", spec.name)),
            None => return Ok(None),
        };

        let field = spec.name;
        match &spec.rule {
            FieldRule::Text { min_len } | FieldRule::Code { min_len } => {
                let raw = cell.as_text().unwrap_or_default();
                if raw.trim().chars().count() < *min_len {
                    return Err(format!("{} must be at least {} characters", field, min_len));
                }
                let cleaned = self.cleaner.clean_text(&raw, spec.rule.text_case());
                Ok(self.cleaner.normalize_null(Some(cleaned)).map(FieldValue::Text))
            }
            FieldRule::OneOf(allowed) => {
                let raw = cell.as_text().unwrap_or_default();
                let cleaned = self.cleaner.clean_text(&raw, spec.rule.text_case());
                if allowed.iter().any(|a| *a == cleaned) {
                    Ok(Some(FieldValue::Text(cleaned)))
                } else {
                    Err(format!("{} must be one of: {}", field, allowed.join(", ")))
                }
            }
            FieldRule::PositiveInt => match as_integer(cell) {
                Some(v) if v > 0 => Ok(Some(FieldValue::Int(v))),
                _ => Err(format!("{} must be a positive integer", field)),
            },
            FieldRule::IntRange { min, max } => match as_integer(cell) {
                Some(v) if v >= *min && v <= *max => Ok(Some(FieldValue::Int(v))),
                _ => Err(format!(
                    "{} must be an integer between {} and {}",
                    field, min, max
                )),
            },
            FieldRule::DecimalRange { min, max } => match cell.as_number() {
                Some(v) if v >= *min && v <= *max => Ok(Some(FieldValue::Decimal(v))),
                Some(_) => Err(format!("{} must be between {} and {}", field, min, max)),
                None => Err(format!("{} must be a number", field)),
            },
        }
    }

    /// 跨字段规则（仅在涉及字段均通过时执行）
    fn check_row_rule(&self, rule: &RowRule, fields: &ValidatedFields) -> Option<(&'static str, String)> {
        match rule {
            RowRule::LessThan { lower, upper } => {
                let low = fields.decimal(lower)?;
                let high = fields.decimal(upper)?;
                if low < high {
                    None
                } else {
                    Some((*lower, format!("{} must be less than {}", lower, upper)))
                }
            }
        }
    }
}

impl RowValidator for SchemaRowValidator {
    fn validate(&self, row: &NormalizedRow) -> Result<CandidateRecord, Vec<ValidationError>> {
        let mut errors = Vec::new();
        let mut fields = ValidatedFields::default();

        for spec in &self.schema.fields {
            match self.check_field(spec, row.get(spec.name)) {
                Ok(Some(value)) => fields.insert(spec.name, value),
                Ok(None) => {}
                Err(message) => errors.push(ValidationError::new(row.row_number, spec.name, message)),
            }
        }

        for rule in &self.schema.row_rules {
            if let Some((field, message)) = self.check_row_rule(rule, &fields) {
                errors.push(ValidationError::new(row.row_number, field, message));
            }
        }

        if !errors.is_empty() {
            debug!(
                row_number = row.row_number,
                error_count = errors.len(),
                "行校验未通过"
            );
            return Err(errors);
        }

        Ok(CandidateRecord::new(
            row.row_number,
            self.schema.build_record(&fields),
        ))
    }
}

/// 整数读取（数值必须无小数部分）
fn as_integer(cell: &CellValue) -> Option<i64> {
    cell.as_number()
        .filter(|n| n.fract() == 0.0 && n.abs() < i64::MAX as f64)
        .map(|n| n as i64)
}
