// ==========================================
// 教务管理系统 - 基础数据记录
// ==========================================
// 职责: 每个导入目标的强类型记录（封闭联合类型）
// ==========================================

use crate::domain::types::ImportTarget;
use rusqlite::types::Value;
use serde::{Deserialize, Serialize};

// ==========================================
// AcademicLevel - 学业层次
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcademicLevel {
    pub name: String,
    pub code: String,
    pub education_cycle: String,
    pub duration_years: i64,
    pub semesters: i64,
    pub order_index: i64,
    pub description: Option<String>,
}

// ==========================================
// Subject - 课程
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub name: String,
    pub code: String,
    pub coefficient: f64,
    pub credits_ects: i64,
    pub hours_total: Option<i64>,
    pub semester: Option<i64>,
    pub level_code: Option<String>,
}

// ==========================================
// Grade - 成绩等级（评分区间）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grade {
    pub name: String,
    pub code: String,
    pub min_score: f64,
    pub max_score: f64,
    pub grade_points: Option<f64>,
}

// ==========================================
// ImportRecord - 导入记录联合类型
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "target", rename_all = "snake_case")]
pub enum ImportRecord {
    AcademicLevel(AcademicLevel),
    Subject(Subject),
    Grade(Grade),
}

impl ImportRecord {
    pub fn target(&self) -> ImportTarget {
        match self {
            ImportRecord::AcademicLevel(_) => ImportTarget::AcademicLevel,
            ImportRecord::Subject(_) => ImportTarget::Subject,
            ImportRecord::Grade(_) => ImportTarget::Grade,
        }
    }

    /// 唯一键（三类目标均为 code）
    pub fn key(&self) -> &str {
        match self {
            ImportRecord::AcademicLevel(r) => &r.code,
            ImportRecord::Subject(r) => &r.code,
            ImportRecord::Grade(r) => &r.code,
        }
    }

    /// 落库列（列名, 值），顺序与表结构一致
    pub fn to_columns(&self) -> Vec<(&'static str, Value)> {
        match self {
            ImportRecord::AcademicLevel(r) => vec![
                ("name", Value::Text(r.name.clone())),
                ("code", Value::Text(r.code.clone())),
                ("education_cycle", Value::Text(r.education_cycle.clone())),
                ("duration_years", Value::Integer(r.duration_years)),
                ("semesters", Value::Integer(r.semesters)),
                ("order_index", Value::Integer(r.order_index)),
                ("description", opt_text(&r.description)),
            ],
            ImportRecord::Subject(r) => vec![
                ("name", Value::Text(r.name.clone())),
                ("code", Value::Text(r.code.clone())),
                ("coefficient", Value::Real(r.coefficient)),
                ("credits_ects", Value::Integer(r.credits_ects)),
                ("hours_total", opt_int(r.hours_total)),
                ("semester", opt_int(r.semester)),
                ("level_code", opt_text(&r.level_code)),
            ],
            ImportRecord::Grade(r) => vec![
                ("name", Value::Text(r.name.clone())),
                ("code", Value::Text(r.code.clone())),
                ("min_score", Value::Real(r.min_score)),
                ("max_score", Value::Real(r.max_score)),
                ("grade_points", r.grade_points.map(Value::Real).unwrap_or(Value::Null)),
            ],
        }
    }
}

fn opt_text(value: &Option<String>) -> Value {
    value.clone().map(Value::Text).unwrap_or(Value::Null)
}

fn opt_int(value: Option<i64>) -> Value {
    value.map(Value::Integer).unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_key_and_target() {
        let record = ImportRecord::Grade(Grade {
            name: "Très bien".to_string(),
            code: "TB".to_string(),
            min_score: 16.0,
            max_score: 20.0,
            grade_points: None,
        });

        assert_eq!(record.key(), "TB");
        assert_eq!(record.target(), ImportTarget::Grade);
    }

    #[test]
    fn test_to_columns_optional_null() {
        let record = ImportRecord::Subject(Subject {
            name: "Algèbre".to_string(),
            code: "MATH101".to_string(),
            coefficient: 2.0,
            credits_ects: 6,
            hours_total: None,
            semester: Some(1),
            level_code: None,
        });

        let columns = record.to_columns();
        assert_eq!(columns.len(), 7);
        assert_eq!(columns[4], ("hours_total", Value::Null));
        assert_eq!(columns[5], ("semester", Value::Integer(1)));
    }
}
