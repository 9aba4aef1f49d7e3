// ==========================================
// 教务管理系统 - 导入规则层
// ==========================================
// 职责: 按导入目标定义必填字段、类型约束、表头本地化映射
// ==========================================

pub mod rules;
pub mod targets;

pub use rules::{FieldRule, FieldSpec, FieldValue, RowRule, TextCase, ValidatedFields};
pub use targets::{TargetSchema, EDUCATION_CYCLES};
