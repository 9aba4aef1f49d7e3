// ==========================================
// 教务管理系统 - 声明式校验规则
// ==========================================
// 职责: 字段规则 / 行级规则 / 校验后的字段值
// ==========================================

use std::collections::HashMap;

// ==========================================
// FieldRule - 字段类型与取值约束
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum FieldRule {
    /// 文本（去空白后长度 >= min_len）
    Text { min_len: usize },
    /// 代码类文本（长度约束同 Text，清洗时转大写）
    Code { min_len: usize },
    /// 枚举值（大小写不敏感，清洗时转小写）
    OneOf(&'static [&'static str]),
    /// 正整数
    PositiveInt,
    /// 整数闭区间
    IntRange { min: i64, max: i64 },
    /// 数值闭区间
    DecimalRange { min: f64, max: f64 },
}

// ==========================================
// TextCase - 文本清洗口径
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextCase {
    Keep,
    Upper,
    Lower,
}

impl FieldRule {
    pub fn text_case(&self) -> TextCase {
        match self {
            FieldRule::Code { .. } => TextCase::Upper,
            FieldRule::OneOf(_) => TextCase::Lower,
            _ => TextCase::Keep,
        }
    }
}

// ==========================================
// FieldSpec - 单字段定义
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub required: bool,
    pub rule: FieldRule,
}

impl FieldSpec {
    pub fn required(name: &'static str, rule: FieldRule) -> Self {
        Self {
            name,
            required: true,
            rule,
        }
    }

    pub fn optional(name: &'static str, rule: FieldRule) -> Self {
        Self {
            name,
            required: false,
            rule,
        }
    }
}

// ==========================================
// RowRule - 跨字段规则
// ==========================================
// 仅在涉及字段各自通过校验后执行
#[derive(Debug, Clone, PartialEq)]
pub enum RowRule {
    /// lower < upper（数值比较），错误挂在 lower 字段上
    LessThan {
        lower: &'static str,
        upper: &'static str,
    },
}

// ==========================================
// FieldValue / ValidatedFields - 校验通过的字段值
// ==========================================
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Int(i64),
    Decimal(f64),
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Int(v) => Some(*v as f64),
            FieldValue::Decimal(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedFields {
    values: HashMap<&'static str, FieldValue>,
}

impl ValidatedFields {
    pub fn insert(&mut self, field: &'static str, value: FieldValue) {
        self.values.insert(field, value);
    }

    pub fn get(&self, field: &str) -> Option<&FieldValue> {
        self.values.get(field)
    }

    pub fn text(&self, field: &str) -> Option<String> {
        match self.values.get(field) {
            Some(FieldValue::Text(s)) => Some(s.clone()),
            _ => None,
        }
    }

    pub fn int(&self, field: &str) -> Option<i64> {
        match self.values.get(field) {
            Some(FieldValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn decimal(&self, field: &str) -> Option<f64> {
        self.values.get(field).and_then(FieldValue::as_f64)
    }
}
