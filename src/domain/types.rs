// ==========================================
// 教务管理系统 - 领域类型定义
// ==========================================
// 职责: 导入管道共用的基础枚举与单元格值
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CellValue - 单元格原始值
// ==========================================
// 未定型: 字符串 / 数值 / 空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(untagged)]
pub enum CellValue {
    #[default]
    Empty,
    Number(f64),
    Text(String),
}

impl CellValue {
    /// 空值判定（空白字符串视为空）
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 以文本形式读取（数值按最短表示输出，整数不带小数点）
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => Some(s.clone()),
            CellValue::Number(n) => Some(format_number(*n)),
        }
    }

    /// 以数值形式读取（文本按 f64 解析，兼容逗号小数点）
    pub fn as_number(&self) -> Option<f64> {
        match self {
            CellValue::Empty => None,
            CellValue::Number(n) => Some(*n),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<f64>()
                    .or_else(|_| trimmed.replace(',', ".").parse::<f64>())
                    .ok()
                    .filter(|n| n.is_finite())
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Empty => Ok(()),
            CellValue::Text(s) => write!(f, "{}", s),
            CellValue::Number(n) => write!(f, "{}", format_number(*n)),
        }
    }
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

// ==========================================
// ImportTarget - 导入目标
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportTarget {
    AcademicLevel, // 学业层次
    Subject,       // 课程
    Grade,         // 成绩等级
}

impl ImportTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportTarget::AcademicLevel => "academic_level",
            ImportTarget::Subject => "subject",
            ImportTarget::Grade => "grade",
        }
    }
}

impl fmt::Display for ImportTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ImportTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "academic_level" | "academic_levels" | "level" | "levels" => {
                Ok(ImportTarget::AcademicLevel)
            }
            "subject" | "subjects" => Ok(ImportTarget::Subject),
            "grade" | "grades" => Ok(ImportTarget::Grade),
            other => Err(format!("unknown import target: {}", other)),
        }
    }
}

// ==========================================
// ImportStage - 导入状态机
// ==========================================
// 线性推进，无回退
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImportStage {
    Parsing,
    Normalizing,
    Validating,
    Deduplicating,
    ConflictChecking,
    Writing,
    Done,
}

impl fmt::Display for ImportStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ImportStage::Parsing => "PARSING",
            ImportStage::Normalizing => "NORMALIZING",
            ImportStage::Validating => "VALIDATING",
            ImportStage::Deduplicating => "DEDUPLICATING",
            ImportStage::ConflictChecking => "CONFLICT_CHECKING",
            ImportStage::Writing => "WRITING",
            ImportStage::Done => "DONE",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text("   ".to_string()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_cell_value_number_as_text() {
        assert_eq!(CellValue::Number(3.0).as_text(), Some("3".to_string()));
        assert_eq!(CellValue::Number(2.5).as_text(), Some("2.5".to_string()));
    }

    #[test]
    fn test_cell_value_text_as_number() {
        assert_eq!(CellValue::Text(" 4 ".to_string()).as_number(), Some(4.0));
        assert_eq!(CellValue::Text("1,5".to_string()).as_number(), Some(1.5));
        assert_eq!(CellValue::Text("abc".to_string()).as_number(), None);
    }

    #[test]
    fn test_import_target_from_str() {
        assert_eq!("Subjects".parse::<ImportTarget>(), Ok(ImportTarget::Subject));
        assert!("rooms".parse::<ImportTarget>().is_err());
    }
}
