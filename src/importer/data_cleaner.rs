// ==========================================
// 教务管理系统 - 数据清洗器实现
// ==========================================
// 职责: TRIM / UPPER / LOWER / NULL 标准化
// 说明: 校验通过后、构造候选记录前执行的显式步骤
// ==========================================

use crate::importer::importer_trait::DataCleaner as DataCleanerTrait;
use crate::schema::TextCase;

pub struct DataCleaner;

impl DataCleanerTrait for DataCleaner {
    fn clean_text(&self, value: &str, case: TextCase) -> String {
        let trimmed = value.trim();
        match case {
            TextCase::Keep => trimmed.to_string(),
            TextCase::Upper => trimmed.to_uppercase(),
            TextCase::Lower => trimmed.to_lowercase(),
        }
    }

    fn normalize_null(&self, value: Option<String>) -> Option<String> {
        value.and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_upper() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  l1-info ", TextCase::Upper), "L1-INFO");
    }

    #[test]
    fn test_clean_text_keep_case() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("  Licence Info ", TextCase::Keep), "Licence Info");
    }

    #[test]
    fn test_clean_text_lower() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.clean_text("Master", TextCase::Lower), "master");
    }

    #[test]
    fn test_normalize_null() {
        let cleaner = DataCleaner;
        assert_eq!(cleaner.normalize_null(Some("   ".to_string())), None);
        assert_eq!(cleaner.normalize_null(Some(" x ".to_string())), Some("x".to_string()));
        assert_eq!(cleaner.normalize_null(None), None);
    }
}
