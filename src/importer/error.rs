// ==========================================
// 教务管理系统 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件解析错误（致命，终止整个导入）=====
    #[error("unsupported file format: {0} (expected .xlsx, .xls or .csv)")]
    UnsupportedFormat(String),

    #[error("unreadable file: {0}")]
    FileReadError(String),

    #[error("unreadable spreadsheet: {0}")]
    ExcelParseError(String),

    #[error("unreadable CSV file: {0}")]
    CsvParseError(String),

    #[error("spreadsheet has no header row")]
    EmptySheet,

    // ===== 配置错误 =====
    #[error("config read failed (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    #[error("invalid config value (key: {key}, value: {value}): {message}")]
    ConfigValueError {
        key: String,
        value: String,
        message: String,
    },

    // ===== 仓储错误 =====
    #[error("repository call failed: {0}")]
    Repository(#[from] crate::repository::error::RepositoryError),

    #[error("repository call timed out after {0} ms")]
    RepositoryTimeout(u64),

    // ===== 通用错误 =====
    #[error("internal error: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 是否为文件解析阶段错误
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            ImportError::UnsupportedFormat(_)
                | ImportError::FileReadError(_)
                | ImportError::ExcelParseError(_)
                | ImportError::CsvParseError(_)
                | ImportError::EmptySheet
        )
    }
}

// 实现 From<std::io::Error>
impl From<std::io::Error> for ImportError {
    fn from(err: std::io::Error) -> Self {
        ImportError::FileReadError(err.to_string())
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportOutcome<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_parse_error() {
        assert!(ImportError::EmptySheet.is_parse_error());
        assert!(ImportError::UnsupportedFormat("pdf".to_string()).is_parse_error());
        assert!(!ImportError::RepositoryTimeout(100).is_parse_error());
    }
}
