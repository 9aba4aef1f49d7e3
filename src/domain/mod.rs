// ==========================================
// 教务管理系统 - 领域模型层
// ==========================================
// 职责: 定义导入管道的数据模型与强类型记录
// 红线: 不含数据访问逻辑,不含校验规则
// ==========================================

pub mod import;
pub mod records;
pub mod types;

// 重导出核心类型
pub use import::{
    CandidateRecord, ImportBatchRecord, ImportPreview, ImportResult, NormalizedRow, RawRow,
    StageOutcome, ValidationError, GENERAL_FIELD, HEADER_ROW_OFFSET,
};
pub use records::{AcademicLevel, Grade, ImportRecord, Subject};
pub use types::{CellValue, ImportStage, ImportTarget};
