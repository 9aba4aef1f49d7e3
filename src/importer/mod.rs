// ==========================================
// 教务管理系统 - 导入层
// ==========================================
// 职责: 表格数据导入（学业层次 / 课程 / 成绩等级）
// 支持: Excel (.xlsx / .xls), CSV
// 流程: 解析 → 表头标准化 → 行校验 → 去重 → 冲突检查 → 分批写入
// ==========================================

// 模块声明
pub mod batch_writer;
pub mod conflict_handler;
pub mod data_cleaner;
pub mod error;
pub mod header_normalizer;
pub mod import_orchestrator;
pub mod importer_trait;
pub mod row_validator;
pub mod sheet_reader;

// 重导出核心类型
pub use batch_writer::{BatchWriter, CancellationFlag, WriteOutcome};
pub use conflict_handler::ConflictHandler as ConflictHandlerImpl;
pub use data_cleaner::DataCleaner as DataCleanerImpl;
pub use error::{ImportError, ImportOutcome};
pub use header_normalizer::HeaderNormalizer;
pub use import_orchestrator::ImportOrchestrator;
pub use row_validator::SchemaRowValidator;
pub use sheet_reader::{CsvSheetReader, ExcelSheetReader, SheetFormat, UniversalSheetReader};

// 重导出 Trait 接口
pub use importer_trait::{ConflictHandler, DataCleaner, Importer, RowValidator, SheetReader};
